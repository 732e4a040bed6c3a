//! Application services - the logic between the domain and the ports

pub mod cashflow;
pub mod columns;
pub mod locale;
pub mod persist;
pub mod rejects;
pub mod sanitize;

pub use cashflow::CashFlowEngine;
pub use persist::PersistenceService;
pub use rejects::RejectLedgerService;
pub use sanitize::{RowSanitizer, SanitizedBatch};
