//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod balance;
pub mod cashflow;
pub mod import;
mod movement;
pub mod result;

pub use balance::BankBalanceSnapshot;
pub use cashflow::{CashFlowDayEntry, SHORTFALL_ALERT};
pub use import::{
    BulkReplaceSummary, FieldIssue, ImportOutcome, ImportReport, ImportSummary, PayableDraft,
    ReceivableDraft, RejectReason, RejectRecord, SanitizedRow, StrictReplaceSummary,
};
pub use movement::{
    Anomaly, ExpenseKind, Payable, PayableStatus, Receivable, ReceivableStatus, ScheduledExpense,
};
