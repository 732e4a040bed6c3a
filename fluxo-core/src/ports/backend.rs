//! Backend data service port
//!
//! The remote persistence collaborator: bulk replace operations per schema,
//! the stricter fallback variants, paginated reject retrieval and the
//! read-back used to refresh the ledger store after an import.
//!
//! These calls are the core's only suspension points. Callers treat an
//! in-flight call as cancellable by abandonment - a newer call supersedes an
//! older one, last response wins. Timeouts belong to the transport, not here.

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{
    BulkReplaceSummary, Payable, PayableDraft, Receivable, ReceivableDraft, RejectRecord,
    SanitizedRow, StrictReplaceSummary,
};

/// A page of reject records for one import batch
#[derive(Debug, Clone)]
pub struct RejectPage {
    pub rows: Vec<RejectRecord>,
    pub total_count: i64,
}

/// Remote bulk persistence and reject-ledger retrieval.
///
/// Implementations (adapters) provide the actual transport. The primary
/// `replace_*` operations atomically swap the company's rows of that type and
/// report per-row verdicts under a batch id; the `strict_replace_*` fallbacks
/// report only inserted/skipped counts.
#[async_trait]
pub trait BackendDataService: Send + Sync {
    // === Primary bulk replace ===

    /// Replace the company's receivables with the supplied set
    async fn replace_receivables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<ReceivableDraft>],
        file_name: &str,
    ) -> Result<BulkReplaceSummary>;

    /// Replace the company's payables with the supplied set
    async fn replace_payables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<PayableDraft>],
        file_name: &str,
    ) -> Result<BulkReplaceSummary>;

    // === Strict fallback (reduced guarantees) ===

    async fn strict_replace_receivables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<ReceivableDraft>],
    ) -> Result<StrictReplaceSummary>;

    async fn strict_replace_payables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<PayableDraft>],
    ) -> Result<StrictReplaceSummary>;

    // === Reject ledger ===

    /// Fetch one page of reject records for a batch. `page` is 1-indexed.
    async fn fetch_rejects(
        &self,
        batch_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<RejectPage>;

    // === Read-back for ledger refresh ===

    async fn get_receivables(&self, company_id: &str) -> Result<Vec<Receivable>>;

    async fn get_payables(&self, company_id: &str) -> Result<Vec<Payable>>;
}
