//! Persistence strategy - primary bulk replace with strict fallback
//!
//! The primary path atomically replaces the company's rows and reports
//! per-row verdicts under a batch id. Only when the primary call errors (not
//! when it succeeds with zero insertions) does the stricter fallback run; its
//! success is surfaced as a distinct degraded outcome. When both paths error
//! the import fails closed and the caller sees the underlying messages
//! verbatim.

use std::sync::Arc;

use log::{info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{ImportOutcome, PayableDraft, ReceivableDraft, SanitizedRow};
use crate::ports::BackendDataService;

/// Two-tier persistence over the backend port
pub struct PersistenceService {
    backend: Arc<dyn BackendDataService>,
}

impl PersistenceService {
    pub fn new(backend: Arc<dyn BackendDataService>) -> Self {
        Self { backend }
    }

    /// Persist sanitized receivable rows
    pub async fn persist_receivables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<ReceivableDraft>],
        file_name: &str,
    ) -> Result<ImportOutcome> {
        let primary_error = match self
            .backend
            .replace_receivables(company_id, rows, file_name)
            .await
        {
            Ok(summary) => {
                info!(
                    "Receivable import for {} persisted: batch {}, {} inserted, {} rejected",
                    company_id, summary.batch_id, summary.inserted, summary.rejected
                );
                return Ok(ImportOutcome::FullFidelity(summary));
            }
            Err(err) => err,
        };

        warn!(
            "Primary receivable replace failed for {} ({}), engaging strict fallback",
            company_id, primary_error
        );

        match self
            .backend
            .strict_replace_receivables(company_id, rows)
            .await
        {
            Ok(summary) => {
                info!(
                    "Strict fallback persisted receivables for {}: {} inserted, {} skipped",
                    company_id, summary.inserted, summary.skipped
                );
                Ok(ImportOutcome::Degraded(summary))
            }
            Err(fallback_error) => Err(Self::fail_closed(primary_error, fallback_error)),
        }
    }

    /// Persist sanitized payable rows
    pub async fn persist_payables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<PayableDraft>],
        file_name: &str,
    ) -> Result<ImportOutcome> {
        let primary_error = match self
            .backend
            .replace_payables(company_id, rows, file_name)
            .await
        {
            Ok(summary) => {
                info!(
                    "Payable import for {} persisted: batch {}, {} inserted, {} rejected",
                    company_id, summary.batch_id, summary.inserted, summary.rejected
                );
                return Ok(ImportOutcome::FullFidelity(summary));
            }
            Err(err) => err,
        };

        warn!(
            "Primary payable replace failed for {} ({}), engaging strict fallback",
            company_id, primary_error
        );

        match self.backend.strict_replace_payables(company_id, rows).await {
            Ok(summary) => {
                info!(
                    "Strict fallback persisted payables for {}: {} inserted, {} skipped",
                    company_id, summary.inserted, summary.skipped
                );
                Ok(ImportOutcome::Degraded(summary))
            }
            Err(fallback_error) => Err(Self::fail_closed(primary_error, fallback_error)),
        }
    }

    /// Both paths errored: nothing is committed, both messages surface
    fn fail_closed(primary: Error, fallback: Error) -> Error {
        Error::backend(format!("{}; fallback: {}", primary, fallback))
    }
}
