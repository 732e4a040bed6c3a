//! In-memory backend adapter
//!
//! A full in-process implementation of [`BackendDataService`] used by the
//! desktop build and by tests. It applies the same row verdicts the hosted
//! backend applies, keeps a reject ledger per batch and serves it back in
//! pages, so the import pipeline exercises identical code paths against
//! either backend.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::domain::result::{Error, Result};
use crate::domain::{
    BulkReplaceSummary, Payable, PayableDraft, Receivable, ReceivableDraft, RejectReason,
    RejectRecord, SanitizedRow, StrictReplaceSummary,
};
use crate::ports::{BackendDataService, RejectPage};

#[derive(Default)]
struct State {
    receivables: HashMap<String, Vec<Receivable>>,
    payables: HashMap<String, Vec<Payable>>,
    reject_batches: HashMap<String, Vec<RejectRecord>>,
}

/// In-process backend with the hosted backend's row-verdict rules
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
    batch_counter: AtomicU64,
    /// When set, the primary replace operations fail so callers take the
    /// strict fallback path
    fail_primary: AtomicBool,
}

/// Verdict for a single submitted row
enum RowVerdict {
    Accept,
    Reject(RejectReason),
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the primary replace path to fail (fallback testing)
    pub fn set_fail_primary(&self, fail: bool) {
        self.fail_primary.store(fail, Ordering::SeqCst);
    }

    fn next_batch_id(&self) -> String {
        let n = self.batch_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("batch_{:06}", n)
    }

    fn check_primary_available(&self) -> Result<()> {
        if self.fail_primary.load(Ordering::SeqCst) {
            return Err(Error::backend("bulk replace endpoint unavailable"));
        }
        Ok(())
    }

    fn judge_receivable(
        &self,
        draft: &ReceivableDraft,
        seen: &mut HashSet<Vec<u8>>,
    ) -> RowVerdict {
        if draft.invoice_number.trim().is_empty() || draft.customer.trim().is_empty() {
            return RowVerdict::Reject(RejectReason::EmptyMandatoryField);
        }
        let due_date = match draft.due_date {
            Some(d) => d,
            None => return RowVerdict::Reject(RejectReason::InvalidDueDate),
        };
        if let Some(installment) = &draft.installment {
            let pattern = Regex::new(r"^\d+\s*/\s*\d+$").unwrap();
            if !pattern.is_match(installment.trim()) {
                return RowVerdict::Reject(RejectReason::InvalidInstallmentFormat);
            }
        }
        if draft.principal_value < Decimal::ZERO
            || draft.fine < Decimal::ZERO
            || draft.interest < Decimal::ZERO
        {
            return RowVerdict::Reject(RejectReason::NegativeValue);
        }
        if draft.updated_value < Decimal::ZERO {
            return RowVerdict::Reject(RejectReason::NegativeUpdatedValue);
        }
        if draft.principal_value.is_zero() && draft.updated_value.is_zero() {
            return RowVerdict::Reject(RejectReason::InvalidValue);
        }
        if let Some(issue) = draft.issue_date {
            if due_date < issue {
                return RowVerdict::Reject(RejectReason::DueBeforeIssue);
            }
        }
        let fingerprint = row_fingerprint(&[
            draft.invoice_number.trim(),
            draft.installment.as_deref().unwrap_or(""),
            &due_date.to_string(),
            &draft.updated_value.to_string(),
        ]);
        if !seen.insert(fingerprint) {
            return RowVerdict::Reject(RejectReason::DuplicateWithinBatch);
        }
        RowVerdict::Accept
    }

    fn judge_payable(&self, draft: &PayableDraft, seen: &mut HashSet<Vec<u8>>) -> RowVerdict {
        if draft.supplier.trim().is_empty() || draft.document_number.trim().is_empty() {
            return RowVerdict::Reject(RejectReason::EmptyMandatoryField);
        }
        let due_date = match draft.due_date {
            Some(d) => d,
            None => return RowVerdict::Reject(RejectReason::InvalidDueDate),
        };
        if draft.principal_value < Decimal::ZERO
            || draft.fine < Decimal::ZERO
            || draft.interest < Decimal::ZERO
        {
            return RowVerdict::Reject(RejectReason::NegativeValue);
        }
        if draft.amount < Decimal::ZERO {
            return RowVerdict::Reject(RejectReason::NegativeUpdatedValue);
        }
        if draft.principal_value.is_zero() && draft.amount.is_zero() {
            return RowVerdict::Reject(RejectReason::InvalidValue);
        }
        if let Some(issue) = draft.issue_date {
            if due_date < issue {
                return RowVerdict::Reject(RejectReason::DueBeforeIssue);
            }
        }
        let fingerprint = row_fingerprint(&[
            draft.supplier.trim(),
            draft.document_number.trim(),
            &due_date.to_string(),
            &draft.amount.to_string(),
        ]);
        if !seen.insert(fingerprint) {
            return RowVerdict::Reject(RejectReason::DuplicateWithinBatch);
        }
        RowVerdict::Accept
    }
}

fn row_fingerprint(parts: &[&str]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.to_lowercase().as_bytes());
        hasher.update([0u8]);
    }
    hasher.finalize().to_vec()
}

fn materialize_receivable(company_id: &str, draft: &ReceivableDraft) -> Receivable {
    let mut title = Receivable::new(
        company_id,
        draft.invoice_number.trim(),
        draft.customer.trim(),
        draft.principal_value,
        draft.due_date.unwrap_or_default(),
    );
    title.installment = draft.installment.clone();
    title.fine = draft.fine;
    title.interest = draft.interest;
    title.total_value = draft.updated_value;
    title.issue_date = draft.issue_date;
    title.payment_prediction = draft.payment_prediction;
    title.status = draft.title_status;
    title
}

fn materialize_payable(company_id: &str, draft: &PayableDraft) -> Payable {
    let mut obligation = Payable::new(
        company_id,
        draft.supplier.trim(),
        draft.document_number.trim(),
        draft.principal_value,
        draft.due_date.unwrap_or_default(),
    );
    obligation.description = draft.description.clone();
    obligation.fine = draft.fine;
    obligation.interest = draft.interest;
    obligation.total_value = draft.amount;
    obligation.issue_date = draft.issue_date;
    obligation.status = draft.status;
    obligation
}

#[async_trait]
impl BackendDataService for InMemoryBackend {
    async fn replace_receivables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<ReceivableDraft>],
        file_name: &str,
    ) -> Result<BulkReplaceSummary> {
        self.check_primary_available()?;

        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut rejects = Vec::new();
        let mut imported_amount = Decimal::ZERO;
        let mut rejected_amount = Decimal::ZERO;

        for row in rows {
            match self.judge_receivable(&row.record, &mut seen) {
                RowVerdict::Accept => {
                    imported_amount += row.record.updated_value;
                    accepted.push(materialize_receivable(company_id, &row.record));
                }
                RowVerdict::Reject(reason) => {
                    rejected_amount += row.record.updated_value.max(Decimal::ZERO);
                    rejects.push(RejectRecord::new(row.row_number, reason, row.raw.clone()));
                }
            }
        }

        let batch_id = self.next_batch_id();
        debug!(
            "replace_receivables {} ({}): {} accepted, {} rejected, batch {}",
            company_id,
            file_name,
            accepted.len(),
            rejects.len(),
            batch_id
        );

        let summary = BulkReplaceSummary {
            batch_id: batch_id.clone(),
            inserted: accepted.len() as i64,
            rejected: rejects.len() as i64,
            imported_amount,
            rejected_amount,
            total_amount: imported_amount + rejected_amount,
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::backend("backend state poisoned"))?;
        state.receivables.insert(company_id.to_string(), accepted);
        state.reject_batches.insert(batch_id, rejects);
        Ok(summary)
    }

    async fn replace_payables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<PayableDraft>],
        file_name: &str,
    ) -> Result<BulkReplaceSummary> {
        self.check_primary_available()?;

        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut rejects = Vec::new();
        let mut imported_amount = Decimal::ZERO;
        let mut rejected_amount = Decimal::ZERO;

        for row in rows {
            match self.judge_payable(&row.record, &mut seen) {
                RowVerdict::Accept => {
                    imported_amount += row.record.amount;
                    accepted.push(materialize_payable(company_id, &row.record));
                }
                RowVerdict::Reject(reason) => {
                    rejected_amount += row.record.amount.max(Decimal::ZERO);
                    rejects.push(RejectRecord::new(row.row_number, reason, row.raw.clone()));
                }
            }
        }

        let batch_id = self.next_batch_id();
        debug!(
            "replace_payables {} ({}): {} accepted, {} rejected, batch {}",
            company_id,
            file_name,
            accepted.len(),
            rejects.len(),
            batch_id
        );

        let summary = BulkReplaceSummary {
            batch_id: batch_id.clone(),
            inserted: accepted.len() as i64,
            rejected: rejects.len() as i64,
            imported_amount,
            rejected_amount,
            total_amount: imported_amount + rejected_amount,
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::backend("backend state poisoned"))?;
        state.payables.insert(company_id.to_string(), accepted);
        state.reject_batches.insert(batch_id, rejects);
        Ok(summary)
    }

    async fn strict_replace_receivables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<ReceivableDraft>],
    ) -> Result<StrictReplaceSummary> {
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut skipped = 0i64;

        for row in rows {
            match self.judge_receivable(&row.record, &mut seen) {
                RowVerdict::Accept => accepted.push(materialize_receivable(company_id, &row.record)),
                RowVerdict::Reject(_) => skipped += 1,
            }
        }

        let summary = StrictReplaceSummary {
            inserted: accepted.len() as i64,
            skipped,
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::backend("backend state poisoned"))?;
        state.receivables.insert(company_id.to_string(), accepted);
        Ok(summary)
    }

    async fn strict_replace_payables(
        &self,
        company_id: &str,
        rows: &[SanitizedRow<PayableDraft>],
    ) -> Result<StrictReplaceSummary> {
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut skipped = 0i64;

        for row in rows {
            match self.judge_payable(&row.record, &mut seen) {
                RowVerdict::Accept => accepted.push(materialize_payable(company_id, &row.record)),
                RowVerdict::Reject(_) => skipped += 1,
            }
        }

        let summary = StrictReplaceSummary {
            inserted: accepted.len() as i64,
            skipped,
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::backend("backend state poisoned"))?;
        state.payables.insert(company_id.to_string(), accepted);
        Ok(summary)
    }

    async fn fetch_rejects(&self, batch_id: &str, page: i64, page_size: i64) -> Result<RejectPage> {
        if page < 1 || page_size < 1 {
            return Err(Error::validation("page and page_size must be positive"));
        }
        let state = self
            .state
            .lock()
            .map_err(|_| Error::backend("backend state poisoned"))?;
        let batch = state
            .reject_batches
            .get(batch_id)
            .ok_or_else(|| Error::not_found(format!("batch {}", batch_id)))?;

        let start = ((page - 1) * page_size) as usize;
        let rows = batch
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        Ok(RejectPage {
            rows,
            total_count: batch.len() as i64,
        })
    }

    async fn get_receivables(&self, company_id: &str) -> Result<Vec<Receivable>> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::backend("backend state poisoned"))?;
        Ok(state.receivables.get(company_id).cloned().unwrap_or_default())
    }

    async fn get_payables(&self, company_id: &str) -> Result<Vec<Payable>> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::backend("backend state poisoned"))?;
        Ok(state.payables.get(company_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PayableStatus, ReceivableStatus};
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(invoice: &str, due: Option<NaiveDate>, value: i64) -> SanitizedRow<ReceivableDraft> {
        SanitizedRow {
            row_number: 1,
            record: ReceivableDraft {
                invoice_number: invoice.to_string(),
                customer: "Cliente".to_string(),
                installment: None,
                principal_value: Decimal::new(value, 2),
                fine: Decimal::ZERO,
                interest: Decimal::ZERO,
                updated_value: Decimal::new(value, 2),
                issue_date: None,
                due_date: due,
                payment_prediction: None,
                title_status: ReceivableStatus::Aberto,
            },
            raw: json!({"NF": invoice}),
            issues: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_replace_accepts_and_rejects() {
        let backend = InMemoryBackend::new();
        let rows = vec![
            draft("1001", Some(date(2024, 7, 1)), 10000),
            draft("1002", None, 20000),
        ];
        let summary = backend
            .replace_receivables("acme", &rows, "titulos.xlsx")
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.imported_amount, Decimal::new(10000, 2));
        assert_eq!(summary.total_amount, Decimal::new(30000, 2));

        let page = backend.fetch_rejects(&summary.batch_id, 1, 50).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0].reason_code, "invalid-due-date");

        let stored = backend.get_receivables("acme").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].invoice_number, "1001");
    }

    #[tokio::test]
    async fn test_duplicate_rows_rejected_within_batch() {
        let backend = InMemoryBackend::new();
        let rows = vec![
            draft("1001", Some(date(2024, 7, 1)), 10000),
            draft("1001", Some(date(2024, 7, 1)), 10000),
        ];
        let summary = backend
            .replace_receivables("acme", &rows, "titulos.xlsx")
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        let page = backend.fetch_rejects(&summary.batch_id, 1, 50).await.unwrap();
        assert_eq!(page.rows[0].reason_code, "duplicate-within-batch");
    }

    #[tokio::test]
    async fn test_installment_format_and_date_ordering() {
        let backend = InMemoryBackend::new();

        let mut bad_installment = draft("1001", Some(date(2024, 7, 1)), 10000);
        bad_installment.record.installment = Some("1 de 3".to_string());

        let mut inverted = draft("1002", Some(date(2024, 7, 1)), 10000);
        inverted.record.issue_date = Some(date(2024, 8, 1));

        let summary = backend
            .replace_receivables("acme", &[bad_installment, inverted], "t.xlsx")
            .await
            .unwrap();
        assert_eq!(summary.inserted, 0);
        let page = backend.fetch_rejects(&summary.batch_id, 1, 50).await.unwrap();
        let codes: Vec<&str> = page.rows.iter().map(|r| r.reason_code.as_str()).collect();
        assert!(codes.contains(&"invalid-installment-format"));
        assert!(codes.contains(&"due-before-issue"));
    }

    #[tokio::test]
    async fn test_reject_pagination() {
        let backend = InMemoryBackend::new();
        let rows: Vec<_> = (0..5)
            .map(|i| {
                let mut r = draft(&format!("{}", 2000 + i), None, 10000);
                r.row_number = i + 1;
                r
            })
            .collect();
        let summary = backend
            .replace_receivables("acme", &rows, "t.xlsx")
            .await
            .unwrap();
        assert_eq!(summary.rejected, 5);

        let first = backend.fetch_rejects(&summary.batch_id, 1, 2).await.unwrap();
        assert_eq!(first.rows.len(), 2);
        assert_eq!(first.total_count, 5);
        let last = backend.fetch_rejects(&summary.batch_id, 3, 2).await.unwrap();
        assert_eq!(last.rows.len(), 1);
        let beyond = backend.fetch_rejects(&summary.batch_id, 4, 2).await.unwrap();
        assert!(beyond.rows.is_empty());
    }

    #[tokio::test]
    async fn test_strict_fallback_counts_only() {
        let backend = InMemoryBackend::new();
        backend.set_fail_primary(true);

        let rows = vec![
            draft("1001", Some(date(2024, 7, 1)), 10000),
            draft("1002", None, 20000),
        ];
        assert!(backend
            .replace_receivables("acme", &rows, "t.xlsx")
            .await
            .is_err());

        let summary = backend
            .strict_replace_receivables("acme", &rows)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(backend.get_receivables("acme").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_payable_negative_amount_rejected() {
        let backend = InMemoryBackend::new();
        let row = SanitizedRow {
            row_number: 1,
            record: PayableDraft {
                supplier: "Fornecedor".to_string(),
                document_number: "D-1".to_string(),
                description: None,
                principal_value: Decimal::new(10000, 2),
                fine: Decimal::ZERO,
                interest: Decimal::ZERO,
                amount: Decimal::new(-10000, 2),
                issue_date: None,
                due_date: Some(date(2024, 7, 1)),
                status: PayableStatus::Pending,
            },
            raw: json!({"Fornecedor": "Fornecedor"}),
            issues: Vec::new(),
        };
        let summary = backend
            .replace_payables("acme", &[row], "pagar.xlsx")
            .await
            .unwrap();
        assert_eq!(summary.rejected, 1);
        let page = backend.fetch_rejects(&summary.batch_id, 1, 10).await.unwrap();
        assert_eq!(page.rows[0].reason_code, "negative-updated-value");
    }
}
