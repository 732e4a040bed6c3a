//! Import pipeline domain types
//!
//! Sanitized row drafts, bulk-replace summaries, the tagged import outcome
//! and the reject-ledger record shape.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::{PayableStatus, ReceivableStatus};

/// Fixed vocabulary of rejection reasons.
///
/// Codes travel as strings (see [`RejectRecord::reason_code`]) so that codes
/// minted by a newer backend pass through older clients verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    EmptyMandatoryField,
    InvalidValue,
    InvalidDueDate,
    InvalidInstallmentFormat,
    DuplicateWithinBatch,
    NegativeValue,
    NegativeUpdatedValue,
    DueBeforeIssue,
    StructurallyInvalidRow,
}

impl RejectReason {
    /// Wire code for the reason
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyMandatoryField => "empty-mandatory-field",
            Self::InvalidValue => "invalid-value",
            Self::InvalidDueDate => "invalid-due-date",
            Self::InvalidInstallmentFormat => "invalid-installment-format",
            Self::DuplicateWithinBatch => "duplicate-within-batch",
            Self::NegativeValue => "negative-value",
            Self::NegativeUpdatedValue => "negative-updated-value",
            Self::DueBeforeIssue => "due-before-issue",
            Self::StructurallyInvalidRow => "structurally-invalid-row",
        }
    }
}

/// A rejected row as retrievable from the reject ledger.
///
/// `row_number` is 1-indexed relative to the header row so operators can
/// cross-reference the source file directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRecord {
    pub row_number: i64,
    pub reason_code: String,
    pub raw: JsonValue,
}

impl RejectRecord {
    pub fn new(row_number: i64, reason: RejectReason, raw: JsonValue) -> Self {
        Self {
            row_number,
            reason_code: reason.code().to_string(),
            raw,
        }
    }
}

/// A per-field soft parse failure recorded during sanitization.
///
/// The field was defaulted to zero and the row kept - completeness with
/// visibility rather than silent loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub value: String,
    pub message: String,
}

/// Sanitized receivable candidate, as submitted to the persistence layer.
///
/// Fields the backend may still reject (missing due date, negative values)
/// stay optional/unchecked here; the reject ledger carries the verdicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivableDraft {
    pub invoice_number: String,
    pub customer: String,
    pub installment: Option<String>,
    pub principal_value: Decimal,
    pub fine: Decimal,
    pub interest: Decimal,
    pub updated_value: Decimal,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_prediction: Option<NaiveDate>,
    pub title_status: ReceivableStatus,
}

/// Sanitized payable candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayableDraft {
    pub supplier: String,
    pub document_number: String,
    pub description: Option<String>,
    pub principal_value: Decimal,
    pub fine: Decimal,
    pub interest: Decimal,
    pub amount: Decimal,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: PayableStatus,
}

/// A draft paired with its provenance: source row number, original raw
/// payload and any per-field soft parse annotations
#[derive(Debug, Clone)]
pub struct SanitizedRow<T> {
    pub row_number: i64,
    pub record: T,
    pub raw: JsonValue,
    pub issues: Vec<FieldIssue>,
}

/// Result of the primary bulk-replace path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReplaceSummary {
    pub batch_id: String,
    pub inserted: i64,
    pub rejected: i64,
    pub imported_amount: Decimal,
    pub rejected_amount: Decimal,
    pub total_amount: Decimal,
}

/// Result of the strict fallback bulk-replace path (reduced guarantees:
/// no batch id, no per-row reject detail)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrictReplaceSummary {
    pub inserted: i64,
    pub skipped: i64,
}

/// Tagged persistence outcome.
///
/// Callers that need batch-level audit must branch on the tag; a degraded
/// import is never silently merged with a full-fidelity one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "fidelity", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Primary path succeeded: batch id and per-row reject ledger available
    FullFidelity(BulkReplaceSummary),
    /// Fallback path succeeded: counts only
    Degraded(StrictReplaceSummary),
}

impl ImportOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// Batch id, present only on the full-fidelity path
    pub fn batch_id(&self) -> Option<&str> {
        match self {
            Self::FullFidelity(s) => Some(&s.batch_id),
            Self::Degraded(_) => None,
        }
    }

    /// Normalized summary shape for screens that only show counts
    pub fn summary(&self) -> ImportSummary {
        match self {
            Self::FullFidelity(s) => ImportSummary {
                success: true,
                imported_rows: s.inserted,
                rejected_rows: s.rejected,
                imported_amount: Some(s.imported_amount),
                total_amount: Some(s.total_amount),
                batch_id: Some(s.batch_id.clone()),
            },
            Self::Degraded(s) => ImportSummary {
                success: true,
                imported_rows: s.inserted,
                rejected_rows: s.skipped,
                imported_amount: None,
                total_amount: None,
                batch_id: None,
            },
        }
    }
}

/// Normalized import summary (both persistence paths)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub success: bool,
    pub imported_rows: i64,
    pub rejected_rows: i64,
    /// Unavailable (not guessed) on the degraded path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

/// What an import run hands back to the caller: the persistence outcome plus
/// the rejects minted locally before anything reached the backend
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub outcome: ImportOutcome,
    pub local_rejects: Vec<RejectRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reason_codes() {
        assert_eq!(RejectReason::EmptyMandatoryField.code(), "empty-mandatory-field");
        assert_eq!(RejectReason::DueBeforeIssue.code(), "due-before-issue");
        assert_eq!(
            RejectReason::StructurallyInvalidRow.code(),
            "structurally-invalid-row"
        );
    }

    #[test]
    fn test_degraded_summary_omits_batch_and_amounts() {
        let outcome = ImportOutcome::Degraded(StrictReplaceSummary {
            inserted: 8,
            skipped: 2,
        });
        assert!(outcome.is_degraded());
        assert!(outcome.batch_id().is_none());

        let summary = outcome.summary();
        assert!(summary.success);
        assert_eq!(summary.imported_rows, 8);
        assert_eq!(summary.rejected_rows, 2);
        assert!(summary.batch_id.is_none());
        assert!(summary.imported_amount.is_none());
    }

    #[test]
    fn test_full_fidelity_summary() {
        let outcome = ImportOutcome::FullFidelity(BulkReplaceSummary {
            batch_id: "batch_1".to_string(),
            inserted: 10,
            rejected: 1,
            imported_amount: Decimal::new(100000, 2),
            rejected_amount: Decimal::new(5000, 2),
            total_amount: Decimal::new(105000, 2),
        });
        let summary = outcome.summary();
        assert_eq!(summary.batch_id.as_deref(), Some("batch_1"));
        assert_eq!(summary.imported_amount, Some(Decimal::new(100000, 2)));
    }

    #[test]
    fn test_reject_record_carries_raw_payload() {
        let raw = json!({"Cliente": "Total", "NF": ""});
        let record = RejectRecord::new(7, RejectReason::StructurallyInvalidRow, raw.clone());
        assert_eq!(record.row_number, 7);
        assert_eq!(record.reason_code, "structurally-invalid-row");
        assert_eq!(record.raw, raw);
    }
}
