//! Row sanitizer - raw spreadsheet rows into canonical candidate records
//!
//! Applies the column mapper and locale parsers per target schema. A row is
//! excluded only when a mandatory identifying field is missing or the row is
//! recognizable spreadsheet noise; numeric parse failures are soft - the
//! field defaults to zero, the failure is annotated and the row proceeds to
//! persistence. Exclusions mint local reject records so operators never
//! undercount (pre-persistence drops used to be invisible to the reject
//! ledger).

use std::collections::HashMap;

use log::debug;
use rust_decimal::Decimal;
use serde_json::{Map, Value as JsonValue};

use crate::domain::{
    FieldIssue, PayableDraft, PayableStatus, ReceivableDraft, ReceivableStatus, RejectReason,
    RejectRecord, SanitizedRow,
};
use crate::services::columns::{
    payable_aliases, receivable_aliases, resolve_field_with_extras,
};
use crate::services::locale::{is_garbage_row, parse_locale_date, parse_locale_number};

/// Sanitizer output: canonical rows in input order plus the locally-minted
/// rejects for everything that was excluded before persistence
#[derive(Debug)]
pub struct SanitizedBatch<T> {
    pub rows: Vec<SanitizedRow<T>>,
    pub rejects: Vec<RejectRecord>,
}

impl<T> SanitizedBatch<T> {
    fn empty() -> Self {
        Self {
            rows: Vec::new(),
            rejects: Vec::new(),
        }
    }
}

/// Stateless row sanitizer; extra header spellings come from configuration
#[derive(Debug, Default, Clone)]
pub struct RowSanitizer {
    extra_aliases: HashMap<String, Vec<String>>,
}

impl RowSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_aliases(extra_aliases: HashMap<String, Vec<String>>) -> Self {
        Self { extra_aliases }
    }

    /// Sanitize raw rows against the receivable schema
    pub fn sanitize_receivables(&self, rows: &[JsonValue]) -> SanitizedBatch<ReceivableDraft> {
        let mut batch = SanitizedBatch::empty();
        // Explicit forward-fill accumulator: exports often name the customer
        // only on the first row of a group. Scoped to this call.
        let mut last_customer: Option<String> = None;

        for (idx, raw) in rows.iter().enumerate() {
            let row_number = idx as i64 + 1;

            let obj = match raw.as_object() {
                Some(obj) => obj,
                None => {
                    batch.rejects.push(RejectRecord::new(
                        row_number,
                        RejectReason::StructurallyInvalidRow,
                        raw.clone(),
                    ));
                    continue;
                }
            };

            let invoice_number = self.text_field(obj, "invoice_number", receivable_aliases());
            let customer_cell = self.text_field(obj, "customer", receivable_aliases());

            // Garbage in an identifying field means the whole row is export
            // noise (totals line, filter banner), not a bad record.
            if matches!(&invoice_number, Some(v) if is_garbage_row(v))
                || matches!(&customer_cell, Some(v) if is_garbage_row(v))
            {
                batch.rejects.push(RejectRecord::new(
                    row_number,
                    RejectReason::StructurallyInvalidRow,
                    raw.clone(),
                ));
                continue;
            }

            let customer = match customer_cell {
                Some(name) => {
                    last_customer = Some(name.clone());
                    Some(name)
                }
                None => last_customer.clone(),
            };

            let (invoice_number, customer) = match (invoice_number, customer) {
                (Some(invoice), Some(customer)) => (invoice, customer),
                _ => {
                    batch.rejects.push(RejectRecord::new(
                        row_number,
                        RejectReason::EmptyMandatoryField,
                        raw.clone(),
                    ));
                    continue;
                }
            };

            let mut issues = Vec::new();
            let principal =
                self.money_field(obj, "principal_value", receivable_aliases(), &mut issues);
            let fine = self.money_field(obj, "fine", receivable_aliases(), &mut issues);
            let interest = self.money_field(obj, "interest", receivable_aliases(), &mut issues);
            let supplied_total =
                self.money_field(obj, "updated_value", receivable_aliases(), &mut issues);

            // A supplied total is trusted as-is; zero or absent means derive.
            let updated_value = if supplied_total == Decimal::ZERO {
                principal + fine + interest
            } else {
                supplied_total
            };

            let record = ReceivableDraft {
                invoice_number,
                customer,
                installment: self.text_field(obj, "installment", receivable_aliases()),
                principal_value: principal,
                fine,
                interest,
                updated_value,
                issue_date: self.date_field(obj, "issue_date", receivable_aliases()),
                due_date: self.date_field(obj, "due_date", receivable_aliases()),
                payment_prediction: self.date_field(obj, "payment_prediction", receivable_aliases()),
                title_status: ReceivableStatus::from_raw(
                    self.text_field(obj, "title_status", receivable_aliases()).as_deref(),
                ),
            };

            batch.rows.push(SanitizedRow {
                row_number,
                record,
                raw: raw.clone(),
                issues,
            });
        }

        debug!(
            "Sanitized {} receivable rows: {} kept, {} excluded",
            rows.len(),
            batch.rows.len(),
            batch.rejects.len()
        );
        batch
    }

    /// Sanitize raw rows against the payable schema
    pub fn sanitize_payables(&self, rows: &[JsonValue]) -> SanitizedBatch<PayableDraft> {
        let mut batch = SanitizedBatch::empty();
        let mut last_supplier: Option<String> = None;

        for (idx, raw) in rows.iter().enumerate() {
            let row_number = idx as i64 + 1;

            let obj = match raw.as_object() {
                Some(obj) => obj,
                None => {
                    batch.rejects.push(RejectRecord::new(
                        row_number,
                        RejectReason::StructurallyInvalidRow,
                        raw.clone(),
                    ));
                    continue;
                }
            };

            let document_number = self.text_field(obj, "document_number", payable_aliases());
            let supplier_cell = self.text_field(obj, "supplier", payable_aliases());

            if matches!(&document_number, Some(v) if is_garbage_row(v))
                || matches!(&supplier_cell, Some(v) if is_garbage_row(v))
            {
                batch.rejects.push(RejectRecord::new(
                    row_number,
                    RejectReason::StructurallyInvalidRow,
                    raw.clone(),
                ));
                continue;
            }

            let supplier = match supplier_cell {
                Some(name) => {
                    last_supplier = Some(name.clone());
                    Some(name)
                }
                None => last_supplier.clone(),
            };

            let (document_number, supplier) = match (document_number, supplier) {
                (Some(doc), Some(supplier)) => (doc, supplier),
                _ => {
                    batch.rejects.push(RejectRecord::new(
                        row_number,
                        RejectReason::EmptyMandatoryField,
                        raw.clone(),
                    ));
                    continue;
                }
            };

            let mut issues = Vec::new();
            let principal =
                self.money_field(obj, "principal_value", payable_aliases(), &mut issues);
            let fine = self.money_field(obj, "fine", payable_aliases(), &mut issues);
            let interest = self.money_field(obj, "interest", payable_aliases(), &mut issues);
            let supplied_total = self.money_field(obj, "amount", payable_aliases(), &mut issues);

            let amount = if supplied_total == Decimal::ZERO {
                principal + fine + interest
            } else {
                supplied_total
            };

            let record = PayableDraft {
                supplier,
                document_number,
                description: self.text_field(obj, "description", payable_aliases()),
                principal_value: principal,
                fine,
                interest,
                amount,
                issue_date: self.date_field(obj, "issue_date", payable_aliases()),
                due_date: self.date_field(obj, "due_date", payable_aliases()),
                status: PayableStatus::from_raw(
                    self.text_field(obj, "status", payable_aliases()).as_deref(),
                ),
            };

            batch.rows.push(SanitizedRow {
                row_number,
                record,
                raw: raw.clone(),
                issues,
            });
        }

        debug!(
            "Sanitized {} payable rows: {} kept, {} excluded",
            rows.len(),
            batch.rows.len(),
            batch.rejects.len()
        );
        batch
    }

    // === Field helpers ===

    fn resolve<'a>(
        &self,
        row: &'a Map<String, JsonValue>,
        field: &str,
        table: &[(&str, &[&str])],
    ) -> Option<&'a JsonValue> {
        let aliases = table
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[]);
        let extras = self.extra_aliases.get(field).cloned().unwrap_or_default();
        resolve_field_with_extras(row, aliases, &extras)
    }

    /// Resolve to trimmed text; blank cells resolve to `None`
    fn text_field(
        &self,
        row: &Map<String, JsonValue>,
        field: &str,
        table: &[(&str, &[&str])],
    ) -> Option<String> {
        let value = self.resolve(row, field, table)?;
        let text = match value {
            JsonValue::String(s) => s.trim().to_string(),
            JsonValue::Number(n) => n.to_string(),
            JsonValue::Bool(b) => b.to_string(),
            _ => return None,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Resolve a monetary cell. Absent cells are zero without comment; a
    /// present cell that fails to parse is zero with an annotation.
    fn money_field(
        &self,
        row: &Map<String, JsonValue>,
        field: &str,
        table: &[(&str, &[&str])],
        issues: &mut Vec<FieldIssue>,
    ) -> Decimal {
        let value = match self.resolve(row, field, table) {
            Some(value) => value,
            None => return Decimal::ZERO,
        };
        match value {
            // Already-numeric cells (canonical rows, xlsx adapters) are not
            // locale-formatted.
            JsonValue::Number(n) => n.to_string().parse::<Decimal>().unwrap_or_else(|_| {
                issues.push(FieldIssue {
                    field: field.to_string(),
                    value: n.to_string(),
                    message: format!("Could not parse {}: '{}'", field, n),
                });
                Decimal::ZERO
            }),
            JsonValue::String(s) if s.trim().is_empty() => Decimal::ZERO,
            JsonValue::String(s) => match parse_locale_number(s, field) {
                Ok(value) => value,
                Err(err) => {
                    issues.push(FieldIssue {
                        field: field.to_string(),
                        value: s.clone(),
                        message: err.to_string(),
                    });
                    Decimal::ZERO
                }
            },
            _ => Decimal::ZERO,
        }
    }

    fn date_field(
        &self,
        row: &Map<String, JsonValue>,
        field: &str,
        table: &[(&str, &[&str])],
    ) -> Option<chrono::NaiveDate> {
        self.text_field(row, field, table)
            .and_then(|text| parse_locale_date(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_typical_receivable_row_parses() {
        let rows = vec![json!({
            "Cliente": "Acme",
            "NF": "1001",
            "Vlr Principal": "1.500,00",
            "Dt. Vencimento": "15/06/2024"
        })];

        let batch = RowSanitizer::new().sanitize_receivables(&rows);
        assert!(batch.rejects.is_empty());
        assert_eq!(batch.rows.len(), 1);

        let record = &batch.rows[0].record;
        assert_eq!(record.customer, "Acme");
        assert_eq!(record.invoice_number, "1001");
        assert_eq!(record.principal_value, Decimal::new(150000, 2));
        assert_eq!(record.due_date, NaiveDate::from_ymd_opt(2024, 6, 15));
        assert_eq!(record.updated_value, Decimal::new(150000, 2));
        assert_eq!(record.title_status, ReceivableStatus::Aberto);
        assert!(batch.rows[0].issues.is_empty());
    }

    #[test]
    fn test_garbage_rows_excluded_regardless_of_other_fields() {
        let rows = vec![
            json!({"Cliente": "Total", "NF": "1001", "Vlr Principal": "10,00"}),
            json!({"Cliente": "Filtros aplicados: 2024", "NF": "1002"}),
            json!({"Cliente": "Acme", "NF": "1003", "Vlr Principal": "10,00",
                   "Dt. Vencimento": "01/07/2024"}),
        ];

        let batch = RowSanitizer::new().sanitize_receivables(&rows);
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].record.invoice_number, "1003");
        assert_eq!(batch.rejects.len(), 2);
        assert!(batch
            .rejects
            .iter()
            .all(|r| r.reason_code == "structurally-invalid-row"));
        assert_eq!(batch.rejects[0].row_number, 1);
        assert_eq!(batch.rejects[1].row_number, 2);
    }

    #[test]
    fn test_missing_mandatory_field_rejects_row() {
        let rows = vec![json!({"Vlr Principal": "10,00", "Dt. Vencimento": "01/07/2024"})];
        let batch = RowSanitizer::new().sanitize_receivables(&rows);
        assert!(batch.rows.is_empty());
        assert_eq!(batch.rejects.len(), 1);
        assert_eq!(batch.rejects[0].reason_code, "empty-mandatory-field");
    }

    #[test]
    fn test_customer_forward_fill_is_per_call() {
        let rows = vec![
            json!({"Cliente": "Acme", "NF": "1001", "Vlr Principal": "10,00"}),
            json!({"NF": "1002", "Vlr Principal": "20,00"}),
        ];

        let sanitizer = RowSanitizer::new();
        let batch = sanitizer.sanitize_receivables(&rows);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[1].record.customer, "Acme");

        // A fresh call must not leak the previous accumulator.
        let orphan = vec![json!({"NF": "2001", "Vlr Principal": "5,00"})];
        let batch = sanitizer.sanitize_receivables(&orphan);
        assert!(batch.rows.is_empty());
        assert_eq!(batch.rejects[0].reason_code, "empty-mandatory-field");
    }

    #[test]
    fn test_unparseable_principal_is_soft_annotated_zero() {
        let rows = vec![json!({
            "Cliente": "Acme",
            "NF": "1001",
            "Vlr Principal": "n/d",
            "Multa": "5,00",
            "Dt. Vencimento": "01/07/2024"
        })];

        let batch = RowSanitizer::new().sanitize_receivables(&rows);
        assert_eq!(batch.rows.len(), 1, "soft failure must not drop the row");

        let row = &batch.rows[0];
        assert_eq!(row.record.principal_value, Decimal::ZERO);
        assert_eq!(row.record.fine, Decimal::new(500, 2));
        assert_eq!(row.record.updated_value, Decimal::new(500, 2));
        assert_eq!(row.issues.len(), 1);
        assert_eq!(row.issues[0].field, "principal_value");
        assert_eq!(row.issues[0].value, "n/d");
    }

    #[test]
    fn test_supplied_total_is_trusted_as_is() {
        let rows = vec![json!({
            "Cliente": "Acme",
            "NF": "1001",
            "Vlr Principal": "100,00",
            "Vlr Atualizado": "123,45",
            "Dt. Vencimento": "01/07/2024"
        })];

        let batch = RowSanitizer::new().sanitize_receivables(&rows);
        assert_eq!(batch.rows[0].record.updated_value, Decimal::new(12345, 2));
    }

    #[test]
    fn test_sanitize_is_idempotent_on_canonical_rows() {
        let rows = vec![json!({
            "customer": "Acme",
            "invoice_number": "1001",
            "principal_value": 1500.0,
            "fine": 10.0,
            "interest": 2.5,
            "due_date": "2024-06-15",
            "title_status": "Aberto"
        })];

        let batch = RowSanitizer::new().sanitize_receivables(&rows);
        let record = &batch.rows[0].record;
        assert_eq!(record.customer, "Acme");
        assert_eq!(record.principal_value, Decimal::new(150000, 2));
        assert_eq!(record.fine, Decimal::new(1000, 2));
        // Derived fields recomputed, everything else unchanged.
        assert_eq!(record.updated_value, Decimal::new(151250, 2));
        assert_eq!(record.due_date, NaiveDate::from_ymd_opt(2024, 6, 15));
    }

    #[test]
    fn test_payable_sanitization_maps_status() {
        let rows = vec![json!({
            "Fornecedor": "Distribuidora X",
            "Documento": "D-42",
            "Valor Total": "2.000,00",
            "Dt. Vencimento": "10/08/2024",
            "Situação": "VENCIDO"
        })];

        let batch = RowSanitizer::new().sanitize_payables(&rows);
        assert_eq!(batch.rows.len(), 1);
        let record = &batch.rows[0].record;
        assert_eq!(record.supplier, "Distribuidora X");
        assert_eq!(record.amount, Decimal::new(200000, 2));
        assert_eq!(record.status, PayableStatus::Overdue);
    }

    #[test]
    fn test_non_object_rows_reject_structurally() {
        let rows = vec![json!("linha solta"), json!(42)];
        let batch = RowSanitizer::new().sanitize_receivables(&rows);
        assert!(batch.rows.is_empty());
        assert_eq!(batch.rejects.len(), 2);
        assert!(batch
            .rejects
            .iter()
            .all(|r| r.reason_code == "structurally-invalid-row"));
    }
}
