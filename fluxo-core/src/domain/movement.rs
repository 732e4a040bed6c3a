//! Movement domain models - receivables and payables
//!
//! A movement is a single financial obligation with principal/fine/interest
//! amounts and a due date. `total_value` is always derived from the three
//! inputs and recomputed whenever any of them changes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical receivable status, serialized with the labels the dashboard shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceivableStatus {
    Aberto,
    Liquidado,
    Cancelado,
}

impl ReceivableStatus {
    /// Map a raw imported status string onto the canonical set.
    ///
    /// Substring matching: anything containing "liquidado", "pago" or
    /// "baixado" is settled; anything containing "cancelado" is cancelled;
    /// everything else (including absent) is open.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let lower = match raw {
            Some(s) => s.trim().to_lowercase(),
            None => return Self::Aberto,
        };
        if lower.contains("liquidado") || lower.contains("pago") || lower.contains("baixado") {
            Self::Liquidado
        } else if lower.contains("cancelado") {
            Self::Cancelado
        } else {
            Self::Aberto
        }
    }
}

/// Canonical payable status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayableStatus {
    Pending,
    Paid,
    Overdue,
}

impl PayableStatus {
    /// Map a raw imported status string onto the canonical set
    pub fn from_raw(raw: Option<&str>) -> Self {
        let lower = match raw {
            Some(s) => s.trim().to_lowercase(),
            None => return Self::Pending,
        };
        if lower.contains("pago") || lower.contains("liquidado") || lower.contains("baixado") {
            Self::Paid
        } else if lower.contains("vencido") || lower.contains("atrasado") {
            Self::Overdue
        } else {
            Self::Pending
        }
    }
}

/// Soft data-quality flags surfaced for reconciliation, never enforced as
/// invariants on stored movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anomaly {
    NegativePrincipal,
    DueBeforeIssue,
}

/// A receivable title belonging to one company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receivable {
    pub id: Uuid,
    pub company_id: String,
    pub invoice_number: String,
    pub customer: String,
    /// Installment in "n/m" form, when the title is split
    pub installment: Option<String>,
    pub principal_value: Decimal,
    pub fine: Decimal,
    pub interest: Decimal,
    /// Always principal + fine + interest
    pub total_value: Decimal,
    pub issue_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub payment_prediction: Option<NaiveDate>,
    pub status: ReceivableStatus,
    pub created_at: DateTime<Utc>,
}

impl Receivable {
    /// Create a new open receivable; `total_value` is derived
    pub fn new(
        company_id: impl Into<String>,
        invoice_number: impl Into<String>,
        customer: impl Into<String>,
        principal_value: Decimal,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id: company_id.into(),
            invoice_number: invoice_number.into(),
            customer: customer.into(),
            installment: None,
            principal_value,
            fine: Decimal::ZERO,
            interest: Decimal::ZERO,
            total_value: principal_value,
            issue_date: None,
            due_date,
            payment_prediction: None,
            status: ReceivableStatus::Aberto,
            created_at: Utc::now(),
        }
    }

    /// Replace the amount inputs and rederive the total
    pub fn set_amounts(&mut self, principal: Decimal, fine: Decimal, interest: Decimal) {
        self.principal_value = principal;
        self.fine = fine;
        self.interest = interest;
        self.recalculate_total();
    }

    /// Rederive `total_value` from the current inputs
    pub fn recalculate_total(&mut self) {
        self.total_value = self.principal_value + self.fine + self.interest;
    }

    /// Soft anomaly scan
    pub fn anomalies(&self) -> Vec<Anomaly> {
        let mut found = Vec::new();
        if self.principal_value < Decimal::ZERO {
            found.push(Anomaly::NegativePrincipal);
        }
        if let Some(issue) = self.issue_date {
            if self.due_date < issue {
                found.push(Anomaly::DueBeforeIssue);
            }
        }
        found
    }
}

/// A payable obligation belonging to one company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payable {
    pub id: Uuid,
    pub company_id: String,
    pub supplier: String,
    pub document_number: String,
    pub description: Option<String>,
    pub principal_value: Decimal,
    pub fine: Decimal,
    pub interest: Decimal,
    /// Always principal + fine + interest
    pub total_value: Decimal,
    pub issue_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub status: PayableStatus,
    pub created_at: DateTime<Utc>,
}

impl Payable {
    /// Create a new pending payable; `total_value` is derived
    pub fn new(
        company_id: impl Into<String>,
        supplier: impl Into<String>,
        document_number: impl Into<String>,
        principal_value: Decimal,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id: company_id.into(),
            supplier: supplier.into(),
            document_number: document_number.into(),
            description: None,
            principal_value,
            fine: Decimal::ZERO,
            interest: Decimal::ZERO,
            total_value: principal_value,
            issue_date: None,
            due_date,
            status: PayableStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Replace the amount inputs and rederive the total
    pub fn set_amounts(&mut self, principal: Decimal, fine: Decimal, interest: Decimal) {
        self.principal_value = principal;
        self.fine = fine;
        self.interest = interest;
        self.recalculate_total();
    }

    /// Rederive `total_value` from the current inputs
    pub fn recalculate_total(&mut self) {
        self.total_value = self.principal_value + self.fine + self.interest;
    }

    /// Soft anomaly scan
    pub fn anomalies(&self) -> Vec<Anomaly> {
        let mut found = Vec::new();
        if self.principal_value < Decimal::ZERO {
            found.push(Anomaly::NegativePrincipal);
        }
        if let Some(issue) = self.issue_date {
            if self.due_date < issue {
                found.push(Anomaly::DueBeforeIssue);
            }
        }
        found
    }
}

/// Scheduled outflow kinds beyond payables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseKind {
    /// Import (trade) obligations due on a date
    ImportDuty,
    /// Other recurring or one-off expenses
    Other,
}

/// A dated outflow that is neither a receivable nor a payable title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledExpense {
    pub id: Uuid,
    pub company_id: String,
    pub kind: ExpenseKind,
    pub description: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl ScheduledExpense {
    pub fn new(
        company_id: impl Into<String>,
        kind: ExpenseKind,
        description: impl Into<String>,
        due_date: NaiveDate,
        amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id: company_id.into(),
            kind,
            description: description.into(),
            due_date,
            amount,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receivable_status_mapping() {
        assert_eq!(ReceivableStatus::from_raw(None), ReceivableStatus::Aberto);
        assert_eq!(
            ReceivableStatus::from_raw(Some("Título Liquidado")),
            ReceivableStatus::Liquidado
        );
        assert_eq!(
            ReceivableStatus::from_raw(Some("PAGO EM CARTÓRIO")),
            ReceivableStatus::Liquidado
        );
        assert_eq!(
            ReceivableStatus::from_raw(Some("Baixado por acordo")),
            ReceivableStatus::Liquidado
        );
        assert_eq!(
            ReceivableStatus::from_raw(Some("Cancelado")),
            ReceivableStatus::Cancelado
        );
        assert_eq!(
            ReceivableStatus::from_raw(Some("Em aberto")),
            ReceivableStatus::Aberto
        );
    }

    #[test]
    fn test_payable_status_mapping() {
        assert_eq!(PayableStatus::from_raw(None), PayableStatus::Pending);
        assert_eq!(PayableStatus::from_raw(Some("Pago")), PayableStatus::Paid);
        assert_eq!(
            PayableStatus::from_raw(Some("VENCIDO")),
            PayableStatus::Overdue
        );
        assert_eq!(
            PayableStatus::from_raw(Some("aguardando")),
            PayableStatus::Pending
        );
    }

    #[test]
    fn test_total_recomputed_on_amount_edit() {
        let due = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut title = Receivable::new("acme", "1001", "Cliente A", Decimal::new(150000, 2), due);
        assert_eq!(title.total_value, Decimal::new(150000, 2));

        title.set_amounts(
            Decimal::new(150000, 2),
            Decimal::new(1000, 2),
            Decimal::new(250, 2),
        );
        assert_eq!(title.total_value, Decimal::new(151250, 2));
    }

    #[test]
    fn test_anomaly_scan() {
        let due = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut title = Receivable::new("acme", "1001", "Cliente A", Decimal::new(-100, 2), due);
        title.issue_date = NaiveDate::from_ymd_opt(2024, 7, 1);
        let found = title.anomalies();
        assert!(found.contains(&Anomaly::NegativePrincipal));
        assert!(found.contains(&Anomaly::DueBeforeIssue));

        title.set_amounts(Decimal::new(100, 2), Decimal::ZERO, Decimal::ZERO);
        title.issue_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert!(title.anomalies().is_empty());
    }
}
