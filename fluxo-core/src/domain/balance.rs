//! Bank balance snapshot domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A declared balance for one bank account on one reference date.
///
/// Multiple snapshots may exist for the same `(bank_id, reference_date)`;
/// the most recently created one is authoritative for that pair when the
/// engine aggregates opening balances. Amounts across distinct banks on the
/// same date are summed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankBalanceSnapshot {
    pub id: Uuid,
    pub bank_id: String,
    pub reference_date: NaiveDate,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl BankBalanceSnapshot {
    pub fn new(bank_id: impl Into<String>, reference_date: NaiveDate, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            bank_id: bank_id.into(),
            reference_date,
            amount,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_creation() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let snapshot = BankBalanceSnapshot::new("itau", date, Decimal::new(100000, 2));

        assert_eq!(snapshot.bank_id, "itau");
        assert_eq!(snapshot.reference_date, date);
        assert_eq!(snapshot.amount, Decimal::new(100000, 2));
    }
}
