//! Ledger store - in-memory authoritative collections for one company
//!
//! The store holds the active company's receivables, payables, bank balance
//! snapshots and scheduled expenses. Manual CRUD mutates it directly; bulk
//! imports replace whole collections after the persistence strategy
//! completes. The store never computes projections - that is the engine's
//! job - but it owns the snapshot-aggregation rule the engine consumes.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{BankBalanceSnapshot, Payable, Receivable, ScheduledExpense};

/// In-memory collections for the active company scope
#[derive(Debug, Default)]
pub struct LedgerStore {
    company_id: String,
    receivables: HashMap<Uuid, Receivable>,
    payables: HashMap<Uuid, Payable>,
    balances: Vec<BankBalanceSnapshot>,
    expenses: HashMap<Uuid, ScheduledExpense>,
}

impl LedgerStore {
    pub fn new(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            ..Default::default()
        }
    }

    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    // === Receivables ===

    pub fn add_receivable(&mut self, mut title: Receivable) -> Uuid {
        title.recalculate_total();
        let id = title.id;
        self.receivables.insert(id, title);
        id
    }

    pub fn update_receivable(&mut self, mut title: Receivable) -> Result<()> {
        if !self.receivables.contains_key(&title.id) {
            return Err(Error::not_found(format!("receivable {}", title.id)));
        }
        title.recalculate_total();
        self.receivables.insert(title.id, title);
        Ok(())
    }

    pub fn delete_receivable(&mut self, id: Uuid) -> Result<()> {
        self.receivables
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("receivable {}", id)))
    }

    pub fn receivables(&self) -> impl Iterator<Item = &Receivable> {
        self.receivables.values()
    }

    /// Replace the whole collection (post-import refresh)
    pub fn replace_receivables(&mut self, titles: Vec<Receivable>) {
        self.receivables = titles.into_iter().map(|t| (t.id, t)).collect();
    }

    // === Payables ===

    pub fn add_payable(&mut self, mut obligation: Payable) -> Uuid {
        obligation.recalculate_total();
        let id = obligation.id;
        self.payables.insert(id, obligation);
        id
    }

    pub fn update_payable(&mut self, mut obligation: Payable) -> Result<()> {
        if !self.payables.contains_key(&obligation.id) {
            return Err(Error::not_found(format!("payable {}", obligation.id)));
        }
        obligation.recalculate_total();
        self.payables.insert(obligation.id, obligation);
        Ok(())
    }

    pub fn delete_payable(&mut self, id: Uuid) -> Result<()> {
        self.payables
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("payable {}", id)))
    }

    pub fn payables(&self) -> impl Iterator<Item = &Payable> {
        self.payables.values()
    }

    pub fn replace_payables(&mut self, obligations: Vec<Payable>) {
        self.payables = obligations.into_iter().map(|p| (p.id, p)).collect();
    }

    // === Bank balances ===

    pub fn add_bank_balance(&mut self, snapshot: BankBalanceSnapshot) -> Uuid {
        let id = snapshot.id;
        self.balances.push(snapshot);
        id
    }

    /// Update a snapshot in place (matched by id)
    pub fn update_bank_balance(&mut self, snapshot: BankBalanceSnapshot) -> Result<()> {
        match self.balances.iter_mut().find(|s| s.id == snapshot.id) {
            Some(existing) => {
                *existing = snapshot;
                Ok(())
            }
            None => Err(Error::not_found(format!("bank balance {}", snapshot.id))),
        }
    }

    pub fn delete_bank_balance(&mut self, id: Uuid) -> Result<()> {
        let before = self.balances.len();
        self.balances.retain(|s| s.id != id);
        if self.balances.len() == before {
            return Err(Error::not_found(format!("bank balance {}", id)));
        }
        Ok(())
    }

    pub fn bank_balances(&self) -> &[BankBalanceSnapshot] {
        &self.balances
    }

    /// Aggregate snapshot override for a date, or `None` when no snapshot
    /// exists.
    ///
    /// Per bank, the most recently created snapshot for the date wins;
    /// amounts across distinct banks are summed.
    pub fn balance_override(&self, date: NaiveDate) -> Option<Decimal> {
        let mut latest_per_bank: HashMap<&str, &BankBalanceSnapshot> = HashMap::new();
        for snapshot in self.balances.iter().filter(|s| s.reference_date == date) {
            latest_per_bank
                .entry(snapshot.bank_id.as_str())
                .and_modify(|current| {
                    if snapshot.created_at >= current.created_at {
                        *current = snapshot;
                    }
                })
                .or_insert(snapshot);
        }
        if latest_per_bank.is_empty() {
            return None;
        }
        Some(latest_per_bank.values().map(|s| s.amount).sum())
    }

    // === Scheduled expenses ===

    pub fn add_expense(&mut self, expense: ScheduledExpense) -> Uuid {
        let id = expense.id;
        self.expenses.insert(id, expense);
        id
    }

    pub fn update_expense(&mut self, expense: ScheduledExpense) -> Result<()> {
        if !self.expenses.contains_key(&expense.id) {
            return Err(Error::not_found(format!("expense {}", expense.id)));
        }
        self.expenses.insert(expense.id, expense);
        Ok(())
    }

    pub fn delete_expense(&mut self, id: Uuid) -> Result<()> {
        self.expenses
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("expense {}", id)))
    }

    pub fn expenses(&self) -> impl Iterator<Item = &ScheduledExpense> {
        self.expenses.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_crud_roundtrip() {
        let mut store = LedgerStore::new("acme");
        let title = Receivable::new("acme", "1001", "Cliente A", Decimal::new(10000, 2), date(2024, 7, 1));
        let id = store.add_receivable(title.clone());

        let mut edited = title;
        edited.fine = Decimal::new(500, 2);
        store.update_receivable(edited).unwrap();

        let stored = store.receivables().next().unwrap();
        assert_eq!(stored.total_value, Decimal::new(10500, 2));

        store.delete_receivable(id).unwrap();
        assert!(store.delete_receivable(id).is_err());
    }

    #[test]
    fn test_update_missing_movement_is_not_found() {
        let mut store = LedgerStore::new("acme");
        let ghost = Payable::new("acme", "F", "D-1", Decimal::ONE, date(2024, 7, 1));
        assert!(matches!(
            store.update_payable(ghost),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_balance_override_sums_distinct_banks() {
        // Snapshots of 1000 and 500 on the same date aggregate to 1500
        // when they belong to different banks.
        let mut store = LedgerStore::new("acme");
        let day = date(2024, 6, 1);
        store.add_bank_balance(BankBalanceSnapshot::new("itau", day, Decimal::new(100000, 2)));
        store.add_bank_balance(BankBalanceSnapshot::new("bradesco", day, Decimal::new(50000, 2)));

        assert_eq!(store.balance_override(day), Some(Decimal::new(150000, 2)));
        assert_eq!(store.balance_override(date(2024, 6, 2)), None);
    }

    #[test]
    fn test_balance_override_last_write_wins_per_bank() {
        let mut store = LedgerStore::new("acme");
        let day = date(2024, 6, 1);

        let mut first = BankBalanceSnapshot::new("itau", day, Decimal::new(100000, 2));
        first.created_at = Utc::now() - Duration::minutes(5);
        let second = BankBalanceSnapshot::new("itau", day, Decimal::new(70000, 2));

        store.add_bank_balance(first);
        store.add_bank_balance(second);

        // Same bank and date: the newer creation wins, by time not by value.
        assert_eq!(store.balance_override(day), Some(Decimal::new(70000, 2)));
    }
}
