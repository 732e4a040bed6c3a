//! Daily cash-flow recomputation engine
//!
//! Rebuilds the projection table for the full horizon in one synchronous
//! pass. The engine is deliberately total: every mutation path recomputes
//! every day rather than patching the affected range, so the ledger
//! invariant (each day's opening equals the prior day's accumulated unless
//! a snapshot overrides it) can never drift.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use log::debug;
use rust_decimal::Decimal;

use crate::domain::cashflow::{CashFlowDayEntry, SHORTFALL_ALERT};
use crate::domain::ReceivableStatus;
use crate::store::LedgerStore;

/// Recomputes the projection over a fixed horizon around a reference date
#[derive(Debug, Clone)]
pub struct CashFlowEngine {
    horizon_days_before: i64,
    horizon_days_after: i64,
}

impl CashFlowEngine {
    pub fn new(horizon_days_before: i64, horizon_days_after: i64) -> Self {
        Self {
            horizon_days_before,
            horizon_days_after,
        }
    }

    /// The gap-free sequence of horizon dates around `today`
    pub fn skeleton(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let start = today - Duration::days(self.horizon_days_before);
        let len = (self.horizon_days_before + self.horizon_days_after + 1) as usize;
        (0..len)
            .map(|offset| start + Duration::days(offset as i64))
            .collect()
    }

    /// Full recomputation over the horizon.
    ///
    /// `seed_opening` seeds the first day when no snapshot covers it; every
    /// later day opens at the prior day's accumulated balance unless a
    /// snapshot override replaces it.
    pub fn recompute(
        &self,
        store: &LedgerStore,
        today: NaiveDate,
        seed_opening: Decimal,
    ) -> Vec<CashFlowDayEntry> {
        let dates = self.skeleton(today);

        let mut receivables_by_day: HashMap<NaiveDate, Decimal> = HashMap::new();
        for title in store.receivables() {
            // Cancelled titles no longer represent expected inflow.
            if title.status == ReceivableStatus::Cancelado {
                continue;
            }
            *receivables_by_day.entry(title.due_date).or_default() += title.total_value;
        }

        let mut payables_by_day: HashMap<NaiveDate, Decimal> = HashMap::new();
        for obligation in store.payables() {
            *payables_by_day.entry(obligation.due_date).or_default() += obligation.total_value;
        }

        let mut expenses_by_day: HashMap<NaiveDate, Decimal> = HashMap::new();
        for expense in store.expenses() {
            *expenses_by_day.entry(expense.due_date).or_default() += expense.amount;
        }

        let mut entries = Vec::with_capacity(dates.len());
        let mut previous_accumulated: Option<Decimal> = None;

        for date in dates {
            let opening = match store.balance_override(date) {
                Some(snapshot_total) => snapshot_total,
                None => previous_accumulated.unwrap_or(seed_opening),
            };

            let inflow = receivables_by_day.get(&date).copied().unwrap_or_default();
            let outflow = payables_by_day.get(&date).copied().unwrap_or_default();
            let expenses = expenses_by_day.get(&date).copied().unwrap_or_default();

            let daily = inflow - outflow - expenses;
            let accumulated = opening + daily;
            let shortfall = accumulated < Decimal::ZERO;

            entries.push(CashFlowDayEntry {
                date,
                opening_balance: opening,
                total_receivables: inflow,
                total_payables: outflow,
                total_expenses: expenses,
                daily_balance: daily,
                accumulated_balance: accumulated,
                has_alert: shortfall,
                alert_message: shortfall.then(|| SHORTFALL_ALERT.to_string()),
            });
            previous_accumulated = Some(accumulated);
        }

        debug!(
            "recomputed cash flow for {}: {} days around {}",
            store.company_id(),
            entries.len(),
            today
        );
        entries
    }
}
