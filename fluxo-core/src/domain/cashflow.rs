//! Projected cash-flow day entry
//!
//! One row of the daily timeline. Entries are never persisted; every field is
//! a pure function of the ledger collections and the prior day's accumulated
//! balance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed message attached to days whose accumulated balance goes negative
pub const SHORTFALL_ALERT: &str = "Saldo projetado negativo";

/// One projected day in the cash-flow timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowDayEntry {
    pub date: NaiveDate,
    /// Snapshot override for the date when present, else the prior day's
    /// accumulated balance
    pub opening_balance: Decimal,
    pub total_receivables: Decimal,
    pub total_payables: Decimal,
    /// Import obligations plus other scheduled expenses due on the date
    pub total_expenses: Decimal,
    /// receivables - payables - expenses
    pub daily_balance: Decimal,
    /// opening + daily
    pub accumulated_balance: Decimal,
    pub has_alert: bool,
    pub alert_message: Option<String>,
}

impl CashFlowDayEntry {
    /// An empty entry for a day with no movements
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            opening_balance: Decimal::ZERO,
            total_receivables: Decimal::ZERO,
            total_payables: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            daily_balance: Decimal::ZERO,
            accumulated_balance: Decimal::ZERO,
            has_alert: false,
            alert_message: None,
        }
    }
}
