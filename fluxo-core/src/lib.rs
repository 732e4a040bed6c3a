//! Fluxo Core - cash-flow projection and import reconciliation
//!
//! This crate implements the dashboard's core logic following hexagonal
//! architecture:
//!
//! - **domain**: Core business entities (Receivable, Payable, CashFlowDayEntry, etc.)
//! - **ports**: Trait definitions for external dependencies (BackendDataService)
//! - **services**: Sanitization, persistence strategy, reject ledger, projection engine
//! - **adapters**: Concrete backend implementations

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
pub mod store;

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use log::info;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use config::Config;
use services::{CashFlowEngine, PersistenceService, RejectLedgerService, RowSanitizer};
use store::LedgerStore;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    Anomaly, BankBalanceSnapshot, CashFlowDayEntry, ImportOutcome, ImportReport, ImportSummary,
    Payable, Receivable, RejectRecord, ScheduledExpense,
};
pub use ports::{BackendDataService, RejectPage};

/// Main context for one company's cash-flow dashboard.
///
/// This is the primary entry point for all business logic. It holds the
/// backend connection, configuration, the ledger store and the projection,
/// and recomputes the full projection after every mutation.
pub struct FluxoContext {
    pub config: Config,
    company_id: String,
    reference_date: NaiveDate,
    backend: Arc<dyn BackendDataService>,
    engine: CashFlowEngine,
    sanitizer: RowSanitizer,
    persistence: PersistenceService,
    pub reject_service: RejectLedgerService,
    store: Mutex<LedgerStore>,
    projection: Mutex<Vec<CashFlowDayEntry>>,
    seed_opening: Mutex<Decimal>,
    // Held for the whole import call. try_lock, never wait: a second import
    // for the same company is refused, not queued.
    import_guard: AsyncMutex<()>,
}

impl FluxoContext {
    /// Create a context for one company, projecting around today
    pub fn new(
        config: Config,
        backend: Arc<dyn BackendDataService>,
        company_id: impl Into<String>,
    ) -> Self {
        let company_id = company_id.into();
        let engine = CashFlowEngine::new(config.horizon_days_before, config.horizon_days_after);
        let sanitizer = RowSanitizer::with_extra_aliases(config.extra_aliases.clone());
        let persistence = PersistenceService::new(Arc::clone(&backend));
        let reject_service =
            RejectLedgerService::new(Arc::clone(&backend), config.reject_page_size);
        let store = LedgerStore::new(company_id.clone());

        let context = Self {
            config,
            company_id,
            reference_date: Utc::now().date_naive(),
            backend,
            engine,
            sanitizer,
            persistence,
            reject_service,
            store: Mutex::new(store),
            projection: Mutex::new(Vec::new()),
            seed_opening: Mutex::new(Decimal::ZERO),
            import_guard: AsyncMutex::new(()),
        };
        context.refresh_projection();
        context
    }

    /// Pin the projection's reference date (the default is today)
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self.refresh_projection();
        self
    }

    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Opening balance used for the first horizon day when no bank snapshot
    /// covers it
    pub fn set_seed_opening(&self, amount: Decimal) {
        *self.seed_opening.lock().unwrap_or_else(|e| e.into_inner()) = amount;
        self.refresh_projection();
    }

    /// The current projection, one entry per horizon day
    pub fn projection(&self) -> Vec<CashFlowDayEntry> {
        self.projection
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn refresh_projection(&self) {
        let seed = *self.seed_opening.lock().unwrap_or_else(|e| e.into_inner());
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let table = self.engine.recompute(&store, self.reference_date, seed);
        drop(store);
        *self.projection.lock().unwrap_or_else(|e| e.into_inner()) = table;
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut LedgerStore) -> R) -> R {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut store)
    }

    // === Imports ===

    /// Import a parsed receivables spreadsheet: sanitize, persist through the
    /// two-tier strategy, refresh the ledger from the backend and recompute.
    ///
    /// Refuses with [`Error::ImportInFlight`] while another import for this
    /// company is running.
    pub async fn import_receivables(
        &self,
        rows: &[JsonValue],
        file_name: &str,
    ) -> Result<ImportReport> {
        let _guard = self
            .import_guard
            .try_lock()
            .map_err(|_| Error::ImportInFlight(self.company_id.clone()))?;

        let batch = self.sanitizer.sanitize_receivables(rows);
        info!(
            "importing {}: {} candidate rows, {} excluded during sanitization",
            file_name,
            batch.rows.len(),
            batch.rejects.len()
        );

        let outcome = self
            .persistence
            .persist_receivables(&self.company_id, &batch.rows, file_name)
            .await?;

        let refreshed = self.backend.get_receivables(&self.company_id).await?;
        self.with_store(|store| store.replace_receivables(refreshed));
        self.refresh_projection();

        Ok(ImportReport {
            outcome,
            local_rejects: batch.rejects,
        })
    }

    /// Import a parsed payables spreadsheet. Same pipeline as receivables,
    /// against the payable schema.
    pub async fn import_payables(
        &self,
        rows: &[JsonValue],
        file_name: &str,
    ) -> Result<ImportReport> {
        let _guard = self
            .import_guard
            .try_lock()
            .map_err(|_| Error::ImportInFlight(self.company_id.clone()))?;

        let batch = self.sanitizer.sanitize_payables(rows);
        info!(
            "importing {}: {} candidate rows, {} excluded during sanitization",
            file_name,
            batch.rows.len(),
            batch.rejects.len()
        );

        let outcome = self
            .persistence
            .persist_payables(&self.company_id, &batch.rows, file_name)
            .await?;

        let refreshed = self.backend.get_payables(&self.company_id).await?;
        self.with_store(|store| store.replace_payables(refreshed));
        self.refresh_projection();

        Ok(ImportReport {
            outcome,
            local_rejects: batch.rejects,
        })
    }

    // === Manual CRUD (each recomputes the projection) ===

    pub fn add_receivable(&self, title: Receivable) -> Uuid {
        let id = self.with_store(|store| store.add_receivable(title));
        self.refresh_projection();
        id
    }

    pub fn update_receivable(&self, title: Receivable) -> Result<()> {
        self.with_store(|store| store.update_receivable(title))?;
        self.refresh_projection();
        Ok(())
    }

    pub fn delete_receivable(&self, id: Uuid) -> Result<()> {
        self.with_store(|store| store.delete_receivable(id))?;
        self.refresh_projection();
        Ok(())
    }

    pub fn receivables(&self) -> Vec<Receivable> {
        self.with_store(|store| store.receivables().cloned().collect())
    }

    pub fn add_payable(&self, obligation: Payable) -> Uuid {
        let id = self.with_store(|store| store.add_payable(obligation));
        self.refresh_projection();
        id
    }

    pub fn update_payable(&self, obligation: Payable) -> Result<()> {
        self.with_store(|store| store.update_payable(obligation))?;
        self.refresh_projection();
        Ok(())
    }

    pub fn delete_payable(&self, id: Uuid) -> Result<()> {
        self.with_store(|store| store.delete_payable(id))?;
        self.refresh_projection();
        Ok(())
    }

    pub fn payables(&self) -> Vec<Payable> {
        self.with_store(|store| store.payables().cloned().collect())
    }

    pub fn add_bank_balance(&self, snapshot: BankBalanceSnapshot) -> Uuid {
        let id = self.with_store(|store| store.add_bank_balance(snapshot));
        self.refresh_projection();
        id
    }

    pub fn update_bank_balance(&self, snapshot: BankBalanceSnapshot) -> Result<()> {
        self.with_store(|store| store.update_bank_balance(snapshot))?;
        self.refresh_projection();
        Ok(())
    }

    pub fn delete_bank_balance(&self, id: Uuid) -> Result<()> {
        self.with_store(|store| store.delete_bank_balance(id))?;
        self.refresh_projection();
        Ok(())
    }

    pub fn add_expense(&self, expense: ScheduledExpense) -> Uuid {
        let id = self.with_store(|store| store.add_expense(expense));
        self.refresh_projection();
        id
    }

    pub fn update_expense(&self, expense: ScheduledExpense) -> Result<()> {
        self.with_store(|store| store.update_expense(expense))?;
        self.refresh_projection();
        Ok(())
    }

    pub fn delete_expense(&self, id: Uuid) -> Result<()> {
        self.with_store(|store| store.delete_expense(id))?;
        self.refresh_projection();
        Ok(())
    }

    // === Diagnostics ===

    /// Scan the ledger for data anomalies worth surfacing to operators
    pub fn scan_anomalies(&self) -> Vec<(Uuid, Anomaly)> {
        self.with_store(|store| {
            let mut found = Vec::new();
            for title in store.receivables() {
                for anomaly in title.anomalies() {
                    found.push((title.id, anomaly));
                }
            }
            for obligation in store.payables() {
                for anomaly in obligation.anomalies() {
                    found.push((obligation.id, anomaly));
                }
            }
            found
        })
    }
}
