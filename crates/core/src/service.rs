//! Ledger service: the entry point used by the app layer.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::errors::{Error, Result};
use crate::export::export_to_delimited_text;
use crate::health::HealthChecker;
use crate::ledger::{
    scope_transactions, LocalLedgerStore, NewTransaction, SavingsRecord, Transaction,
};
use crate::notifications::{Notification, NotificationSink};
use crate::remote::{bounded, RemoteBackend};
use crate::session::Session;
use crate::settings::{BackendMode, BackendSelector, SettingsStore};
use crate::sync::{
    DataFetcher, LedgerCache, RefreshOutcome, SyncCycleTrigger, SyncScheduler,
    SyncSchedulerStatus, DEFAULT_REMOTE_TIMEOUT_MS, DEFAULT_SYNC_INTERVAL_MS,
};

/// Timing knobs for the sync layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub sync_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_millis(DEFAULT_SYNC_INTERVAL_MS),
            request_timeout: Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
        }
    }
}

/// How a session is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignIn {
    /// Access token issued by the remote auth service.
    AccessToken(String),
    /// Local profile id, accepted only in local mode.
    LocalUser(String),
}

pub struct LedgerService {
    selector: Arc<BackendSelector>,
    session: Arc<Session>,
    remote: Arc<dyn RemoteBackend>,
    fetcher: Arc<DataFetcher>,
    scheduler: SyncScheduler,
    health: HealthChecker,
    notifier: Arc<dyn NotificationSink>,
    options: SyncOptions,
}

impl LedgerService {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        remote: Arc<dyn RemoteBackend>,
        local: Arc<dyn LocalLedgerStore>,
        notifier: Arc<dyn NotificationSink>,
        options: SyncOptions,
    ) -> Self {
        let selector = Arc::new(BackendSelector::new(settings));
        let session = Arc::new(Session::new());
        let fetcher = Arc::new(DataFetcher::new(
            Arc::clone(&selector),
            Arc::clone(&remote),
            local,
            Arc::new(LedgerCache::new()),
            options.request_timeout,
        ));
        let scheduler = SyncScheduler::new(Arc::clone(&fetcher), Arc::clone(&session));
        let health = HealthChecker::new(Arc::clone(&remote), options.request_timeout);

        Self {
            selector,
            session,
            remote,
            fetcher,
            scheduler,
            health,
            notifier,
            options,
        }
    }

    /// Seed the cache from the local store when local mode is active.
    pub async fn initialize(&self) -> Result<BackendMode> {
        let mode = self.selector.mode()?;
        if !mode.is_remote() {
            self.fetcher.reload_local().await?;
        }
        info!("[Ledger] Initialized in {:?} mode", mode);
        Ok(mode)
    }

    pub fn cache(&self) -> Arc<LedgerCache> {
        self.fetcher.cache()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    pub fn current_user(&self) -> Option<String> {
        self.session.user_id()
    }

    pub async fn sign_in(&self, credentials: SignIn) -> Result<String> {
        let user_id = match credentials {
            SignIn::AccessToken(token) => self.resolve_remote_user(token).await?,
            SignIn::LocalUser(user_id) => {
                if self.selector.is_using_remote()? {
                    return Err(Error::invalid_input(
                        "Remote mode requires an access token",
                    ));
                }
                let user_id = user_id.trim().to_string();
                if user_id.is_empty() {
                    return Err(Error::invalid_input("userId is required"));
                }
                user_id
            }
        };
        self.session.set_user_id(user_id.clone());
        info!("[Ledger] Session started for user {}", user_id);
        Ok(user_id)
    }

    pub fn sign_out(&self) {
        self.session.clear();
        self.remote.set_access_token(None);
        info!("[Ledger] Session cleared");
    }

    async fn resolve_remote_user(&self, token: String) -> Result<String> {
        self.remote.set_access_token(Some(token));
        match bounded(self.options.request_timeout, self.remote.current_user()).await {
            Ok(Some(user)) => Ok(user.id),
            Ok(None) => {
                self.remote.set_access_token(None);
                Err(Error::Unauthenticated)
            }
            Err(err) => {
                self.remote.set_access_token(None);
                warn!("[Ledger] Could not resolve the remote user: {}", err);
                Err(err.into())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Backend mode
    // ─────────────────────────────────────────────────────────────────────────

    pub fn backend_mode(&self) -> Result<BackendMode> {
        self.selector.mode()
    }

    /// Switch the authoritative source and refresh the cache from it.
    pub async fn set_remote_enabled(&self, enabled: bool) -> Result<BackendMode> {
        let result = if enabled {
            self.selector.enable_remote()
        } else {
            self.selector.disable_remote()
        };
        if let Err(err) = result {
            self.notifier.notify(Notification::error(
                "Error",
                "No se pudo guardar el modo de almacenamiento",
            ));
            return Err(err);
        }

        // Waits out any in-flight cycle so the cache only ever holds rows from
        // the newly selected source.
        self.scheduler
            .resync_after_switch(SyncCycleTrigger::BackendToggle, !enabled)
            .await?;

        let mode = BackendMode::from_flag(enabled);
        let message = if enabled {
            "Modo Supabase activado"
        } else {
            "Modo local activado"
        };
        self.notifier
            .notify(Notification::success("Almacenamiento", message));
        Ok(mode)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger data
    // ─────────────────────────────────────────────────────────────────────────

    /// The session user's transactions from the authoritative source.
    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        let user_id = self.session.user_id();
        let fetched = self
            .fetcher
            .fetch_transactions(user_id.as_deref())
            .await
            .inspect_err(|err| self.report_load_failure("transacciones", err))?;
        if self.selector.is_using_remote()? {
            return Ok(fetched);
        }
        Ok(scope_transactions(&fetched, user_id.as_deref()))
    }

    pub async fn savings(&self) -> Result<SavingsRecord> {
        let user_id = self.session.user_id();
        self.fetcher
            .fetch_savings(user_id.as_deref())
            .await
            .inspect_err(|err| self.report_load_failure("ahorros", err))
    }

    pub async fn add_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        let user_id = self.session.user_id();
        let created = self
            .fetcher
            .insert_transaction(user_id.as_deref(), new)
            .await
            .inspect_err(|err| {
                if !matches!(err, Error::InvalidInput(_)) {
                    self.notifier.notify(Notification::error(
                        "Error",
                        "No se pudo guardar la transacción",
                    ));
                }
            })?;

        if self.selector.is_using_remote()? {
            self.scheduler
                .refresh_now(SyncCycleTrigger::LocalMutation)
                .await;
        }
        self.notifier.notify(Notification::success(
            "Transacción guardada",
            format!("{} de {}", created.kind.display_label(), created.amount),
        ));
        Ok(created)
    }

    /// Cached transactions of the session user as delimited text.
    pub async fn export(&self) -> Result<String> {
        let cached = self.fetcher.cache().transactions().await;
        let scoped = scope_transactions(&cached, self.session.user_id().as_deref());
        export_to_delimited_text(&scoped).inspect_err(|err| {
            let message = match err {
                Error::EmptyExportInput => "No hay transacciones para exportar",
                _ => "No se pudo generar el archivo",
            };
            self.notifier.notify(Notification::error("Exportar", message));
        })
    }

    fn report_load_failure(&self, what: &str, err: &Error) {
        let message = if err.is_auth_error() {
            "Inicia sesión para ver tus datos".to_string()
        } else {
            format!("No se pudieron cargar los {}", what)
        };
        self.notifier.notify(Notification::error("Error", message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sync and health
    // ─────────────────────────────────────────────────────────────────────────

    pub fn start_sync(&self, interval: Option<Duration>) -> bool {
        self.scheduler
            .start(interval.unwrap_or(self.options.sync_interval))
    }

    pub fn stop_sync(&self) -> bool {
        self.scheduler.stop()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.scheduler.refresh_now(SyncCycleTrigger::Manual).await
    }

    pub fn sync_status(&self) -> SyncSchedulerStatus {
        self.scheduler.status()
    }

    pub async fn check_tables(&self) -> BTreeMap<String, bool> {
        self.health.check_required_tables().await
    }

    pub async fn ensure_tables_exist(&self) -> bool {
        let ready = self.health.ensure_tables_exist().await;
        if !ready {
            self.notifier.notify(Notification::error(
                "Base de datos",
                "Faltan tablas en el backend remoto",
            ));
        }
        ready
    }

    pub async fn check_connection(&self) -> bool {
        self.health.check_connection().await
    }
}
