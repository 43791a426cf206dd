use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use uuid::Uuid;

use super::cache::LedgerCache;
use crate::errors::{Error, Result};
use crate::ledger::{
    decode_remote_transactions, decode_rows, new_remote_row, to_local_form, LocalLedgerStore,
    NewTransaction, SavingsEntry, SavingsRecord, Transaction,
};
use crate::remote::{
    bounded, QueryFilter, RemoteBackend, RemoteQueryError, SAVINGS_HISTORY_TABLE, SAVINGS_TABLE,
    TRANSACTIONS_TABLE,
};
use crate::settings::BackendSelector;

/// Default bound on a single remote call.
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;

const USER_COLUMN: &str = "user_id";

#[derive(Debug, Deserialize)]
struct SavingsBalanceRow {
    #[serde(default)]
    balance: Option<Decimal>,
}

/// Reads the ledger from whichever source the selector designates and
/// commits successful results to the cache. Sole writer of [`LedgerCache`].
///
/// Cycles and local reloads are serialized on the cycle lock. Remote results
/// are only committed while remote mode is still active.
pub struct DataFetcher {
    selector: Arc<BackendSelector>,
    remote: Arc<dyn RemoteBackend>,
    local: Arc<dyn LocalLedgerStore>,
    cache: Arc<LedgerCache>,
    request_timeout: Duration,
    cycle_lock: AsyncMutex<()>,
}

impl DataFetcher {
    pub fn new(
        selector: Arc<BackendSelector>,
        remote: Arc<dyn RemoteBackend>,
        local: Arc<dyn LocalLedgerStore>,
        cache: Arc<LedgerCache>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            selector,
            remote,
            local,
            cache,
            request_timeout,
            cycle_lock: AsyncMutex::new(()),
        }
    }

    pub(crate) async fn lock_cycle(&self) -> MutexGuard<'_, ()> {
        self.cycle_lock.lock().await
    }

    pub(crate) fn try_lock_cycle(&self) -> Option<MutexGuard<'_, ()>> {
        self.cycle_lock.try_lock().ok()
    }

    pub fn cache(&self) -> Arc<LedgerCache> {
        Arc::clone(&self.cache)
    }

    /// Remote mode: the user's transactions, filtered server-side.
    /// Local mode: the whole cache; callers scope it themselves.
    pub async fn fetch_transactions(&self, user_id: Option<&str>) -> Result<Vec<Transaction>> {
        if !self.selector.is_using_remote()? {
            return Ok(self.cache.transactions().await);
        }
        let user_id = user_id.ok_or(Error::Unauthenticated)?;

        let filter = QueryFilter::new().eq(USER_COLUMN, user_id);
        let rows = self
            .remote_call(self.remote.select(TRANSACTIONS_TABLE, &filter))
            .await
            .inspect_err(|err| warn!("[Sync] Transactions fetch failed: {}", err))?;

        if !self.selector.is_using_remote()? {
            debug!("[Sync] Backend switched to local mid-fetch, discarding remote transactions");
            return Ok(self.cache.transactions().await);
        }
        let transactions = decode_remote_transactions(TRANSACTIONS_TABLE, rows);
        debug!(
            "[Sync] Fetched {} remote transactions for user {}",
            transactions.len(),
            user_id
        );
        self.cache.replace_transactions(transactions.clone()).await;
        Ok(transactions)
    }

    /// Same branching contract as [`Self::fetch_transactions`].
    pub async fn fetch_savings(&self, user_id: Option<&str>) -> Result<SavingsRecord> {
        if !self.selector.is_using_remote()? {
            return Ok(self.cache.savings().await);
        }
        let user_id = user_id.ok_or(Error::Unauthenticated)?;

        let balance_filter = QueryFilter::new().eq(USER_COLUMN, user_id).limit(1);
        let balance_rows = self
            .remote_call(self.remote.select(SAVINGS_TABLE, &balance_filter))
            .await
            .inspect_err(|err| warn!("[Sync] Savings fetch failed: {}", err))?;

        let history_filter = QueryFilter::new()
            .eq(USER_COLUMN, user_id)
            .order_asc("date");
        let history_rows = self
            .remote_call(self.remote.select(SAVINGS_HISTORY_TABLE, &history_filter))
            .await
            .inspect_err(|err| warn!("[Sync] Savings history fetch failed: {}", err))?;

        if !self.selector.is_using_remote()? {
            debug!("[Sync] Backend switched to local mid-fetch, discarding remote savings");
            return Ok(self.cache.savings().await);
        }
        let balance = decode_rows::<SavingsBalanceRow>(SAVINGS_TABLE, balance_rows)
            .into_iter()
            .next()
            .and_then(|row| row.balance)
            .unwrap_or_default();
        let savings = SavingsRecord {
            balance,
            history: decode_rows::<SavingsEntry>(SAVINGS_HISTORY_TABLE, history_rows),
        };
        self.cache.replace_savings(savings.clone()).await;
        Ok(savings)
    }

    /// Load the local store into the cache once no cycle is in flight.
    pub async fn reload_local(&self) -> Result<()> {
        let _cycle_guard = self.lock_cycle().await;
        self.load_local().await
    }

    /// Caller must hold the cycle lock.
    pub(crate) async fn load_local(&self) -> Result<()> {
        let transactions = self.local.load_transactions()?;
        let savings = self.local.load_savings()?;
        debug!(
            "[Sync] Loaded {} local transactions, {} savings entries",
            transactions.len(),
            savings.history.len()
        );
        self.cache.replace_transactions(transactions).await;
        self.cache.replace_savings(savings).await;
        Ok(())
    }

    /// Store a new transaction in the authoritative source.
    ///
    /// The remote copy is refreshed by the next cycle; the local copy is
    /// reloaded into the cache immediately.
    pub async fn insert_transaction(
        &self,
        user_id: Option<&str>,
        new: NewTransaction,
    ) -> Result<Transaction> {
        new.validate()?;
        let user_id = user_id.ok_or(Error::Unauthenticated)?;

        if self.selector.is_using_remote()? {
            let row = new_remote_row(&new, user_id);
            let payload = serde_json::to_value(&row)
                .map_err(|err| Error::invalid_input(format!("Unserializable row: {}", err)))?;
            let stored = self
                .remote_call(self.remote.insert(TRANSACTIONS_TABLE, payload))
                .await
                .inspect_err(|err| warn!("[Sync] Transaction insert failed: {}", err))?;
            let created = decode_remote_transactions(TRANSACTIONS_TABLE, stored)
                .into_iter()
                .next()
                .unwrap_or_else(|| to_local_form(&row));
            return Ok(created);
        }

        let transaction =
            new.into_transaction(Some(Uuid::new_v4().to_string()), Some(user_id.to_string()));
        let _cycle_guard = self.lock_cycle().await;
        self.local.append_transaction(&transaction)?;
        self.load_local().await?;
        Ok(transaction)
    }

    async fn remote_call<T>(
        &self,
        call: impl std::future::Future<Output = std::result::Result<T, RemoteQueryError>>,
    ) -> Result<T> {
        bounded(self.request_timeout, call).await.map_err(Error::from)
    }
}
