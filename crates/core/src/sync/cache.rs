use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::ledger::{SavingsRecord, Transaction};

/// In-memory snapshot of the ledger read by the API, export and debug views.
///
/// Writes are crate-private: only the data fetcher commits new snapshots.
#[derive(Debug, Default)]
pub struct LedgerCache {
    transactions: RwLock<Vec<Transaction>>,
    savings: RwLock<SavingsRecord>,
    refreshed_at: RwLock<Option<DateTime<Utc>>>,
}

impl LedgerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.transactions.read().await.clone()
    }

    pub async fn savings(&self) -> SavingsRecord {
        self.savings.read().await.clone()
    }

    /// When the last snapshot was committed.
    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        *self.refreshed_at.read().await
    }

    pub(crate) async fn replace_transactions(&self, transactions: Vec<Transaction>) {
        *self.transactions.write().await = transactions;
        self.touch().await;
    }

    pub(crate) async fn replace_savings(&self, savings: SavingsRecord) {
        *self.savings.write().await = savings;
        self.touch().await;
    }

    async fn touch(&self) {
        *self.refreshed_at.write().await = Some(Utc::now());
    }
}
