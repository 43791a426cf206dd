use super::model::{SavingsRecord, Transaction};
use crate::errors::Result;

/// Durable storage backing local mode.
pub trait LocalLedgerStore: Send + Sync {
    /// All locally stored transactions, in insertion order.
    fn load_transactions(&self) -> Result<Vec<Transaction>>;

    fn append_transaction(&self, transaction: &Transaction) -> Result<()>;

    fn load_savings(&self) -> Result<SavingsRecord>;
}
