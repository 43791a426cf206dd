use std::sync::Arc;

use log::debug;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use finanzas_core::ledger::{LocalLedgerStore, SavingsEntry, SavingsRecord, Transaction};
use finanzas_core::Result;

use super::model::{parse_decimal, SavingsEntryRow, TransactionRow};
use crate::db::Database;
use crate::errors::StorageError;

/// Local ledger backed by SQLite. Transactions load in insertion order.
pub struct SqliteLedgerStore {
    db: Arc<Database>,
}

impl SqliteLedgerStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn load_transactions_impl(&self) -> std::result::Result<Vec<Transaction>, StorageError> {
        self.db.with_connection(|conn| {
            let sql = format!(
                "SELECT {} FROM local_transactions ORDER BY rowid",
                TransactionRow::COLUMNS
            );
            let rows = conn
                .prepare(&sql)?
                .query_map([], TransactionRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(Transaction::try_from).collect()
        })
    }

    fn load_savings_impl(&self) -> std::result::Result<SavingsRecord, StorageError> {
        self.db.with_connection(|conn| {
            let balance = conn
                .query_row("SELECT balance FROM local_savings WHERE id = 1", [], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?
                .map(|raw| parse_decimal("local_savings", &raw))
                .transpose()?
                .unwrap_or_default();

            let history = conn
                .prepare("SELECT amount, date, note FROM local_savings_history ORDER BY date, id")?
                .query_map([], SavingsEntryRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
                .into_iter()
                .map(SavingsEntry::try_from)
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(SavingsRecord { balance, history })
        })
    }
}

impl LocalLedgerStore for SqliteLedgerStore {
    fn load_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.load_transactions_impl()?)
    }

    fn append_transaction(&self, transaction: &Transaction) -> Result<()> {
        let id = transaction
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let row = TransactionRow::from_transaction(transaction, id);
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO local_transactions (id, user_id, kind, amount, category, date, description, cost_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.id,
                    row.user_id,
                    row.kind,
                    row.amount,
                    row.category,
                    row.date,
                    row.description,
                    row.cost_type
                ],
            )?;
            Ok(())
        })?;
        debug!("Stored local transaction {}", row.id);
        Ok(())
    }

    fn load_savings(&self) -> Result<SavingsRecord> {
        Ok(self.load_savings_impl()?)
    }
}
