//! In-memory fakes for the core ports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::errors::{Error, Result};
use crate::ledger::{LocalLedgerStore, SavingsRecord, Transaction, TransactionType};
use crate::notifications::{Notification, NotificationSink};
use crate::remote::{QueryFilter, RemoteBackend, RemoteQueryError, RemoteUser};
use crate::settings::SettingsStore;

#[derive(Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl SettingsStore for MemorySettingsStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub struct FailingSettingsStore;

impl SettingsStore for FailingSettingsStore {
    fn get_setting(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set_setting(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::persistence("disk full"))
    }
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    transactions: Mutex<Vec<Transaction>>,
    savings: Mutex<SavingsRecord>,
}

impl MemoryLedgerStore {
    pub fn set_savings(&self, savings: SavingsRecord) {
        *self.savings.lock().unwrap() = savings;
    }
}

impl LocalLedgerStore for MemoryLedgerStore {
    fn load_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.lock().unwrap().clone())
    }

    fn append_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.transactions.lock().unwrap().push(transaction.clone());
        Ok(())
    }

    fn load_savings(&self) -> Result<SavingsRecord> {
        Ok(self.savings.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeRemote {
    rows: Mutex<HashMap<String, Vec<Value>>>,
    failures: Mutex<HashMap<String, RemoteQueryError>>,
    panicking: Mutex<Vec<String>>,
    selects: Mutex<Vec<(String, QueryFilter)>>,
    inserts: Mutex<Vec<(String, Value)>>,
    user: Mutex<Option<RemoteUser>>,
    token: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeRemote {
    pub fn set_rows(&self, table: &str, rows: Vec<Value>) {
        self.rows.lock().unwrap().insert(table.to_string(), rows);
    }

    pub fn fail_table(&self, table: &str, message: &str) {
        self.fail_with(table, RemoteQueryError::new(message));
    }

    pub fn fail_with(&self, table: &str, error: RemoteQueryError) {
        self.failures
            .lock()
            .unwrap()
            .insert(table.to_string(), error);
    }

    pub fn heal_table(&self, table: &str) {
        self.failures.lock().unwrap().remove(table);
    }

    pub fn panic_on(&self, table: &str) {
        self.panicking.lock().unwrap().push(table.to_string());
    }

    pub fn set_user(&self, user_id: &str) {
        *self.user.lock().unwrap() = Some(RemoteUser {
            id: user_id.to_string(),
            email: None,
        });
    }

    /// Block every select until permits are added to the returned semaphore.
    pub fn gate(&self) -> Arc<Semaphore> {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(semaphore.clone());
        semaphore
    }

    pub fn select_calls(&self, table: &str) -> usize {
        self.selects
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == table)
            .count()
    }

    pub fn last_filter(&self, table: &str) -> Option<QueryFilter> {
        self.selects
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| name == table)
            .map(|(_, filter)| filter.clone())
    }

    pub fn inserted_rows(&self, table: &str) -> Vec<Value> {
        self.inserts
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == table)
            .map(|(_, row)| row.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.selects.lock().unwrap().len() + self.inserts.lock().unwrap().len()
    }

    pub fn access_token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteBackend for FakeRemote {
    async fn select(
        &self,
        table: &str,
        filter: &QueryFilter,
    ) -> std::result::Result<Vec<Value>, RemoteQueryError> {
        self.selects
            .lock()
            .unwrap()
            .push((table.to_string(), filter.clone()));
        if self.panicking.lock().unwrap().iter().any(|name| name == table) {
            panic!("probe exploded for {}", table);
        }
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }
        if let Some(error) = self.failures.lock().unwrap().get(table) {
            return Err(error.clone());
        }
        let rows = self
            .rows
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default();
        Ok(match filter.limit {
            Some(limit) => rows.into_iter().take(limit).collect(),
            None => rows,
        })
    }

    async fn insert(
        &self,
        table: &str,
        row: Value,
    ) -> std::result::Result<Vec<Value>, RemoteQueryError> {
        if let Some(error) = self.failures.lock().unwrap().get(table) {
            return Err(error.clone());
        }
        let mut inserts = self.inserts.lock().unwrap();
        let mut stored = row.clone();
        stored["id"] = json!(100 + inserts.len());
        inserts.push((table.to_string(), row));
        Ok(vec![stored])
    }

    async fn current_user(&self) -> std::result::Result<Option<RemoteUser>, RemoteQueryError> {
        if self.token.lock().unwrap().is_none() {
            return Ok(None);
        }
        Ok(self.user.lock().unwrap().clone())
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }
}

#[derive(Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

pub fn sample_transaction(id: &str, user_id: &str) -> Transaction {
    Transaction {
        id: Some(id.to_string()),
        user_id: Some(user_id.to_string()),
        kind: TransactionType::Entrada,
        amount: Decimal::new(1000, 2),
        category: "Otros".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        description: format!("Movimiento {}", id),
        cost_type: String::new(),
    }
}

pub fn remote_transaction_row(id: i64, user_id: &str, kind: &str, amount: i64) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "type": kind,
        "amount": amount,
        "category": "General",
        "date": "2024-01-05",
        "description": "Fila remota",
        "cost_type": null,
        "created_at": "2024-01-05T12:00:00Z"
    })
}
