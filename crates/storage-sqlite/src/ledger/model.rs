//! Row shapes for the local ledger tables. Decimals and dates are stored as
//! text so values round-trip exactly.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::Row;

use finanzas_core::ledger::{SavingsEntry, Transaction, TransactionType};

use crate::errors::StorageError;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) struct TransactionRow {
    pub id: String,
    pub user_id: Option<String>,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub date: String,
    pub description: String,
    pub cost_type: String,
}

impl TransactionRow {
    pub const COLUMNS: &'static str =
        "id, user_id, kind, amount, category, date, description, cost_type";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            date: row.get(5)?,
            description: row.get(6)?,
            cost_type: row.get(7)?,
        })
    }

    pub fn from_transaction(transaction: &Transaction, id: String) -> Self {
        Self {
            id,
            user_id: transaction.user_id.clone(),
            kind: transaction.kind.as_str().to_string(),
            amount: transaction.amount.to_string(),
            category: transaction.category.clone(),
            date: transaction.date.format(DATE_FORMAT).to_string(),
            description: transaction.description.clone(),
            cost_type: transaction.cost_type.clone(),
        }
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StorageError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let kind = TransactionType::from_str(&row.kind).map_err(|_| StorageError::Corrupt {
            table: "local_transactions",
            column: "kind",
            value: row.kind.clone(),
        })?;
        Ok(Transaction {
            id: Some(row.id),
            user_id: row.user_id,
            kind,
            amount: parse_decimal("local_transactions", &row.amount)?,
            category: row.category,
            date: parse_date("local_transactions", &row.date)?,
            description: row.description,
            cost_type: row.cost_type,
        })
    }
}

pub(crate) struct SavingsEntryRow {
    pub amount: String,
    pub date: String,
    pub note: String,
}

impl SavingsEntryRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            amount: row.get(0)?,
            date: row.get(1)?,
            note: row.get(2)?,
        })
    }
}

impl TryFrom<SavingsEntryRow> for SavingsEntry {
    type Error = StorageError;

    fn try_from(row: SavingsEntryRow) -> Result<Self, Self::Error> {
        Ok(SavingsEntry {
            amount: parse_decimal("local_savings_history", &row.amount)?,
            date: parse_date("local_savings_history", &row.date)?,
            note: row.note,
        })
    }
}

pub(crate) fn parse_decimal(table: &'static str, raw: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(raw.trim()).map_err(|_| StorageError::Corrupt {
        table,
        column: "amount",
        value: raw.to_string(),
    })
}

fn parse_date(table: &'static str, raw: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| StorageError::Corrupt {
        table,
        column: "date",
        value: raw.to_string(),
    })
}
