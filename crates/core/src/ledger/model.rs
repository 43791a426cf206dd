use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{Error, Result};

/// Direction of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Entrada,
    Salida,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entrada => "entrada",
            Self::Salida => "salida",
        }
    }

    /// Label shown to the user and written by the exporter.
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Entrada => "Ingreso",
            Self::Salida => "Gasto",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim() {
            "entrada" => Ok(Self::Entrada),
            "salida" => Ok(Self::Salida),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// Transaction in local form (camelCase field names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub category: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub cost_type: String,
}

/// Transaction row as stored by the remote backend (snake_case field names).
///
/// `id` is the backend surrogate key and need not match the local id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTransaction {
    #[serde(
        default,
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub category: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub cost_type: String,
}

/// Payload for creating a transaction; id and owner are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub category: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub cost_type: String,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(Error::invalid_input("amount must not be negative"));
        }
        if self.category.trim().is_empty() {
            return Err(Error::invalid_input("category is required"));
        }
        Ok(())
    }

    pub fn into_transaction(self, id: Option<String>, user_id: Option<String>) -> Transaction {
        Transaction {
            id,
            user_id,
            kind: self.kind,
            amount: self.amount,
            category: self.category,
            date: self.date,
            description: self.description,
            cost_type: self.cost_type,
        }
    }
}

/// One movement in the savings history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsEntry {
    pub amount: Decimal,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub note: String,
}

/// Savings balance with its ordered history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsRecord {
    pub balance: Decimal,
    pub history: Vec<SavingsEntry>,
}

/// A transaction in either of its two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerRecord {
    Local(Transaction),
    Remote(RemoteTransaction),
}

impl LedgerRecord {
    /// Owner id under the naming convention of this record's shape.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Local(transaction) => transaction.user_id.as_deref(),
            Self::Remote(row) => row.user_id.as_deref(),
        }
    }

    pub fn to_local(&self) -> Transaction {
        match self {
            Self::Local(transaction) => transaction.clone(),
            Self::Remote(row) => crate::ledger::to_local_form(row),
        }
    }
}

impl From<Transaction> for LedgerRecord {
    fn from(transaction: Transaction) -> Self {
        Self::Local(transaction)
    }
}

impl From<RemoteTransaction> for LedgerRecord {
    fn from(row: RemoteTransaction) -> Self {
        Self::Remote(row)
    }
}

/// Parse `YYYY-MM-DD`, an RFC 3339 timestamp, or a string starting with a date.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            raw.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(value) => value,
            RawId::Signed(value) => value.to_string(),
            RawId::Unsigned(value) => value.to_string(),
        }
    }
}

/// Identifiers may arrive as JSON strings or numbers; both are held as strings.
pub fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_iso_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}
