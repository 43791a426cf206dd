use log::warn;
use serde::de::DeserializeOwned;

use super::model::{NewTransaction, RemoteTransaction, Transaction};

/// Rename a remote-form row into local form.
pub fn to_local_form(row: &RemoteTransaction) -> Transaction {
    Transaction {
        id: row.id.clone(),
        user_id: row.user_id.clone(),
        kind: row.kind,
        amount: row.amount,
        category: row.category.clone(),
        date: row.date,
        description: row.description.clone(),
        cost_type: row.cost_type.clone(),
    }
}

/// Rename a local-form transaction into the remote row shape.
pub fn to_remote_form(transaction: &Transaction) -> RemoteTransaction {
    RemoteTransaction {
        id: transaction.id.clone(),
        user_id: transaction.user_id.clone(),
        kind: transaction.kind,
        amount: transaction.amount,
        category: transaction.category.clone(),
        date: transaction.date,
        description: transaction.description.clone(),
        cost_type: transaction.cost_type.clone(),
    }
}

/// Insert payload for the remote backend; the backend assigns the id.
pub fn new_remote_row(new: &NewTransaction, user_id: &str) -> RemoteTransaction {
    RemoteTransaction {
        id: None,
        user_id: Some(user_id.to_string()),
        kind: new.kind,
        amount: new.amount,
        category: new.category.clone(),
        date: new.date,
        description: new.description.clone(),
        cost_type: new.cost_type.clone(),
    }
}

impl From<&RemoteTransaction> for Transaction {
    fn from(row: &RemoteTransaction) -> Self {
        to_local_form(row)
    }
}

impl From<&Transaction> for RemoteTransaction {
    fn from(transaction: &Transaction) -> Self {
        to_remote_form(transaction)
    }
}

/// Decode raw remote rows, skipping (and logging) rows that do not match `T`.
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<serde_json::Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!("[Sync] Skipping malformed '{}' row: {}", table, err);
                None
            }
        })
        .collect()
}

/// Decode remote transaction rows straight into local form, keeping backend order.
pub fn decode_remote_transactions(table: &str, rows: Vec<serde_json::Value>) -> Vec<Transaction> {
    decode_rows::<RemoteTransaction>(table, rows)
        .iter()
        .map(to_local_form)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionType;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample() -> Transaction {
        Transaction {
            id: Some("local-7".to_string()),
            user_id: Some("42".to_string()),
            kind: TransactionType::Salida,
            amount: dec!(89.90),
            category: "Servicios".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            description: "Internet".to_string(),
            cost_type: "fijo".to_string(),
        }
    }

    #[test]
    fn round_trip_preserves_every_local_field() {
        let original = sample();
        let mut back = to_local_form(&to_remote_form(&original));
        back.id = original.id.clone();
        assert_eq!(back, original);
    }

    #[test]
    fn remote_serialization_uses_snake_case_names() {
        let value = serde_json::to_value(to_remote_form(&sample())).unwrap();
        assert_eq!(value["user_id"], "42");
        assert_eq!(value["cost_type"], "fijo");
        assert!(value.get("userId").is_none());
        assert!(value.get("costType").is_none());
    }

    #[test]
    fn missing_cost_type_defaults_to_empty() {
        let rows = vec![json!({
            "id": 1,
            "user_id": "42",
            "type": "entrada",
            "amount": 10,
            "category": "Regalo",
            "date": "2024-01-01",
            "description": "Cumpleaños",
            "extra_column": true
        })];
        let decoded = decode_remote_transactions("transactions", rows);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].cost_type, "");
        assert_eq!(decoded[0].user_id.as_deref(), Some("42"));
    }

    #[test]
    fn malformed_rows_are_skipped_in_order() {
        let rows = vec![
            json!({ "user_id": "1", "type": "entrada", "amount": 1, "date": "2024-01-01" }),
            json!({ "user_id": "1", "type": "bogus", "amount": 2, "date": "2024-01-02" }),
            json!({ "user_id": "1", "type": "salida", "amount": 3, "date": "2024-01-03" }),
        ];
        let decoded = decode_remote_transactions("transactions", rows);
        let amounts: Vec<_> = decoded.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec!(1), dec!(3)]);
    }

    #[test]
    fn new_row_has_no_surrogate_id() {
        let new = NewTransaction {
            kind: TransactionType::Entrada,
            amount: dec!(20),
            category: "Venta".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            description: String::new(),
            cost_type: String::new(),
        };
        let value = serde_json::to_value(new_remote_row(&new, "42")).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["user_id"], "42");
    }
}
