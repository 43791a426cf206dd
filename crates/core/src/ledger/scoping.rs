use super::model::{LedgerRecord, Transaction};

/// Keep the records owned by `user_id`, normalized to local form.
///
/// Each record is matched on the owner field of its own shape. No user means
/// no records. Input order is preserved and duplicates are kept.
pub fn scope_to_user(records: &[LedgerRecord], user_id: Option<&str>) -> Vec<Transaction> {
    let Some(user_id) = user_id else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|record| record.user_id() == Some(user_id))
        .map(LedgerRecord::to_local)
        .collect()
}

/// [`scope_to_user`] for records already in local form.
pub fn scope_transactions(records: &[Transaction], user_id: Option<&str>) -> Vec<Transaction> {
    let Some(user_id) = user_id else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|transaction| transaction.user_id.as_deref() == Some(user_id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{to_remote_form, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn transaction(id: &str, user: &str) -> Transaction {
        Transaction {
            id: Some(id.to_string()),
            user_id: Some(user.to_string()),
            kind: TransactionType::Entrada,
            amount: dec!(1),
            category: "Otros".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            description: String::new(),
            cost_type: String::new(),
        }
    }

    fn mixed() -> Vec<LedgerRecord> {
        vec![
            LedgerRecord::Local(transaction("a", "42")),
            LedgerRecord::Remote(to_remote_form(&transaction("b", "42"))),
            LedgerRecord::Local(transaction("c", "7")),
        ]
    }

    #[test]
    fn matches_both_shapes_for_the_same_user() {
        let scoped = scope_to_user(&mixed(), Some("42"));
        let ids: Vec<_> = scoped.iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn different_user_matches_neither_shape() {
        assert!(scope_to_user(&mixed()[..2], Some("43")).is_empty());
    }

    #[test]
    fn absent_user_yields_empty() {
        assert!(scope_to_user(&mixed(), None).is_empty());
        assert!(scope_transactions(&[transaction("a", "42")], None).is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let records = vec![
            LedgerRecord::Local(transaction("a", "42")),
            LedgerRecord::Local(transaction("a", "42")),
        ];
        assert_eq!(scope_to_user(&records, Some("42")).len(), 2);
    }

    #[test]
    fn records_without_owner_never_match() {
        let mut orphan = transaction("x", "42");
        orphan.user_id = None;
        assert!(scope_transactions(&[orphan], Some("")).is_empty());
    }
}
