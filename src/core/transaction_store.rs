//! In-memory transaction storage
//!
//! This module provides the MemoryTransactionStore, a HashMap-backed
//! [`TransactionStore`] keyed by gateway transaction id. The CLI fills it from
//! a ledger file and writes it back after each command.
//!
//! # Id Rotation
//!
//! The gateway assigns a new transaction id when an authorized transaction is
//! settled. [`MemoryTransactionStore::rekey`] moves the record so later lookups
//! use the id the gateway now reports.

use crate::core::traits::TransactionStore;
use crate::types::{GatewayError, TransactionId, TransactionRecord};
use std::collections::HashMap;

/// HashMap-backed transaction store
#[derive(Debug, Default)]
pub struct MemoryTransactionStore {
    /// Map of transaction id to record
    transactions: HashMap<TransactionId, TransactionRecord>,
}

impl MemoryTransactionStore {
    /// Create a new empty store
    pub fn new() -> Self {
        MemoryTransactionStore {
            transactions: HashMap::new(),
        }
    }

    /// Build a store from previously saved records
    ///
    /// If two records share an id, the later one wins.
    pub fn from_records(records: impl IntoIterator<Item = TransactionRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Consume the store, returning its records sorted by transaction id
    pub fn into_records(self) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = self.transactions.into_values().collect();
        records.sort_by(|a, b| a.transaction_id.cmp(&b.transaction_id));
        records
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn insert(&mut self, record: TransactionRecord) {
        self.transactions
            .insert(record.transaction_id.clone(), record);
    }

    fn get(&self, transaction_id: &str) -> Option<&TransactionRecord> {
        self.transactions.get(transaction_id)
    }

    fn remove(&mut self, transaction_id: &str) -> Option<TransactionRecord> {
        self.transactions.remove(transaction_id)
    }

    fn update<F>(&mut self, transaction_id: &str, f: F) -> Result<(), GatewayError>
    where
        F: FnOnce(&mut TransactionRecord),
    {
        let record = self
            .transactions
            .get_mut(transaction_id)
            .ok_or_else(|| GatewayError::transaction_not_found(transaction_id))?;
        f(record);
        Ok(())
    }

    fn rekey(&mut self, old_id: &str, new_id: &str) -> Result<(), GatewayError> {
        if old_id == new_id {
            return Ok(());
        }
        if self.transactions.contains_key(new_id) {
            return Err(GatewayError::duplicate_transaction(new_id));
        }
        let mut record = self
            .transactions
            .remove(old_id)
            .ok_or_else(|| GatewayError::transaction_not_found(old_id))?;
        record.transaction_id = new_id.to_string();
        self.transactions.insert(new_id.to_string(), record);
        Ok(())
    }

    fn records(&self) -> Vec<&TransactionRecord> {
        let mut records: Vec<&TransactionRecord> = self.transactions.values().collect();
        records.sort_by(|a, b| a.transaction_id.cmp(&b.transaction_id));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApprovalFlag, CurrentStatus, PendingStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn record(transaction_id: &str) -> TransactionRecord {
        TransactionRecord {
            transaction_id: transaction_id.to_string(),
            order_number: "5".to_string(),
            amount: Decimal::new(10000, 2),
            auth_code: "TAS204".to_string(),
            auth_decline_message: String::new(),
            auth_response_code: "TAS204".to_string(),
            approved: ApprovalFlag::Approved,
            avs_code: String::new(),
            avs_message: String::new(),
            cvv2_response_code: String::new(),
            cvv2_response_message: String::new(),
            cavv_response: String::new(),
            return_code: 1,
            is_live: false,
            current_status: None,
            pending_status: PendingStatus::None,
            status_text: String::new(),
            status_date: None,
            created: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = MemoryTransactionStore::new();
        store.insert(record("A"));

        assert_eq!(store.get("A").map(|r| r.order_number.as_str()), Some("5"));
        assert!(store.get("B").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_applies_closure() {
        let mut store = MemoryTransactionStore::from_records(vec![record("A")]);
        store
            .update("A", |r| r.current_status = Some(CurrentStatus::Settled))
            .unwrap();
        assert_eq!(store.get("A").unwrap().current_status, Some(CurrentStatus::Settled));
    }

    #[test]
    fn test_update_missing_record() {
        let mut store = MemoryTransactionStore::new();
        let result = store.update("missing", |_| {});
        assert_eq!(result, Err(GatewayError::transaction_not_found("missing")));
    }

    #[test]
    fn test_rekey_moves_record() {
        let mut store = MemoryTransactionStore::from_records(vec![record("OLD")]);
        store.rekey("OLD", "NEW").unwrap();

        assert!(store.get("OLD").is_none());
        assert_eq!(store.get("NEW").unwrap().transaction_id, "NEW");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rekey_same_id_is_noop() {
        let mut store = MemoryTransactionStore::from_records(vec![record("A")]);
        store.rekey("A", "A").unwrap();
        assert!(store.get("A").is_some());
    }

    #[test]
    fn test_rekey_onto_held_id_is_rejected() {
        let mut store = MemoryTransactionStore::from_records(vec![record("A"), record("B")]);
        store.update("B", |r| r.auth_code = "BBB222".to_string()).unwrap();

        let result = store.rekey("A", "B");

        assert_eq!(result, Err(GatewayError::duplicate_transaction("B")));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("A").unwrap().auth_code, "TAS204");
        assert_eq!(store.get("B").unwrap().auth_code, "BBB222");
    }

    #[test]
    fn test_remove_and_into_records_sorted() {
        let mut store = MemoryTransactionStore::from_records(vec![record("C"), record("A"), record("B")]);
        assert!(store.remove("B").is_some());
        assert!(store.remove("B").is_none());

        let ids: Vec<String> = store.into_records().into_iter().map(|r| r.transaction_id).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }
}
