//! Core traits for gateway transport and transaction storage
//!
//! These are the seams between the gateway logic and the outside world: the
//! HTTP client on one side and wherever records are kept on the other. Tests
//! substitute scripted implementations for both.

use crate::types::{GatewayError, TransactionRecord};

/// Trait for sending a form-encoded POST to the gateway
///
/// Implementations perform exactly one blocking round trip and return the raw
/// response body. They never retry.
pub trait Transport {
    /// POST `body` (already form-encoded) to `url` and return the response text
    ///
    /// # Errors
    ///
    /// Returns `Transport` on network failure or a non-success HTTP status.
    fn post_form(&self, url: &str, body: &str) -> Result<String, GatewayError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_form(&self, url: &str, body: &str) -> Result<String, GatewayError> {
        (**self).post_form(url, body)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post_form(&self, url: &str, body: &str) -> Result<String, GatewayError> {
        (**self).post_form(url, body)
    }
}

/// Trait for storing transaction records
///
/// Records are keyed by gateway transaction id. Because the gateway re-issues
/// ids on settlement, [`TransactionStore::rekey`] moves a record to its new id.
pub trait TransactionStore {
    /// Insert or replace a record under its transaction id
    fn insert(&mut self, record: TransactionRecord);

    /// Get a record by transaction id
    fn get(&self, transaction_id: &str) -> Option<&TransactionRecord>;

    /// Remove a record, returning it if present
    fn remove(&mut self, transaction_id: &str) -> Option<TransactionRecord>;

    /// Update a record in place using a closure
    fn update<F>(&mut self, transaction_id: &str, f: F) -> Result<(), GatewayError>
    where
        F: FnOnce(&mut TransactionRecord);

    /// Move a record to a new transaction id
    ///
    /// Fails with `DuplicateTransaction` if another record already holds
    /// `new_id`; neither record is touched in that case.
    fn rekey(&mut self, old_id: &str, new_id: &str) -> Result<(), GatewayError>;

    /// All stored records, in a stable order
    fn records(&self) -> Vec<&TransactionRecord>;
}
