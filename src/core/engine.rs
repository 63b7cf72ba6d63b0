//! Payment engine
//!
//! This module provides the PaymentEngine that ties the gateway client, the
//! lifecycle guard and a transaction store together.
//!
//! The engine enforces rules such as:
//! - Every authorization is stored and announces exactly one of
//!   `PaymentSuccessful` or `PaymentFlagged`
//! - Status-changing requests pass the lifecycle guard before they are sent
//! - Only a `SUCCESSFUL` gateway outcome counts as a completed change
//! - Stored records follow the gateway when it re-issues a transaction id

use crate::core::client::{ChangeStatusRequest, GatewayClient, ReportQuery};
use crate::core::events::{EventDispatcher, PaymentEvent};
use crate::core::guard::{check_transition, Operation};
use crate::core::traits::{TransactionStore, Transport};
use crate::core::transaction_store::MemoryTransactionStore;
use crate::core::transport::HttpTransport;
use crate::io::FormParams;
use crate::types::{
    BatchCloseStatus, CurrentStatus, DesiredStatus, GatewayError, ReportRow, StatusChangeResult,
    StatusResult, TransactionRecord,
};
use rust_decimal::Decimal;

/// Result of an authorization, split by the approval predicate
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizeOutcome {
    Approved(TransactionRecord),
    Flagged(TransactionRecord),
}

impl AuthorizeOutcome {
    pub fn record(&self) -> &TransactionRecord {
        match self {
            AuthorizeOutcome::Approved(record) | AuthorizeOutcome::Flagged(record) => record,
        }
    }

    pub fn into_record(self) -> TransactionRecord {
        match self {
            AuthorizeOutcome::Approved(record) | AuthorizeOutcome::Flagged(record) => record,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, AuthorizeOutcome::Approved(_))
    }
}

/// Result of removing a stored transaction
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    /// The gateway confirmed the delete
    Deleted(TransactionRecord),
    /// The delete was refused by the guard or the gateway; the local record
    /// was removed anyway
    Tolerated {
        record: TransactionRecord,
        reason: String,
    },
}

impl RemovalOutcome {
    pub fn record(&self) -> &TransactionRecord {
        match self {
            RemovalOutcome::Deleted(record) => record,
            RemovalOutcome::Tolerated { record, .. } => record,
        }
    }
}

/// Counts from a status sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Records that needed a refresh
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Payment engine
///
/// Owns the gateway client, the record store and the event listeners.
/// Mutating operations take `&mut self`, so read-modify-write on a record is
/// serialized within the process.
pub struct PaymentEngine<T: Transport = HttpTransport, S: TransactionStore = MemoryTransactionStore> {
    client: GatewayClient<T>,
    store: S,
    events: EventDispatcher,
}

impl<T: Transport, S: TransactionStore> PaymentEngine<T, S> {
    /// Create a new engine
    ///
    /// # Arguments
    ///
    /// * `client` - Gateway client, already bound to live or test endpoints
    /// * `store` - Where transaction records are kept
    pub fn new(client: GatewayClient<T>, store: S) -> Self {
        PaymentEngine {
            client,
            store,
            events: EventDispatcher::new(),
        }
    }

    /// Register a listener for payment events
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&PaymentEvent<'_>) + 'static,
    {
        self.events.subscribe(listener);
    }

    pub fn client(&self) -> &GatewayClient<T> {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the engine, returning its store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Look up a stored transaction
    pub fn transaction(&self, transaction_id: &str) -> Option<&TransactionRecord> {
        self.store.get(transaction_id)
    }

    /// Authorize a payment and store the resulting record
    ///
    /// # Arguments
    ///
    /// * `params` - Order, billing, shipping and card fields in the order the
    ///   gateway should receive them
    ///
    /// # Returns
    ///
    /// `Approved` when the record passes the approval predicate, otherwise
    /// `Flagged`. The matching event has already been emitted once.
    ///
    /// # Errors
    ///
    /// Returns `Transport` or `MalformedResponse` from the client. Nothing is
    /// stored or emitted in that case.
    pub fn create_transaction(&mut self, params: FormParams) -> Result<AuthorizeOutcome, GatewayError> {
        let record = self.client.authorize(params)?;
        self.store.insert(record.clone());

        if record.is_approved() {
            self.events.emit(&PaymentEvent::PaymentSuccessful(&record));
            Ok(AuthorizeOutcome::Approved(record))
        } else {
            tracing::warn!(
                transaction_id = %record.transaction_id,
                return_code = record.return_code,
                reason = record.return_code_description(),
                "payment flagged"
            );
            self.events.emit(&PaymentEvent::PaymentFlagged(&record));
            Ok(AuthorizeOutcome::Flagged(record))
        }
    }

    /// Refresh a stored record from a status query
    ///
    /// Queries by the record's order number, preferring the row for its
    /// transaction id. If the gateway reports a different id (it re-issues ids
    /// on settlement), the record moves to that id.
    ///
    /// # Returns
    ///
    /// The updated record
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transaction is not stored
    /// - The status query fails in transport
    /// - The gateway returned no usable status row (`NoResult`), including a
    ///   fallback row whose id belongs to another stored record
    pub fn update_status(&mut self, transaction_id: &str) -> Result<TransactionRecord, GatewayError> {
        let record = self
            .store
            .get(transaction_id)
            .ok_or_else(|| GatewayError::transaction_not_found(transaction_id))?;
        let previous = record.status();
        let order_number = record.order_number.clone();

        let status = self
            .client
            .transaction_status(&order_number, Some(transaction_id))?
            .ok_or_else(|| GatewayError::no_result("status"))?;

        let reissued = !status.transaction_id.is_empty() && status.transaction_id != transaction_id;
        if reissued && self.store.get(&status.transaction_id).is_some() {
            // The fallback row describes another stored transaction on this order
            tracing::warn!(
                transaction_id,
                other_id = %status.transaction_id,
                "status row belongs to another stored transaction"
            );
            return Err(GatewayError::no_result("status"));
        }

        self.store.update(transaction_id, |record| {
            record.current_status = status.status.current;
            record.pending_status = status.status.pending;
            record.status_text = status.message.clone();
            record.status_date = status.timestamp;
        })?;

        let mut current_id = transaction_id.to_string();
        if reissued {
            tracing::info!(
                old_id = transaction_id,
                new_id = %status.transaction_id,
                "gateway re-issued transaction id"
            );
            self.store.rekey(transaction_id, &status.transaction_id)?;
            current_id = status.transaction_id.clone();
        }

        let updated = self
            .store
            .get(&current_id)
            .cloned()
            .ok_or_else(|| GatewayError::transaction_not_found(&current_id))?;

        if updated.status() != previous {
            tracing::debug!(
                transaction_id = %current_id,
                from = %previous,
                to = %updated.status(),
                "status changed"
            );
            self.events.emit(&PaymentEvent::StatusChanged {
                record: &updated,
                previous,
            });
        }

        Ok(updated)
    }

    /// Settle an authorized transaction
    ///
    /// # Errors
    ///
    /// Returns `TransactionState` if the guard refuses, `GatewayRejection` if
    /// the gateway does not report success, or a transport error.
    pub fn settle(&mut self, transaction_id: &str) -> Result<StatusChangeResult, GatewayError> {
        self.apply(transaction_id, Operation::Settle)
    }

    /// Credit the full amount of a settled transaction
    pub fn refund(&mut self, transaction_id: &str) -> Result<StatusChangeResult, GatewayError> {
        self.apply(transaction_id, Operation::Refund)
    }

    /// Credit part of a settled transaction
    pub fn partial_refund(
        &mut self,
        transaction_id: &str,
        amount: Decimal,
    ) -> Result<StatusChangeResult, GatewayError> {
        self.apply(transaction_id, Operation::PartialRefund(amount))
    }

    /// Delete a transaction at the gateway and drop the local record
    pub fn delete(&mut self, transaction_id: &str) -> Result<StatusChangeResult, GatewayError> {
        self.apply(transaction_id, Operation::Delete)
    }

    fn apply(&mut self, transaction_id: &str, operation: Operation) -> Result<StatusChangeResult, GatewayError> {
        let record = self
            .store
            .get(transaction_id)
            .ok_or_else(|| GatewayError::transaction_not_found(transaction_id))?;

        let permit = check_transition(
            transaction_id,
            record.current_status,
            record.pending_status,
            record.amount,
            &operation,
        )?;

        let request = ChangeStatusRequest::new(transaction_id, permit.desired).with_amount(permit.amount);
        let result = self
            .client
            .change_status(&request)?
            .ok_or_else(|| GatewayError::no_result("change status"))?;

        if !result.is_successful() {
            return Err(GatewayError::gateway_rejection(
                transaction_id,
                permit.desired.as_wire(),
                &result.message,
            ));
        }

        tracing::info!(transaction_id, desired = %permit.desired, "status change accepted");

        if permit.desired == DesiredStatus::Delete {
            self.store.remove(transaction_id);
        } else if let Err(e) = self.update_status(transaction_id) {
            // The change itself went through
            tracing::warn!(transaction_id, error = %e, "status refresh after change failed");
        }

        Ok(result)
    }

    /// Remove a stored transaction, deleting it at the gateway if possible
    ///
    /// The status is refreshed first because the local copy may be stale. A
    /// delete refused by the guard or the gateway is tolerated: the record is
    /// removed locally and the refusal is reported in the outcome.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if nothing is stored under the id, or a
    /// transport error. The record is kept in either case.
    pub fn remove_transaction(&mut self, transaction_id: &str) -> Result<RemovalOutcome, GatewayError> {
        if self.store.get(transaction_id).is_none() {
            return Err(GatewayError::transaction_not_found(transaction_id));
        }

        let current_id = match self.update_status(transaction_id) {
            Ok(record) => record.transaction_id,
            Err(GatewayError::NoResult { .. }) => {
                tracing::warn!(transaction_id, "no status before delete, using stored status");
                transaction_id.to_string()
            }
            Err(e) => return Err(e),
        };
        let snapshot = self
            .store
            .get(&current_id)
            .cloned()
            .ok_or_else(|| GatewayError::transaction_not_found(&current_id))?;

        match self.delete(&current_id) {
            Ok(_) => Ok(RemovalOutcome::Deleted(snapshot)),
            Err(e) if e.is_rejection() => {
                tracing::warn!(transaction_id = %current_id, reason = %e, "gateway delete refused, removing locally");
                let record = self.store.remove(&current_id).unwrap_or(snapshot);
                Ok(RemovalOutcome::Tolerated {
                    record,
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Refresh every record whose status may still change
    ///
    /// That is every record with a transaction id whose current status is
    /// unset, Authorized or Pre-Authorized. Individual failures are logged and
    /// counted; they do not stop the run.
    pub fn sync_pending(&mut self) -> SyncSummary {
        let pending: Vec<String> = self
            .store
            .records()
            .into_iter()
            .filter(|record| !record.transaction_id.is_empty())
            .filter(|record| {
                matches!(
                    record.current_status,
                    None | Some(CurrentStatus::Authorized) | Some(CurrentStatus::PreAuthorized)
                )
            })
            .map(|record| record.transaction_id.clone())
            .collect();

        let mut summary = SyncSummary {
            checked: pending.len(),
            ..SyncSummary::default()
        };

        for transaction_id in pending {
            match self.update_status(&transaction_id) {
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    tracing::warn!(transaction_id = %transaction_id, error = %e, "sync failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            checked = summary.checked,
            updated = summary.updated,
            failed = summary.failed,
            "sync complete"
        );
        summary
    }

    /// Total paid on an order
    ///
    /// Sums the amounts of every history row that is Settled, Credited or
    /// Split Settled.
    pub fn amount_paid(&self, order_number: &str) -> Result<Decimal, GatewayError> {
        let paid: Decimal = self
            .client
            .order_history(order_number)?
            .iter()
            .filter(|row| {
                matches!(
                    row.status.current,
                    Some(CurrentStatus::Settled)
                        | Some(CurrentStatus::Credited)
                        | Some(CurrentStatus::SplitSettled)
                )
            })
            .map(|row| row.amount)
            .sum();
        Ok(paid)
    }

    pub fn transaction_status(
        &self,
        order_number: &str,
        transaction_id: Option<&str>,
    ) -> Result<Option<StatusResult>, GatewayError> {
        self.client.transaction_status(order_number, transaction_id)
    }

    pub fn order_history(&self, order_number: &str) -> Result<Vec<StatusResult>, GatewayError> {
        self.client.order_history(order_number)
    }

    pub fn close_batch(&self) -> Result<Option<BatchCloseStatus>, GatewayError> {
        self.client.close_batch()
    }

    pub fn report(&self, query: &ReportQuery) -> Result<Vec<ReportRow>, GatewayError> {
        self.client.report(query)
    }
}
