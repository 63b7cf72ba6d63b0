//! Skipjack Payment Gateway Library
//! # Overview
//!
//! This library is a synchronous client for the Skipjack payment gateway plus
//! a lifecycle guard that decides which status changes a transaction may go
//! through before they are sent.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (TransactionRecord, status codes, results, errors)
//! - [`config`] - Credentials and live/test endpoint selection
//! - [`cli`] - CLI arguments parsing and command execution
//! - [`core`] - Gateway logic:
//!   - [`core::client`] - One method per gateway operation
//!   - [`core::guard`] - Settle, refund, partial refund and delete preconditions
//!   - [`core::engine`] - Client, guard, store and events together
//!   - [`core::transaction_store`] - Stored records keyed by transaction id
//! - [`io`] - Request encoding and response decoding, ledger and CSV output
//!
//! # Transaction Lifecycle
//!
//! A record is created from an authorize response with its status unset. Status
//! queries fill in two independent axes:
//!
//! - `current_status`: Authorized, Denied, Settled, Credited, Deleted,
//!   Archived, Pre-Authorized or Split Settled
//! - `pending_status`: None, Pending Credit, Pending Settlement, Pending
//!   Delete, Pending Authorization, Pending Manual Settlement, Pending
//!   Recurring or Submitted for Settlement
//!
//! The gateway assigns a new transaction id when a transaction settles, so
//! stored records are re-keyed when a status query reports a different id.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod types;

pub use crate::config::GatewayConfig;
pub use crate::core::{
    AuthorizeOutcome, GatewayClient, MemoryTransactionStore, PaymentEngine, PaymentEvent,
    TransactionStore, Transport,
};
pub use io::FormParams;
pub use types::{
    CurrentStatus, GatewayError, PendingStatus, StatusChangeResult, StatusResult, TransactionId,
    TransactionRecord,
};
