//! Core gateway logic module
//!
//! This module contains the transaction lifecycle components:
//! - `traits` - Transport and storage seams
//! - `transport` - Blocking HTTP transport
//! - `client` - One method per gateway operation
//! - `guard` - Status-change preconditions
//! - `events` - Payment event listeners
//! - `transaction_store` - In-memory record storage
//! - `engine` - Orchestration of client, guard, store and events

pub mod client;
pub mod engine;
pub mod events;
pub mod guard;
pub mod traits;
pub mod transaction_store;
pub mod transport;

pub use client::{ChangeStatusRequest, GatewayClient, ReportQuery};
pub use engine::{AuthorizeOutcome, PaymentEngine, RemovalOutcome, SyncSummary};
pub use events::{EventDispatcher, PaymentEvent};
pub use guard::{check_transition, Operation, Permit};
pub use traits::{TransactionStore, Transport};
pub use transaction_store::MemoryTransactionStore;
pub use transport::HttpTransport;
