//! Types module
//!
//! Contains core data structures used throughout the crate.
//! This module organizes types into logical submodules:
//! - `error`: Error types for the gateway client
//! - `status`: Current/pending transaction status enumerations
//! - `transaction`: The stored transaction record and gateway code tables
//! - `results`: Value objects decoded from gateway responses

pub mod error;
pub mod results;
pub mod status;
pub mod transaction;

pub use error::GatewayError;
pub use results::{
    BatchCloseStatus, ChangeOutcome, DesiredStatus, ReportRow, ReportValue, StatusChangeResult,
    StatusResult,
};
pub use status::{CurrentStatus, PendingStatus, StatusCode};
pub use transaction::{ApprovalFlag, TransactionId, TransactionRecord};
