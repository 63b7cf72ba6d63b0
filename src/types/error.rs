//! Error types for the gateway client
//!
//! This module defines every error that can occur while talking to the gateway,
//! decoding its responses, or guarding transaction state changes.
//!
//! # Error Categories
//!
//! - **Transport Errors**: network failures and non-success HTTP statuses (fatal, never retried here)
//! - **Response Errors**: responses whose shape does not match the operation
//! - **Lifecycle Errors**: local guard rejections and gateway rejections of a status change
//! - **Local Errors**: configuration, ledger file I/O and CSV problems

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the gateway client
///
/// Each variant carries enough context to build the textual reason shown to a
/// user: either the local guard's explanation or the gateway's own message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The HTTP request could not be completed
    ///
    /// Fatal for the current operation. Retry policy belongs to the caller.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure
        message: String,
    },

    /// The response did not have the shape expected for the operation
    ///
    /// Query operations turn shape mismatches into "no result" instead; this
    /// variant is raised for authorize and report decoding, and for individual
    /// fields that cannot be decoded.
    #[error("Malformed {operation} response: {message}")]
    MalformedResponse {
        /// Operation whose response was being decoded
        operation: String,
        /// What was wrong with it
        message: String,
    },

    /// The gateway returned no usable result for the operation
    #[error("Gateway returned no result for {operation}")]
    NoResult {
        /// Operation that produced no result
        operation: String,
    },

    /// The local lifecycle guard rejected the requested operation
    ///
    /// Recoverable: callers typically refresh the status and report the reason.
    #[error("Transaction {transaction_id}: {reason}")]
    TransactionState {
        /// Transaction the operation was requested for
        transaction_id: String,
        /// Why the guard rejected it
        reason: String,
    },

    /// The gateway reported a non-successful outcome for a status change
    #[error("Gateway rejected {desired_status} for transaction {transaction_id}: {message}")]
    GatewayRejection {
        /// Transaction the change was requested for
        transaction_id: String,
        /// Status that was requested
        desired_status: String,
        /// The gateway's own message
        message: String,
    },

    /// No stored record exists for the transaction id
    #[error("Transaction {transaction_id} not found")]
    TransactionNotFound {
        /// Transaction id that was looked up
        transaction_id: String,
    },

    /// A re-issued transaction id is already held by another stored record
    #[error("Transaction {transaction_id} is already stored")]
    DuplicateTransaction {
        /// Transaction id that is already taken
        transaction_id: String,
    },

    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// I/O error while reading or writing a ledger or output
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV error while reading or writing a ledger or output
    #[error("CSV error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Csv {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the CSV error
        message: String,
    },
}

impl From<std::io::Error> for GatewayError {
    fn from(error: std::io::Error) -> Self {
        GatewayError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for GatewayError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        GatewayError::Csv {
            line,
            message: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        GatewayError::Transport {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl GatewayError {
    /// Create a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        GatewayError::Transport {
            message: message.into(),
        }
    }

    /// Create a MalformedResponse error
    pub fn malformed(operation: &str, message: impl Into<String>) -> Self {
        GatewayError::MalformedResponse {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Create a MalformedResponse error for a status digit outside its enumeration
    pub fn invalid_status_code(axis: &str, code: u8) -> Self {
        GatewayError::malformed("status", format!("unknown {} status code {}", axis, code))
    }

    /// Create a NoResult error
    pub fn no_result(operation: &str) -> Self {
        GatewayError::NoResult {
            operation: operation.to_string(),
        }
    }

    /// Create a TransactionState error
    pub fn transaction_state(transaction_id: &str, reason: impl Into<String>) -> Self {
        GatewayError::TransactionState {
            transaction_id: transaction_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a TransactionState error for a refund amount outside `(0, limit]`
    pub fn invalid_refund_amount(transaction_id: &str, requested: Decimal, limit: Decimal) -> Self {
        GatewayError::transaction_state(
            transaction_id,
            format!(
                "amount must be supplied and not exceed transaction amount (requested {}, limit {})",
                requested, limit
            ),
        )
    }

    /// Create a GatewayRejection error
    pub fn gateway_rejection(transaction_id: &str, desired_status: &str, message: &str) -> Self {
        GatewayError::GatewayRejection {
            transaction_id: transaction_id.to_string(),
            desired_status: desired_status.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(transaction_id: &str) -> Self {
        GatewayError::TransactionNotFound {
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create a DuplicateTransaction error
    pub fn duplicate_transaction(transaction_id: &str) -> Self {
        GatewayError::DuplicateTransaction {
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        GatewayError::Config {
            message: message.into(),
        }
    }

    /// Whether the error is a rejection of the requested state change
    /// (by the local guard or by the gateway) rather than a failure to talk
    /// to the gateway at all.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GatewayError::TransactionState { .. } | GatewayError::GatewayRejection { .. }
        )
    }
}
