use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Talk to the Skipjack payment gateway
#[derive(Parser, Debug)]
#[command(name = "skipjack")]
#[command(about = "Authorize, query and manage Skipjack gateway transactions", long_about = None)]
pub struct CliArgs {
    /// Force the developer (test) endpoints
    #[arg(long = "test-mode", conflicts_with = "live")]
    pub test_mode: bool,

    /// Force the live endpoints
    #[arg(long = "live")]
    pub live: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// Debug mode requested on the command line, if any
    pub fn debug_override(&self) -> Option<bool> {
        if self.test_mode {
            Some(true)
        } else if self.live {
            Some(false)
        } else {
            None
        }
    }
}

/// Path of the CSV file holding stored transactions
#[derive(Args, Debug, Clone)]
pub struct LedgerArg {
    #[arg(
        long = "ledger",
        value_name = "PATH",
        default_value = "transactions.csv",
        help = "CSV file of stored transactions"
    )]
    pub path: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Authorize a payment and store the result
    Authorize {
        /// Request field, repeatable, sent in the given order
        #[arg(short = 'f', long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        #[command(flatten)]
        ledger: LedgerArg,
    },

    /// Status of an order's latest (or a given) transaction
    Status {
        order_number: String,

        #[arg(long = "transaction-id", value_name = "ID")]
        transaction_id: Option<String>,
    },

    /// Every status row for an order
    History { order_number: String },

    /// Total settled, credited or split settled on an order
    AmountPaid { order_number: String },

    /// Settle an authorized transaction
    Settle {
        transaction_id: String,
        #[command(flatten)]
        ledger: LedgerArg,
    },

    /// Credit the full amount of a settled transaction
    Refund {
        transaction_id: String,
        #[command(flatten)]
        ledger: LedgerArg,
    },

    /// Credit part of a settled transaction
    PartialRefund {
        transaction_id: String,

        #[arg(long = "amount", value_name = "AMOUNT")]
        amount: Decimal,

        #[command(flatten)]
        ledger: LedgerArg,
    },

    /// Delete a transaction at the gateway and remove it from the ledger
    Delete {
        transaction_id: String,
        #[command(flatten)]
        ledger: LedgerArg,
    },

    /// Refresh stored transactions whose status may still change
    Sync {
        #[command(flatten)]
        ledger: LedgerArg,
    },

    /// List stored transactions
    List {
        #[command(flatten)]
        ledger: LedgerArg,
    },

    /// Close the current batch
    CloseBatch,

    /// Download a transaction report
    Report {
        #[arg(long = "from", value_name = "MM/DD/YYYY", value_parser = parse_date)]
        from: NaiveDate,

        #[arg(long = "to", value_name = "MM/DD/YYYY", value_parser = parse_date)]
        to: NaiveDate,

        #[arg(long = "filter", value_name = "FILTER", default_value = "")]
        filter: String,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y")
        .map_err(|e| format!("expected MM/DD/YYYY, got '{}': {}", raw, e))
}
