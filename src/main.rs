//! Skipjack gateway CLI
//!
//! Command-line interface for authorizing payments and managing their
//! lifecycle at the Skipjack gateway.
//!
//! # Usage
//!
//! ```bash
//! skipjack authorize -f OrderNumber=5 -f TransactionAmount=10.00 ... --ledger transactions.csv
//! skipjack status 5
//! skipjack settle 000012345678 --ledger transactions.csv
//! skipjack partial-refund 000012345678 --amount 2.50 --ledger transactions.csv
//! skipjack sync --ledger transactions.csv
//! skipjack --live report --from 08/01/2012 --to 08/31/2012 > report.csv
//! ```
//!
//! Credentials come from the environment (or a `.env` file). Results are
//! written to stdout as CSV; logs go to stderr and are filtered with
//! `RUST_LOG`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing configuration, transport failure, refused status change, etc.)

use skipjack_gateway::cli;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let mut output = std::io::stdout();
    if let Err(e) = cli::run(args, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
