//! Command execution
//!
//! Each subcommand maps onto one client or engine operation and writes its
//! result as CSV. Commands that touch stored transactions load the ledger
//! into a [`MemoryTransactionStore`] and write it back afterwards, whether or
//! not the operation succeeded, since a failed operation may still have
//! refreshed a record's status.

use crate::cli::args::{CliArgs, Command};
use crate::config::GatewayConfig;
use crate::core::{
    GatewayClient, MemoryTransactionStore, PaymentEngine, RemovalOutcome, ReportQuery, SyncSummary,
    Transport,
};
use crate::io::output::{
    write_amount_csv, write_batch_status_csv, write_report_csv, write_status_change_csv,
    write_status_csv, write_table_csv, write_transactions_csv,
};
use crate::io::{read_ledger, write_ledger, FormParams};
use crate::types::GatewayError;
use std::io::Write;
use std::path::Path;

/// Resolve configuration and run the parsed command
///
/// # Errors
///
/// Returns `Config` if the environment is incomplete, otherwise whatever the
/// command itself fails with.
pub fn run(args: CliArgs, output: &mut dyn Write) -> Result<(), GatewayError> {
    let mut config = GatewayConfig::from_env()?;
    if let Some(debug_mode) = args.debug_override() {
        config = config.with_debug_mode(debug_mode);
    }
    tracing::debug!(debug_mode = config.debug_mode, "configuration loaded");

    let client = GatewayClient::new(config)?;
    execute(args.command, client, output)
}

/// Run a command against an already built client
pub fn execute<T: Transport>(
    command: Command,
    client: GatewayClient<T>,
    output: &mut dyn Write,
) -> Result<(), GatewayError> {
    match command {
        Command::Authorize { fields, ledger } => {
            let params: FormParams = fields.into_iter().collect();
            let outcome = with_ledger(client, &ledger.path, |engine| engine.create_transaction(params))?;
            write_transactions_csv(&[outcome.into_record()], output)
        }
        Command::Status {
            order_number,
            transaction_id,
        } => {
            let status = client
                .transaction_status(&order_number, transaction_id.as_deref())?
                .ok_or_else(|| GatewayError::no_result("status"))?;
            write_status_csv(&[status], output)
        }
        Command::History { order_number } => {
            let history = client.order_history(&order_number)?;
            write_status_csv(&history, output)
        }
        Command::AmountPaid { order_number } => {
            let engine = PaymentEngine::new(client, MemoryTransactionStore::new());
            let paid = engine.amount_paid(&order_number)?;
            write_amount_csv("amount_paid", paid, output)
        }
        Command::Settle {
            transaction_id,
            ledger,
        } => {
            let result = with_ledger(client, &ledger.path, |engine| engine.settle(&transaction_id))?;
            write_status_change_csv(&result, output)
        }
        Command::Refund {
            transaction_id,
            ledger,
        } => {
            let result = with_ledger(client, &ledger.path, |engine| engine.refund(&transaction_id))?;
            write_status_change_csv(&result, output)
        }
        Command::PartialRefund {
            transaction_id,
            amount,
            ledger,
        } => {
            let result = with_ledger(client, &ledger.path, |engine| {
                engine.partial_refund(&transaction_id, amount)
            })?;
            write_status_change_csv(&result, output)
        }
        Command::Delete {
            transaction_id,
            ledger,
        } => {
            let outcome = with_ledger(client, &ledger.path, |engine| {
                engine.remove_transaction(&transaction_id)
            })?;
            write_removal_csv(&outcome, output)
        }
        Command::Sync { ledger } => {
            let summary = with_ledger(client, &ledger.path, |engine| Ok(engine.sync_pending()))?;
            write_sync_csv(summary, output)
        }
        Command::List { ledger } => {
            let records = read_ledger(&ledger.path)?;
            write_transactions_csv(&records, output)
        }
        Command::CloseBatch => {
            let status = client
                .close_batch()?
                .ok_or_else(|| GatewayError::no_result("close batch"))?;
            write_batch_status_csv(status, output)
        }
        Command::Report { from, to, filter } => {
            let query = ReportQuery::new(from, to).with_status_filter(filter);
            let rows = client.report(&query)?;
            write_report_csv(&rows, output)
        }
    }
}

/// Run `operation` with an engine over the ledger at `path`, then save it
fn with_ledger<T, R, F>(client: GatewayClient<T>, path: &Path, operation: F) -> Result<R, GatewayError>
where
    T: Transport,
    F: FnOnce(&mut PaymentEngine<T, MemoryTransactionStore>) -> Result<R, GatewayError>,
{
    let records = read_ledger(path)?;
    tracing::debug!(path = %path.display(), records = records.len(), "ledger loaded");

    let mut engine = PaymentEngine::new(client, MemoryTransactionStore::from_records(records));
    let result = operation(&mut engine);

    write_ledger(path, &engine.into_store().into_records())?;
    result
}

fn write_removal_csv(outcome: &RemovalOutcome, output: &mut dyn Write) -> Result<(), GatewayError> {
    let (label, reason) = match outcome {
        RemovalOutcome::Deleted(_) => ("deleted", ""),
        RemovalOutcome::Tolerated { reason, .. } => ("removed locally", reason.as_str()),
    };
    write_table_csv(
        &["transaction_id", "order_number", "outcome", "reason"],
        &[vec![
            outcome.record().transaction_id.clone(),
            outcome.record().order_number.clone(),
            label.to_string(),
            reason.to_string(),
        ]],
        output,
    )
}

fn write_sync_csv(summary: SyncSummary, output: &mut dyn Write) -> Result<(), GatewayError> {
    write_table_csv(
        &["checked", "updated", "failed"],
        &[vec![
            summary.checked.to_string(),
            summary.updated.to_string(),
            summary.failed.to_string(),
        ]],
        output,
    )
}
