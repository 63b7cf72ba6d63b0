//! CSV output for CLI results
//!
//! Every CLI command writes its result to stdout as CSV with a header row.

use crate::types::{BatchCloseStatus, GatewayError, ReportRow, StatusChangeResult, StatusResult, TransactionRecord};
use csv::Writer;
use rust_decimal::Decimal;
use std::io::Write;

/// Write status query results
pub fn write_status_csv(results: &[StatusResult], output: &mut dyn Write) -> Result<(), GatewayError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "transaction_id",
        "order_number",
        "amount",
        "status",
        "message",
        "date",
        "approval_code",
        "batch_number",
    ])?;

    for result in results {
        writer.write_record(&[
            result.transaction_id.clone(),
            result.order_number.clone(),
            format!("{:.2}", result.amount),
            result.message_detail(),
            result.message.clone(),
            result.date.clone(),
            result.approval_code.clone(),
            result.batch_number.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a change-status result
pub fn write_status_change_csv(
    result: &StatusChangeResult,
    output: &mut dyn Write,
) -> Result<(), GatewayError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["transaction_id", "order_number", "desired_status", "outcome", "amount", "message"])?;
    writer.write_record(&[
        result.transaction_id.clone(),
        result.order_number.clone(),
        result.desired_status.clone(),
        result.outcome.to_string(),
        format!("{:.2}", result.amount),
        result.message.clone(),
    ])?;
    writer.flush()?;
    Ok(())
}

/// Write a summary of stored transactions
pub fn write_transactions_csv(
    records: &[TransactionRecord],
    output: &mut dyn Write,
) -> Result<(), GatewayError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "transaction_id",
        "order_number",
        "amount",
        "approved",
        "return_code",
        "status",
        "avs",
        "cvv2",
        "cavv",
    ])?;

    for record in records {
        let [avs, cvv2, cavv] = record.verification_summary();
        writer.write_record(&[
            record.transaction_id.clone(),
            record.order_number.clone(),
            format!("{:.2}", record.amount),
            record.is_approved().to_string(),
            format!("{} ({})", record.return_code, record.return_code_description()),
            record.status().detail(),
            avs,
            cvv2,
            cavv,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write report rows using the first row's field names as the header
pub fn write_report_csv(rows: &[ReportRow], output: &mut dyn Write) -> Result<(), GatewayError> {
    let mut writer = Writer::from_writer(output);
    let headers: Vec<&str> = match rows.first() {
        Some(first) => first.fields.iter().map(|(name, _)| name.as_str()).collect(),
        None => return Ok(()),
    };
    writer.write_record(&headers)?;

    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|name| row.get(name).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        writer.write_record(&cells)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a header row and one row of cells per entry
pub fn write_table_csv(
    headers: &[&str],
    rows: &[Vec<String>],
    output: &mut dyn Write,
) -> Result<(), GatewayError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a single labelled value (amount paid, batch close status)
pub fn write_value_csv(label: &str, value: &str, output: &mut dyn Write) -> Result<(), GatewayError> {
    write_table_csv(&[label], &[vec![value.to_string()]], output)
}

pub fn write_amount_csv(label: &str, amount: Decimal, output: &mut dyn Write) -> Result<(), GatewayError> {
    write_value_csv(label, &format!("{:.2}", amount), output)
}

pub fn write_batch_status_csv(status: BatchCloseStatus, output: &mut dyn Write) -> Result<(), GatewayError> {
    write_value_csv("batch_status", status.description(), output)
}
