//! CSV format handling for gateway responses
//!
//! This module centralizes every response-decoding concern:
//! - Splitting response bodies into CSV rows
//! - Mapping authorize fields onto a [`TransactionRecord`]
//! - Row-shape policies for status, change-status and close-batch responses
//! - Report extraction with currency and date decoding
//!
//! All functions are pure (no I/O) for easy testing. Query decoders return
//! `None` when the response does not have the expected shape; authorize and
//! report decoders return `MalformedResponse` instead.

use crate::types::{
    ApprovalFlag, BatchCloseStatus, ChangeOutcome, GatewayError, PendingStatus, ReportRow,
    ReportValue, StatusChangeResult, StatusCode, StatusResult, TransactionRecord,
};
use chrono::{NaiveDateTime, Utc};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Columns in one status query row
pub const STATUS_COLUMNS: usize = 9;
/// Columns in the change-status data row
pub const STATUS_CHANGE_COLUMNS: usize = 7;
/// Columns in the close-batch row
pub const CLOSE_BATCH_COLUMNS: usize = 12;

const REPORT_BEGIN_MARKER: &str = "<!-- Begin Data -->";
const REPORT_END_MARKER: &str = "<!-- End Data -->";
const REPORT_AMOUNT_SUFFIX: &str = "Amount";
const REPORT_DATE_SUFFIX: &str = "Date";
const REPORT_DATE_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Split a response body into CSV rows
///
/// Comma-delimited, double-quote quoted, no header handling and no field
/// trimming. Rows may have different lengths. Blank lines are skipped.
pub fn parse_rows(body: &str) -> Result<Vec<Vec<String>>, GatewayError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .quote(b'"')
        .from_reader(body.trim().as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(GatewayError::from)
        })
        .collect()
}

/// Wire field names returned by the authorize call
///
/// The set is closed: a response field outside it is a decoding error rather
/// than something to drop silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizeField {
    ReturnCode,
    OrderNumber,
    IsApproved,
    AuthCode,
    TransactionAmount,
    AuthorizationDeclinedMessage,
    Cvv2ResponseMessage,
    AvsResponseCode,
    Cvv2ResponseCode,
    AvsResponseMessage,
    TransactionFileName,
    CavvResponseCode,
    AuthorizationResponseCode,
    /// Echoed back by the gateway; not stored
    SerialNumber,
}

impl AuthorizeField {
    pub fn from_wire(name: &str) -> Option<Self> {
        let field = match name {
            "szReturnCode" => AuthorizeField::ReturnCode,
            "szOrderNumber" => AuthorizeField::OrderNumber,
            "szIsApproved" => AuthorizeField::IsApproved,
            "AUTHCODE" => AuthorizeField::AuthCode,
            "szTransactionAmount" => AuthorizeField::TransactionAmount,
            "szAuthorizationDeclinedMessage" => AuthorizeField::AuthorizationDeclinedMessage,
            "szCVV2ResponseMessage" => AuthorizeField::Cvv2ResponseMessage,
            "szAVSResponseCode" => AuthorizeField::AvsResponseCode,
            "szCVV2ResponseCode" => AuthorizeField::Cvv2ResponseCode,
            "szAVSResponseMessage" => AuthorizeField::AvsResponseMessage,
            "szTransactionFileName" => AuthorizeField::TransactionFileName,
            "szCAVVResponseCode" => AuthorizeField::CavvResponseCode,
            "szAuthorizationResponseCode" => AuthorizeField::AuthorizationResponseCode,
            "szSerialNumber" => AuthorizeField::SerialNumber,
            _ => return None,
        };
        Some(field)
    }
}

/// Decode an authorize response into a new transaction record
///
/// The response is a header row and a value row. Each header is mapped through
/// [`AuthorizeField`]; the transaction amount arrives in minor units and is
/// converted to major units.
///
/// # Arguments
///
/// * `body` - Raw response body
/// * `is_live` - Whether the request went to the live endpoint
///
/// # Errors
///
/// Returns `MalformedResponse` if:
/// - The body is not exactly two rows of equal length
/// - A header is not a known authorize field
/// - `szReturnCode` is missing or not an integer
/// - The amount or approval flag cannot be decoded
pub fn decode_authorize(body: &str, is_live: bool) -> Result<TransactionRecord, GatewayError> {
    let rows = parse_rows(body)?;
    let (headers, values) = match rows.as_slice() {
        [headers, values] if headers.len() == values.len() => (headers, values),
        _ => {
            return Err(GatewayError::malformed(
                "authorize",
                format!("expected a header row and a value row, got {} rows", rows.len()),
            ))
        }
    };

    let mut record = TransactionRecord {
        transaction_id: String::new(),
        order_number: String::new(),
        amount: Decimal::ZERO,
        auth_code: String::new(),
        auth_decline_message: String::new(),
        auth_response_code: String::new(),
        approved: ApprovalFlag::NotApproved,
        avs_code: String::new(),
        avs_message: String::new(),
        cvv2_response_code: String::new(),
        cvv2_response_message: String::new(),
        cavv_response: String::new(),
        return_code: 0,
        is_live,
        current_status: None,
        pending_status: PendingStatus::None,
        status_text: String::new(),
        status_date: None,
        created: Utc::now(),
    };
    let mut return_code = None;

    for (name, value) in headers.iter().zip(values) {
        let field = AuthorizeField::from_wire(name).ok_or_else(|| {
            GatewayError::malformed("authorize", format!("unmapped response field '{}'", name))
        })?;
        let value = value.clone();

        match field {
            AuthorizeField::ReturnCode => {
                let code = value.trim().parse::<i32>().map_err(|_| {
                    GatewayError::malformed("authorize", format!("invalid return code '{}'", value))
                })?;
                return_code = Some(code);
            }
            AuthorizeField::OrderNumber => record.order_number = value,
            AuthorizeField::IsApproved => record.approved = ApprovalFlag::from_wire(&value)?,
            AuthorizeField::AuthCode => record.auth_code = value,
            AuthorizeField::TransactionAmount => record.amount = parse_minor_units(&value)?,
            AuthorizeField::AuthorizationDeclinedMessage => record.auth_decline_message = value,
            AuthorizeField::Cvv2ResponseMessage => record.cvv2_response_message = value,
            AuthorizeField::AvsResponseCode => record.avs_code = value,
            AuthorizeField::Cvv2ResponseCode => record.cvv2_response_code = value,
            AuthorizeField::AvsResponseMessage => record.avs_message = value,
            AuthorizeField::TransactionFileName => record.transaction_id = value,
            AuthorizeField::CavvResponseCode => record.cavv_response = value,
            AuthorizeField::AuthorizationResponseCode => record.auth_response_code = value,
            AuthorizeField::SerialNumber => {}
        }
    }

    record.return_code = return_code
        .ok_or_else(|| GatewayError::malformed("authorize", "missing szReturnCode"))?;

    Ok(record)
}

/// Decode every well-formed row of a status query response
///
/// The first row is a header. Rows without exactly [`STATUS_COLUMNS`] columns,
/// or whose status code or amount does not decode, are dropped.
pub fn decode_status_rows(body: &str) -> Vec<StatusResult> {
    let rows = match parse_rows(body) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable status response");
            return Vec::new();
        }
    };

    rows.into_iter()
        .skip(1)
        .filter_map(|row| match status_from_row(&row) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::debug!(columns = row.len(), error = %e, "dropping status row");
                None
            }
        })
        .collect()
}

fn status_from_row(row: &[String]) -> Result<StatusResult, GatewayError> {
    if row.len() != STATUS_COLUMNS {
        return Err(GatewayError::malformed(
            "status",
            format!("expected {} columns, got {}", STATUS_COLUMNS, row.len()),
        ));
    }

    Ok(StatusResult {
        amount: parse_currency(&row[1])?,
        status: StatusCode::parse(&row[2])?,
        message: row[3].clone(),
        order_number: row[4].clone(),
        date: row[5].clone(),
        timestamp: parse_gateway_timestamp(&row[5]),
        transaction_id: row[6].clone(),
        approval_code: row[7].clone(),
        batch_number: row[8].clone(),
    })
}

/// Pick the row describing a transaction
///
/// With a transaction id, the matching row wins. Without one, or when the id is
/// no longer present (the gateway re-issues ids on settlement), the most recent
/// (last) row is used.
pub fn select_status(rows: Vec<StatusResult>, transaction_id: Option<&str>) -> Option<StatusResult> {
    if let Some(id) = transaction_id {
        if let Some(found) = rows.iter().find(|row| row.transaction_id == id) {
            return Some(found.clone());
        }
    }
    rows.into_iter().last()
}

/// Decode a status query response for one transaction
pub fn decode_status(body: &str, transaction_id: Option<&str>) -> Option<StatusResult> {
    select_status(decode_status_rows(body), transaction_id)
}

/// Decode a change-status response
///
/// Expects a header row and exactly one data row of [`STATUS_CHANGE_COLUMNS`]
/// columns. Any other shape, an unrecognized outcome or an unreadable amount
/// yields `None`.
pub fn decode_status_change(body: &str) -> Option<StatusChangeResult> {
    let rows = parse_rows(body).ok()?;
    let row = match rows.as_slice() {
        [_header, row] if row.len() == STATUS_CHANGE_COLUMNS => row,
        _ => {
            tracing::debug!(rows = rows.len(), "unexpected change status response shape");
            return None;
        }
    };

    let outcome = match ChangeOutcome::from_wire(&row[3]) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "discarding change status response");
            return None;
        }
    };

    let amount = match parse_currency(&row[1]) {
        Ok(amount) => amount,
        Err(e) => {
            tracing::warn!(error = %e, "discarding change status response");
            return None;
        }
    };

    Some(StatusChangeResult {
        amount,
        desired_status: row[2].clone(),
        outcome,
        message: row[4].clone(),
        order_number: row[5].clone(),
        transaction_id: row[6].clone(),
    })
}

/// Decode a close-batch response
///
/// Expects a first row of [`CLOSE_BATCH_COLUMNS`] columns whose second column is
/// a known [`BatchCloseStatus`].
pub fn decode_close_batch(body: &str) -> Option<BatchCloseStatus> {
    let rows = parse_rows(body).ok()?;
    let row = rows.first().filter(|row| row.len() == CLOSE_BATCH_COLUMNS)?;
    let status = BatchCloseStatus::from_wire(&row[1]);
    if status.is_none() {
        tracing::warn!(status = %row[1], "unknown close batch status");
    }
    status
}

/// Decode a report download
///
/// The CSV payload sits between `<!-- Begin Data -->` and `<!-- End Data -->`
/// inside an HTML page, with `<br>` line breaks. The first payload row is the
/// header; fields ending in `Amount` become [`ReportValue::Amount`] and fields
/// ending in `Date` become [`ReportValue::Date`]. Columns with an empty header
/// are dropped.
///
/// # Errors
///
/// Returns `MalformedResponse` if either marker is missing, or a currency or
/// date field does not decode.
pub fn decode_report(body: &str) -> Result<Vec<ReportRow>, GatewayError> {
    let payload = extract_report_payload(body)?;
    let rows = parse_rows(&payload)?;

    let mut rows = rows.into_iter();
    let headers = match rows.next() {
        Some(headers) => headers,
        None => return Ok(Vec::new()),
    };

    rows.filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| -> Result<ReportRow, GatewayError> {
            let fields = headers
                .iter()
                .zip(row)
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| report_value(name, value).map(|v| (name.clone(), v)))
                .collect::<Result<Vec<_>, GatewayError>>()?;
            Ok(ReportRow { fields })
        })
        .collect()
}

fn extract_report_payload(body: &str) -> Result<String, GatewayError> {
    let start = body
        .find(REPORT_BEGIN_MARKER)
        .map(|i| i + REPORT_BEGIN_MARKER.len())
        .ok_or_else(|| GatewayError::malformed("report", "missing begin data marker"))?;
    let end = body[start..]
        .find(REPORT_END_MARKER)
        .map(|i| i + start)
        .ok_or_else(|| GatewayError::malformed("report", "missing end data marker"))?;

    Ok(body[start..end]
        .replace("<br>\r\n", "\n")
        .replace("<br>\n", "\n")
        .replace("<br>", "\n")
        .trim()
        .to_string())
}

fn report_value(name: &str, value: String) -> Result<ReportValue, GatewayError> {
    if value.trim().is_empty() {
        return Ok(ReportValue::Text(value));
    }
    if name.ends_with(REPORT_AMOUNT_SUFFIX) {
        parse_currency(&value).map(ReportValue::Amount)
    } else if name.ends_with(REPORT_DATE_SUFFIX) {
        parse_report_date(&value).map(ReportValue::Date)
    } else {
        Ok(ReportValue::Text(value))
    }
}

/// Parse a currency amount in accounting notation
///
/// `$123.45` is positive and `($123.45)` negative. The dollar sign and
/// thousands separators are optional.
pub fn parse_currency(value: &str) -> Result<Decimal, GatewayError> {
    let trimmed = value.trim();
    let (negative, inner) = match trimmed.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };
    let digits: String = inner
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let amount = Decimal::from_str(&digits)
        .map_err(|_| GatewayError::malformed("report", format!("invalid currency amount '{}'", value)))?;

    Ok(if negative { -amount } else { amount })
}

/// Parse an amount given in minor units (`500` is 5.00)
pub fn parse_minor_units(value: &str) -> Result<Decimal, GatewayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    trimmed
        .parse::<i64>()
        .map(|cents| Decimal::new(cents, 2))
        .map_err(|_| GatewayError::malformed("authorize", format!("invalid transaction amount '{}'", value)))
}

/// Parse a report date in `MM/DD/YYYY hh:mm:ss AM|PM` form
pub fn parse_report_date(value: &str) -> Result<NaiveDateTime, GatewayError> {
    NaiveDateTime::parse_from_str(value.trim(), REPORT_DATE_FORMAT)
        .map_err(|_| GatewayError::malformed("report", format!("invalid date '{}'", value)))
}

/// Best-effort parse of a status query timestamp
pub fn parse_gateway_timestamp(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = [REPORT_DATE_FORMAT, "%m/%d/%Y %H:%M:%S", "%m/%d/%y %H:%M:%S"];
    let value = value.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}
