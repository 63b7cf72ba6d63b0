//! Value objects decoded from gateway responses
//!
//! None of these are stored; each is produced fresh per request.

use super::error::GatewayError;
use super::status::StatusCode;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fmt;

/// One row of a status query response
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResult {
    pub transaction_id: String,
    pub amount: Decimal,
    pub status: StatusCode,
    pub message: String,
    pub order_number: String,
    /// Timestamp as sent by the gateway
    pub date: String,
    /// Parsed form of `date`, when it matches a known layout
    pub timestamp: Option<NaiveDateTime>,
    pub approval_code: String,
    pub batch_number: String,
}

impl StatusResult {
    /// Status interpretation with more detail than `message`
    pub fn message_detail(&self) -> String {
        self.status.detail()
    }
}

/// Status requested in a change-status call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredStatus {
    Settle,
    Credit,
    Delete,
}

impl DesiredStatus {
    pub fn as_wire(self) -> &'static str {
        match self {
            DesiredStatus::Settle => "SETTLE",
            DesiredStatus::Credit => "CREDIT",
            DesiredStatus::Delete => "DELETE",
        }
    }

    /// Settle and credit requests carry a force-settlement flag
    pub fn accepts_force_settlement(self) -> bool {
        matches!(self, DesiredStatus::Settle | DesiredStatus::Credit)
    }
}

impl fmt::Display for DesiredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Outcome of a change-status request as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    Successful,
    Unsuccessful,
    NotAllowed,
}

impl ChangeOutcome {
    pub fn from_wire(value: &str) -> Result<Self, GatewayError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SUCCESSFUL" => Ok(ChangeOutcome::Successful),
            "UNSUCCESSFUL" => Ok(ChangeOutcome::Unsuccessful),
            "NOT ALLOWED" | "NOT_ALLOWED" => Ok(ChangeOutcome::NotAllowed),
            other => Err(GatewayError::malformed(
                "change status",
                format!("unknown outcome '{}'", other),
            )),
        }
    }
}

impl fmt::Display for ChangeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeOutcome::Successful => "SUCCESSFUL",
            ChangeOutcome::Unsuccessful => "UNSUCCESSFUL",
            ChangeOutcome::NotAllowed => "NOT ALLOWED",
        })
    }
}

/// Decoded change-status response
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChangeResult {
    pub amount: Decimal,
    /// Desired status echoed back by the gateway
    pub desired_status: String,
    pub outcome: ChangeOutcome,
    pub message: String,
    pub order_number: String,
    pub transaction_id: String,
}

impl StatusChangeResult {
    pub fn is_successful(&self) -> bool {
        self.outcome == ChangeOutcome::Successful
    }
}

/// Status of a close-batch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchCloseStatus {
    Closed,
    Failed,
    NotAllowed,
}

impl BatchCloseStatus {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SUCCESSFUL" => Some(BatchCloseStatus::Closed),
            "UNSUCCESSFUL" => Some(BatchCloseStatus::Failed),
            "NOT ALLOWED" | "NOT_ALLOWED" => Some(BatchCloseStatus::NotAllowed),
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BatchCloseStatus::Closed => "Batch closed successfully",
            BatchCloseStatus::Failed => "Batch could not be closed",
            BatchCloseStatus::NotAllowed => "Closing the batch is not allowed",
        }
    }
}

impl fmt::Display for BatchCloseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Value of a single report field
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Text(String),
    Amount(Decimal),
    Date(NaiveDateTime),
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Text(text) => f.write_str(text),
            ReportValue::Amount(amount) => write!(f, "{:.2}", amount),
            ReportValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// One record of a downloaded report, fields in header order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRow {
    pub fields: Vec<(String, ReportValue)>,
}

impl ReportRow {
    pub fn get(&self, name: &str) -> Option<&ReportValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn amount(&self, name: &str) -> Option<Decimal> {
        match self.get(name) {
            Some(ReportValue::Amount(amount)) => Some(*amount),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDateTime> {
        match self.get(name) {
            Some(ReportValue::Date(date)) => Some(*date),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ReportValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SUCCESSFUL", ChangeOutcome::Successful)]
    #[case("UNSUCCESSFUL", ChangeOutcome::Unsuccessful)]
    #[case("NOT ALLOWED", ChangeOutcome::NotAllowed)]
    #[case("not_allowed", ChangeOutcome::NotAllowed)]
    #[case(" Successful ", ChangeOutcome::Successful)]
    fn test_change_outcome_from_wire(#[case] wire: &str, #[case] expected: ChangeOutcome) {
        assert_eq!(ChangeOutcome::from_wire(wire).unwrap(), expected);
    }

    #[test]
    fn test_change_outcome_rejects_unknown() {
        assert!(ChangeOutcome::from_wire("MAYBE").is_err());
    }

    #[rstest]
    #[case(DesiredStatus::Settle, true)]
    #[case(DesiredStatus::Credit, true)]
    #[case(DesiredStatus::Delete, false)]
    fn test_force_settlement_applies(#[case] desired: DesiredStatus, #[case] expected: bool) {
        assert_eq!(desired.accepts_force_settlement(), expected);
    }

    #[test]
    fn test_report_row_accessors() {
        let row = ReportRow {
            fields: vec![
                ("OrderNumber".to_string(), ReportValue::Text("5".to_string())),
                ("TransactionAmount".to_string(), ReportValue::Amount(Decimal::new(-12345, 2))),
            ],
        };
        assert_eq!(row.text("OrderNumber"), Some("5"));
        assert_eq!(row.amount("TransactionAmount"), Some(Decimal::new(-12345, 2)));
        assert_eq!(row.amount("OrderNumber"), None);
        assert_eq!(row.date("TransactionDate"), None);
    }
}
