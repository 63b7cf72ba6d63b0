//! Transaction record types
//!
//! This module defines the record created from an authorize response and kept
//! up to date by status queries, along with the gateway's code tables.

use super::error::GatewayError;
use super::status::{CurrentStatus, PendingStatus, StatusCode};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gateway-assigned transaction identifier
///
/// Not stable: the gateway assigns a new id when an authorized transaction is
/// settled.
pub type TransactionId = String;

/// Return code signalling a successful authorize request
pub const RETURN_CODE_SUCCESS: i32 = 1;

/// Approval flag reported by the authorize call (`szIsApproved`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ApprovalFlag {
    /// Empty on the wire
    #[default]
    NotApproved,
    /// `"0"` on the wire
    Declined,
    /// `"1"` on the wire
    Approved,
}

impl ApprovalFlag {
    pub fn from_wire(value: &str) -> Result<Self, GatewayError> {
        match value.trim() {
            "" => Ok(ApprovalFlag::NotApproved),
            "0" => Ok(ApprovalFlag::Declined),
            "1" => Ok(ApprovalFlag::Approved),
            other => Err(GatewayError::malformed(
                "authorize",
                format!("unknown approval flag '{}'", other),
            )),
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            ApprovalFlag::NotApproved => "",
            ApprovalFlag::Declined => "0",
            ApprovalFlag::Approved => "1",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApprovalFlag::NotApproved => "Not approved",
            ApprovalFlag::Declined => "Declined",
            ApprovalFlag::Approved => "Approved",
        }
    }
}

impl TryFrom<String> for ApprovalFlag {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ApprovalFlag::from_wire(&value)
    }
}

impl From<ApprovalFlag> for String {
    fn from(flag: ApprovalFlag) -> Self {
        flag.as_wire().to_string()
    }
}

/// Transaction created from an authorize response
///
/// Status fields start unset and are only changed by explicit status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Gateway transaction id (`szTransactionFileName`)
    pub transaction_id: TransactionId,

    /// Merchant order number
    pub order_number: String,

    /// Authorized amount in major units
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    pub auth_code: String,
    pub auth_decline_message: String,
    pub auth_response_code: String,
    pub approved: ApprovalFlag,
    pub avs_code: String,
    pub avs_message: String,
    pub cvv2_response_code: String,
    pub cvv2_response_message: String,
    pub cavv_response: String,

    /// Gateway return code, see [`describe_return_code`]
    pub return_code: i32,

    /// Whether the request went to the live endpoints
    pub is_live: bool,

    /// Unset until the first status query reports one
    pub current_status: Option<CurrentStatus>,
    pub pending_status: PendingStatus,

    /// Message from the most recent status query
    pub status_text: String,
    pub status_date: Option<NaiveDateTime>,

    pub created: DateTime<Utc>,
}

impl TransactionRecord {
    /// Whether the authorization went through
    ///
    /// Requires a success return code and both an auth code and an auth
    /// response code. The approval flag alone is not trusted because AVS
    /// filtering can flip it.
    pub fn is_approved(&self) -> bool {
        self.return_code == RETURN_CODE_SUCCESS
            && !self.auth_code.is_empty()
            && !self.auth_response_code.is_empty()
    }

    /// Current and pending status as a single code
    pub fn status(&self) -> StatusCode {
        StatusCode {
            current: self.current_status,
            pending: self.pending_status,
        }
    }

    pub fn return_code_description(&self) -> &'static str {
        describe_return_code(self.return_code)
    }

    /// Verification results as `code (description)`, in AVS, CVV2, CAVV order
    ///
    /// A code without a known description is shown bare. The CAVV column is
    /// never blank because an empty code means it was not validated.
    pub fn verification_summary(&self) -> [String; 3] {
        [
            coded(&self.avs_code, describe_avs_code(&self.avs_code)),
            coded(&self.cvv2_response_code, describe_cvv2_code(&self.cvv2_response_code)),
            coded(&self.cavv_response, describe_cavv_code(&self.cavv_response)),
        ]
    }
}

fn coded(code: &str, description: Option<&str>) -> String {
    match description {
        None => code.to_string(),
        Some(description) if code.is_empty() => description.to_string(),
        Some(description) => format!("{} ({})", code, description),
    }
}

/// Describe a gateway return code
pub fn describe_return_code(code: i32) -> &'static str {
    match code {
        1 => "Success",
        0 => "Comm failure",
        -1 => "Error in request",
        -35 => "Invalid credit card number",
        -37 => "Merchant processor unavailable",
        -39 => "Invalid Serial Number",
        -51 => "Zip code incorrect",
        -52 => "Ship to zip code incorrect",
        -53 => "Expiration month incorrect",
        -54 => "Expiration month or year incorrect",
        -55 => "Street address incorrect",
        -56 => "Ship to street address incorrect",
        -57 => "Transaction amount incorrect",
        -58 => "Merchant name incorrect",
        -59 => "Merchant address incorrect",
        -60 => "Merchant state incorrect",
        -61 => "Ship to state incorrect",
        -62 => "Order string incorrect",
        -64 => "No phone number",
        -65 => "No name",
        -66 => "No email",
        -67 => "No street address",
        -68 => "No city",
        -69 => "No state",
        -70 => "No zip code",
        -71 => "No order number",
        -72 => "No account number",
        -73 => "No month",
        -74 => "No year",
        -75 => "No serial number",
        -76 => "No transaction amount",
        -77 => "No order string",
        -78 => "No ship to phone",
        -79 => "Name incorrect",
        -80 => "Ship to name incorrect",
        -81 => "City incorrect",
        -82 => "State incorrect",
        -83 => "Ship to phone incorrect",
        -84 => "Duplicate order number",
        -91 => "CVV2 invalid or empty",
        -92 => "Approval code incorrect",
        -97 => "Fraud rejection",
        -98 => "Discount amount incorrect",
        -101 => "Invalid Authentication date",
        -102 => "Authentication data not allowed",
        -118 => "Invalid POST URL",
        -119 => "General Error",
        -120 => "Invalid record count",
        -123 => "Developer Serial Number Invalid",
        _ => "Unknown return code",
    }
}

/// Describe an address verification response code
pub fn describe_avs_code(code: &str) -> Option<&'static str> {
    let description = match code {
        "A" => "Address (Street) matches, ZIP does not",
        "B" => "Address information not provided for AVS check",
        "E" => "AVS error",
        "G" => "Non-U.S. Card Issuing Bank",
        "N" => "No Match on Address (Street) or ZIP",
        "P" => "AVS not applicable for this transaction",
        "R" => "Retry - System unavailable or timed out",
        "S" => "Service not supported by issuer",
        "U" => "Address information is unavailable",
        "W" => "Nine digit ZIP matches, Address (Street) does not",
        "X" => "Address (Street) and nine digit ZIP match",
        "Y" => "Address (Street) and five digit ZIP match",
        "Z" => "Five digit ZIP matches, Address (Street) does not",
        _ => return None,
    };
    Some(description)
}

/// Describe a CVV2 response code
pub fn describe_cvv2_code(code: &str) -> Option<&'static str> {
    let description = match code {
        "M" => "Match",
        "N" => "No Match",
        "P" => "Not Processed",
        "S" => "Should have been present",
        "U" => "Issuer unable to process request",
        _ => return None,
    };
    Some(description)
}

/// Describe a CAVV (3-D Secure) response code
pub fn describe_cavv_code(code: &str) -> Option<&'static str> {
    let description = match code {
        "" => "CAVV not validated",
        "0" => "CAVV not validated because erroneous data was submitted",
        "1" => "CAVV failed validation",
        "2" => "CAVV passed validation",
        "3" => "CAVV validation could not be performed; issuer attempt incomplete",
        "4" => "CAVV validation could not be performed; issuer system error",
        "5" | "6" => "Reserved for future use",
        "7" => "CAVV attempt - failed validation - issuer available (U.S.-issued card/non-U.S. acquirer)",
        "8" => "CAVV attempt - passed validation - issuer available (U.S.-issued card/non-U.S. acquirer)",
        "9" => "CAVV attempt - failed validation - issuer unavailable (U.S.-issued card/non-U.S. acquirer)",
        "A" => "CAVV attempt - passed validation - issuer unavailable (U.S.-issued card/non-U.S. acquirer)",
        "B" => "CAVV passed validation, information only, no liability shift",
        _ => return None,
    };
    Some(description)
}
