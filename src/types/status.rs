//! Transaction status types
//!
//! The gateway reports a transaction's state as a two-character code. The first
//! character is the current status and the second the pending status. The two
//! axes are independent: a transaction may be Authorized and Pending Settlement
//! at the same time.

use super::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current status of a transaction at the gateway
///
/// A code of `0` means the gateway has not reported a current status, which is
/// modelled as `Option<CurrentStatus>` rather than a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CurrentStatus {
    Authorized,
    Denied,
    Settled,
    Credited,
    Deleted,
    Archived,
    PreAuthorized,
    SplitSettled,
}

impl CurrentStatus {
    /// Map a status digit to a current status
    ///
    /// Returns `Ok(None)` for `0` (unset) and an error for digits outside the
    /// enumeration.
    pub fn from_code(code: u8) -> Result<Option<Self>, GatewayError> {
        let status = match code {
            0 => return Ok(None),
            1 => CurrentStatus::Authorized,
            2 => CurrentStatus::Denied,
            3 => CurrentStatus::Settled,
            4 => CurrentStatus::Credited,
            5 => CurrentStatus::Deleted,
            6 => CurrentStatus::Archived,
            7 => CurrentStatus::PreAuthorized,
            8 => CurrentStatus::SplitSettled,
            _ => return Err(GatewayError::invalid_status_code("current", code)),
        };
        Ok(Some(status))
    }

    pub fn code(self) -> u8 {
        match self {
            CurrentStatus::Authorized => 1,
            CurrentStatus::Denied => 2,
            CurrentStatus::Settled => 3,
            CurrentStatus::Credited => 4,
            CurrentStatus::Deleted => 5,
            CurrentStatus::Archived => 6,
            CurrentStatus::PreAuthorized => 7,
            CurrentStatus::SplitSettled => 8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CurrentStatus::Authorized => "Authorized",
            CurrentStatus::Denied => "Denied",
            CurrentStatus::Settled => "Settled",
            CurrentStatus::Credited => "Credited",
            CurrentStatus::Deleted => "Deleted",
            CurrentStatus::Archived => "Archived",
            CurrentStatus::PreAuthorized => "Pre-Authorized",
            CurrentStatus::SplitSettled => "Split Settled",
        }
    }
}

impl TryFrom<u8> for CurrentStatus {
    type Error = GatewayError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        CurrentStatus::from_code(code)?
            .ok_or_else(|| GatewayError::invalid_status_code("current", code))
    }
}

impl From<CurrentStatus> for u8 {
    fn from(status: CurrentStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for CurrentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pending status of a transaction at the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PendingStatus {
    #[default]
    None,
    PendingCredit,
    PendingSettlement,
    PendingDelete,
    PendingAuthorization,
    PendingManualSettlement,
    PendingRecurring,
    SubmittedForSettlement,
}

impl PendingStatus {
    pub fn code(self) -> u8 {
        match self {
            PendingStatus::None => 0,
            PendingStatus::PendingCredit => 1,
            PendingStatus::PendingSettlement => 2,
            PendingStatus::PendingDelete => 3,
            PendingStatus::PendingAuthorization => 4,
            PendingStatus::PendingManualSettlement => 5,
            PendingStatus::PendingRecurring => 6,
            PendingStatus::SubmittedForSettlement => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PendingStatus::None => "None",
            PendingStatus::PendingCredit => "Pending Credit",
            PendingStatus::PendingSettlement => "Pending Settlement",
            PendingStatus::PendingDelete => "Pending Delete",
            PendingStatus::PendingAuthorization => "Pending Authorization",
            PendingStatus::PendingManualSettlement => "Pending Manual Settlement",
            PendingStatus::PendingRecurring => "Pending Recurring",
            PendingStatus::SubmittedForSettlement => "Submitted for Settlement",
        }
    }
}

impl TryFrom<u8> for PendingStatus {
    type Error = GatewayError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let status = match code {
            0 => PendingStatus::None,
            1 => PendingStatus::PendingCredit,
            2 => PendingStatus::PendingSettlement,
            3 => PendingStatus::PendingDelete,
            4 => PendingStatus::PendingAuthorization,
            5 => PendingStatus::PendingManualSettlement,
            6 => PendingStatus::PendingRecurring,
            7 => PendingStatus::SubmittedForSettlement,
            _ => return Err(GatewayError::invalid_status_code("pending", code)),
        };
        Ok(status)
    }
}

impl From<PendingStatus> for u8 {
    fn from(status: PendingStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoded two-character status code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCode {
    pub current: Option<CurrentStatus>,
    pub pending: PendingStatus,
}

impl StatusCode {
    /// Parse the gateway's two-digit status code (e.g. `"12"`)
    ///
    /// # Errors
    ///
    /// Returns `MalformedResponse` if the code is not exactly two digits or a
    /// digit falls outside its enumeration.
    pub fn parse(code: &str) -> Result<Self, GatewayError> {
        let digits: Vec<u8> = code
            .trim()
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(|| GatewayError::malformed("status", format!("non-numeric status code '{}'", code)))?;

        match digits.as_slice() {
            [current, pending] => Ok(StatusCode {
                current: CurrentStatus::from_code(*current)?,
                pending: PendingStatus::try_from(*pending)?,
            }),
            _ => Err(GatewayError::malformed(
                "status",
                format!("status code '{}' must have two digits", code),
            )),
        }
    }

    /// Human-readable detail, e.g. `"Authorized, Pending Settlement"`
    ///
    /// Unset axes are omitted, so a fresh `00` code yields an empty string.
    pub fn detail(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if let Some(current) = self.current {
            parts.push(current.label());
        }
        if self.pending != PendingStatus::None {
            parts.push(self.pending.label());
        }
        parts.join(", ")
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = self.detail();
        if detail.is_empty() {
            f.write_str("unknown status")
        } else {
            f.write_str(&detail)
        }
    }
}
