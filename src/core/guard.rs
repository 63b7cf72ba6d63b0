//! Transaction lifecycle guard
//!
//! A pure decision over a transaction's status pair: may the requested
//! operation be sent to the gateway? The guard never performs I/O. Passing it
//! does not mean the gateway will accept the change; the engine still checks
//! the gateway's outcome.
//!
//! | Operation      | Allowed when                                                    |
//! |----------------|-----------------------------------------------------------------|
//! | Settle         | Authorized, not pending settlement or submitted for settlement  |
//! | Refund         | Settled with nothing pending                                    |
//! | Partial refund | `0 < amount <= transaction amount`, then as for refund          |
//! | Delete         | Not Settled, Credited, Archived or Split Settled                |

use crate::types::{CurrentStatus, DesiredStatus, GatewayError, PendingStatus, StatusCode};
use rust_decimal::Decimal;

/// A status-changing operation requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Settle,
    Refund,
    /// Credit part of a settled transaction
    PartialRefund(Decimal),
    Delete,
}

/// Permission to send a change-status request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permit {
    pub desired: DesiredStatus,
    /// Amount to attach to the request (credits only)
    pub amount: Option<Decimal>,
}

/// Decide whether `operation` is allowed for a transaction in the given state
///
/// # Arguments
///
/// * `transaction_id` - Used only to label the error
/// * `current` - Current status, `None` when the gateway never reported one
/// * `pending` - Pending status
/// * `transaction_amount` - Authorized amount, the ceiling for refunds
/// * `operation` - Requested operation
///
/// # Returns
///
/// A [`Permit`] naming the desired gateway status and any amount to send
///
/// # Errors
///
/// Returns `TransactionState` with a descriptive reason when the operation is
/// not allowed.
pub fn check_transition(
    transaction_id: &str,
    current: Option<CurrentStatus>,
    pending: PendingStatus,
    transaction_amount: Decimal,
    operation: &Operation,
) -> Result<Permit, GatewayError> {
    match *operation {
        Operation::Settle => {
            let settleable = current == Some(CurrentStatus::Authorized)
                && !matches!(
                    pending,
                    PendingStatus::PendingSettlement | PendingStatus::SubmittedForSettlement
                );
            if !settleable {
                return Err(GatewayError::transaction_state(
                    transaction_id,
                    format!(
                        "settlement not allowed for {} transactions",
                        describe(current, pending)
                    ),
                ));
            }
            Ok(Permit {
                desired: DesiredStatus::Settle,
                amount: None,
            })
        }
        Operation::Refund => {
            if !is_refundable(current, pending) {
                return Err(GatewayError::transaction_state(
                    transaction_id,
                    "transaction must be settled to refund",
                ));
            }
            Ok(Permit {
                desired: DesiredStatus::Credit,
                amount: Some(transaction_amount),
            })
        }
        Operation::PartialRefund(amount) => {
            // Amount is checked before status
            if amount <= Decimal::ZERO || amount > transaction_amount {
                return Err(GatewayError::invalid_refund_amount(
                    transaction_id,
                    amount,
                    transaction_amount,
                ));
            }
            if !is_refundable(current, pending) {
                return Err(GatewayError::transaction_state(
                    transaction_id,
                    "status prevents partial refund",
                ));
            }
            Ok(Permit {
                desired: DesiredStatus::Credit,
                amount: Some(amount),
            })
        }
        Operation::Delete => {
            if matches!(
                current,
                Some(CurrentStatus::Settled)
                    | Some(CurrentStatus::Credited)
                    | Some(CurrentStatus::Archived)
                    | Some(CurrentStatus::SplitSettled)
            ) {
                return Err(GatewayError::transaction_state(
                    transaction_id,
                    format!(
                        "deletion not allowed for {} transactions",
                        describe(current, pending)
                    ),
                ));
            }
            Ok(Permit {
                desired: DesiredStatus::Delete,
                amount: None,
            })
        }
    }
}

fn is_refundable(current: Option<CurrentStatus>, pending: PendingStatus) -> bool {
    current == Some(CurrentStatus::Settled) && pending == PendingStatus::None
}

fn describe(current: Option<CurrentStatus>, pending: PendingStatus) -> String {
    StatusCode { current, pending }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALL_CURRENT: [Option<CurrentStatus>; 9] = [
        None,
        Some(CurrentStatus::Authorized),
        Some(CurrentStatus::Denied),
        Some(CurrentStatus::Settled),
        Some(CurrentStatus::Credited),
        Some(CurrentStatus::Deleted),
        Some(CurrentStatus::Archived),
        Some(CurrentStatus::PreAuthorized),
        Some(CurrentStatus::SplitSettled),
    ];

    const ALL_PENDING: [PendingStatus; 8] = [
        PendingStatus::None,
        PendingStatus::PendingCredit,
        PendingStatus::PendingSettlement,
        PendingStatus::PendingDelete,
        PendingStatus::PendingAuthorization,
        PendingStatus::PendingManualSettlement,
        PendingStatus::PendingRecurring,
        PendingStatus::SubmittedForSettlement,
    ];

    fn amount(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn reason(error: GatewayError) -> String {
        match error {
            GatewayError::TransactionState { reason, .. } => reason,
            other => panic!("expected TransactionState, got {:?}", other),
        }
    }

    #[rstest]
    #[case::authorized(Some(CurrentStatus::Authorized), PendingStatus::None, true)]
    #[case::authorized_pending_credit(Some(CurrentStatus::Authorized), PendingStatus::PendingCredit, true)]
    #[case::pending_settlement(Some(CurrentStatus::Authorized), PendingStatus::PendingSettlement, false)]
    #[case::submitted(Some(CurrentStatus::Authorized), PendingStatus::SubmittedForSettlement, false)]
    #[case::already_settled(Some(CurrentStatus::Settled), PendingStatus::None, false)]
    #[case::unset(None, PendingStatus::None, false)]
    #[case::pre_authorized(Some(CurrentStatus::PreAuthorized), PendingStatus::None, false)]
    fn test_settle(
        #[case] current: Option<CurrentStatus>,
        #[case] pending: PendingStatus,
        #[case] allowed: bool,
    ) {
        let result = check_transition("T1", current, pending, amount("10.00"), &Operation::Settle);
        match result {
            Ok(permit) => {
                assert!(allowed);
                assert_eq!(permit, Permit { desired: DesiredStatus::Settle, amount: None });
            }
            Err(error) => {
                assert!(!allowed);
                assert!(reason(error).starts_with("settlement not allowed for"));
            }
        }
    }

    #[test]
    fn test_settle_rejection_names_status() {
        let error = check_transition(
            "T1",
            Some(CurrentStatus::Authorized),
            PendingStatus::PendingSettlement,
            amount("10.00"),
            &Operation::Settle,
        )
        .unwrap_err();
        assert_eq!(
            reason(error),
            "settlement not allowed for Authorized, Pending Settlement transactions"
        );
    }

    #[test]
    fn test_refund_allowed_only_for_settled_with_nothing_pending() {
        for current in ALL_CURRENT {
            for pending in ALL_PENDING {
                let result = check_transition("T1", current, pending, amount("25.00"), &Operation::Refund);
                if current == Some(CurrentStatus::Settled) && pending == PendingStatus::None {
                    assert_eq!(
                        result,
                        Ok(Permit { desired: DesiredStatus::Credit, amount: Some(amount("25.00")) })
                    );
                } else {
                    let error = result.unwrap_err();
                    assert_eq!(reason(error), "transaction must be settled to refund");
                }
            }
        }
    }

    #[test]
    fn test_partial_refund_over_amount_rejected_for_every_status() {
        for current in ALL_CURRENT {
            for pending in ALL_PENDING {
                let error = check_transition(
                    "T1",
                    current,
                    pending,
                    amount("25.00"),
                    &Operation::PartialRefund(amount("25.01")),
                )
                .unwrap_err();
                assert!(reason(error)
                    .starts_with("amount must be supplied and not exceed transaction amount"));
            }
        }
    }

    #[rstest]
    #[case::zero("0")]
    #[case::negative("-1.00")]
    fn test_partial_refund_non_positive_amount(#[case] requested: &str) {
        let error = check_transition(
            "T1",
            Some(CurrentStatus::Settled),
            PendingStatus::None,
            amount("25.00"),
            &Operation::PartialRefund(amount(requested)),
        )
        .unwrap_err();
        assert!(reason(error).starts_with("amount must be supplied"));
    }

    #[rstest]
    #[case::part("10.00")]
    #[case::whole("25.00")]
    fn test_partial_refund_allowed(#[case] requested: &str) {
        let permit = check_transition(
            "T1",
            Some(CurrentStatus::Settled),
            PendingStatus::None,
            amount("25.00"),
            &Operation::PartialRefund(amount(requested)),
        )
        .unwrap();
        assert_eq!(permit.desired, DesiredStatus::Credit);
        assert_eq!(permit.amount, Some(amount(requested)));
    }

    #[test]
    fn test_partial_refund_status_rejection() {
        let error = check_transition(
            "T1",
            Some(CurrentStatus::Settled),
            PendingStatus::PendingCredit,
            amount("25.00"),
            &Operation::PartialRefund(amount("5.00")),
        )
        .unwrap_err();
        assert_eq!(reason(error), "status prevents partial refund");
    }

    #[rstest]
    #[case::unset(None, true)]
    #[case::authorized(Some(CurrentStatus::Authorized), true)]
    #[case::denied(Some(CurrentStatus::Denied), true)]
    #[case::deleted(Some(CurrentStatus::Deleted), true)]
    #[case::pre_authorized(Some(CurrentStatus::PreAuthorized), true)]
    #[case::settled(Some(CurrentStatus::Settled), false)]
    #[case::credited(Some(CurrentStatus::Credited), false)]
    #[case::archived(Some(CurrentStatus::Archived), false)]
    #[case::split_settled(Some(CurrentStatus::SplitSettled), false)]
    fn test_delete(#[case] current: Option<CurrentStatus>, #[case] allowed: bool) {
        let result = check_transition("T1", current, PendingStatus::None, amount("1.00"), &Operation::Delete);
        match result {
            Ok(permit) => {
                assert!(allowed);
                assert_eq!(permit.desired, DesiredStatus::Delete);
            }
            Err(error) => {
                assert!(!allowed);
                assert!(reason(error).starts_with("deletion not allowed for"));
            }
        }
    }
}
