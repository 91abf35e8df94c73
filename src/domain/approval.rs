//! Pending approval state machine.
//!
//! The UI submits an approve (or revoke) transaction and shows an in-flight
//! state until the on-chain allowance reaches the submitted target. The
//! phase is a pure function of the two inputs and is never set directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current on-chain allowance for the tracked token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllowanceState {
    /// Not fetched yet, or the source is unavailable.
    NotReady,
    Ready(Decimal),
}

/// UI-facing phase of a locally submitted approve/revoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApprovalPhase {
    #[default]
    NA,
    Revoking,
    Revoked,
    Approving,
    Approved,
}

impl ApprovalPhase {
    /// In-flight phases, shown with a progress indicator.
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Revoking | Self::Approving)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NA => "na",
            Self::Revoking => "revoking",
            Self::Revoked => "revoked",
            Self::Approving => "approving",
            Self::Approved => "approved",
        }
    }
}

impl std::fmt::Display for ApprovalPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the phase from a pending target and the current allowance.
///
/// Equality is numeric (`1.0 == 1.00`), matching how the chain value and
/// the submitted value may differ in scale.
pub fn reconcile(pending_target: Option<Decimal>, allowance: AllowanceState) -> ApprovalPhase {
    let (Some(target), AllowanceState::Ready(amount)) = (pending_target, allowance) else {
        return ApprovalPhase::NA;
    };

    let confirmed = amount == target;

    match (target.is_zero(), confirmed) {
        (true, true) => ApprovalPhase::Revoked,
        (true, false) => ApprovalPhase::Revoking,
        (false, true) => ApprovalPhase::Approved,
        (false, false) => ApprovalPhase::Approving,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_revoke_confirmed() {
        assert_eq!(
            reconcile(Some(dec!(0)), AllowanceState::Ready(dec!(0))),
            ApprovalPhase::Revoked
        );
    }

    #[test]
    fn test_revoke_in_flight() {
        assert_eq!(
            reconcile(Some(dec!(0)), AllowanceState::Ready(dec!(5))),
            ApprovalPhase::Revoking
        );
    }

    #[test]
    fn test_approve_confirmed() {
        assert_eq!(
            reconcile(Some(dec!(10)), AllowanceState::Ready(dec!(10))),
            ApprovalPhase::Approved
        );
    }

    #[test]
    fn test_approve_in_flight() {
        assert_eq!(
            reconcile(Some(dec!(10)), AllowanceState::Ready(dec!(3))),
            ApprovalPhase::Approving
        );
    }

    #[test]
    fn test_not_ready_is_na() {
        assert_eq!(
            reconcile(Some(dec!(10)), AllowanceState::NotReady),
            ApprovalPhase::NA
        );
        assert_eq!(
            reconcile(Some(dec!(0)), AllowanceState::NotReady),
            ApprovalPhase::NA
        );
    }

    #[test]
    fn test_no_pending_is_na() {
        assert_eq!(
            reconcile(None, AllowanceState::Ready(dec!(10))),
            ApprovalPhase::NA
        );
    }

    #[test]
    fn test_scale_does_not_matter() {
        assert_eq!(
            reconcile(Some(dec!(10.000)), AllowanceState::Ready(dec!(10))),
            ApprovalPhase::Approved
        );
    }

    #[test]
    fn test_loading_phases() {
        assert!(ApprovalPhase::Revoking.is_loading());
        assert!(ApprovalPhase::Approving.is_loading());
        assert!(!ApprovalPhase::Approved.is_loading());
        assert!(!ApprovalPhase::NA.is_loading());
    }
}
