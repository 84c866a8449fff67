//! Action status state machine with validated transitions.
//!
//! Pending -> Processing -> Success/Error
//! Pending -> Error (short-circuit before the remote call)

use shipchat_core::{Action, ActionStatus};

use crate::error::ActionError;

/// Validate that a status transition is allowed.
pub fn validate_transition(from: ActionStatus, to: ActionStatus) -> Result<(), ActionError> {
    let valid = matches!(
        (from, to),
        (ActionStatus::Pending, ActionStatus::Processing)
            | (ActionStatus::Pending, ActionStatus::Error)
            | (ActionStatus::Processing, ActionStatus::Success)
            | (ActionStatus::Processing, ActionStatus::Error)
    );

    if valid {
        Ok(())
    } else {
        Err(ActionError::InvalidTransition(from, to))
    }
}

/// Move `action` to `to`, or leave it untouched if the move is not allowed.
pub fn advance(action: &mut Action, to: ActionStatus) -> Result<(), ActionError> {
    validate_transition(action.status, to)?;
    action.status = to;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipchat_core::ActionType;

    // =====================================================================
    // Valid transitions
    // =====================================================================

    #[test]
    fn test_pending_to_processing() {
        assert!(validate_transition(ActionStatus::Pending, ActionStatus::Processing).is_ok());
    }

    #[test]
    fn test_pending_to_error() {
        assert!(validate_transition(ActionStatus::Pending, ActionStatus::Error).is_ok());
    }

    #[test]
    fn test_processing_to_terminal() {
        assert!(validate_transition(ActionStatus::Processing, ActionStatus::Success).is_ok());
        assert!(validate_transition(ActionStatus::Processing, ActionStatus::Error).is_ok());
    }

    // =====================================================================
    // Invalid transitions
    // =====================================================================

    #[test]
    fn test_pending_to_success_skips_processing() {
        let err = validate_transition(ActionStatus::Pending, ActionStatus::Success).unwrap_err();
        assert!(matches!(
            err,
            ActionError::InvalidTransition(ActionStatus::Pending, ActionStatus::Success)
        ));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [ActionStatus::Success, ActionStatus::Error] {
            for to in [
                ActionStatus::Pending,
                ActionStatus::Processing,
                ActionStatus::Success,
                ActionStatus::Error,
            ] {
                assert!(validate_transition(terminal, to).is_err(), "{terminal} -> {to}");
            }
        }
    }

    #[test]
    fn test_advance_updates_status() {
        let mut action = Action::new(ActionType::GetOrders);
        advance(&mut action, ActionStatus::Processing).unwrap();
        advance(&mut action, ActionStatus::Success).unwrap();
        assert_eq!(action.status, ActionStatus::Success);
    }

    #[test]
    fn test_advance_rejects_and_keeps_status() {
        let mut action = Action::new(ActionType::GetOrders);
        assert!(advance(&mut action, ActionStatus::Success).is_err());
        assert_eq!(action.status, ActionStatus::Pending);
    }
}
