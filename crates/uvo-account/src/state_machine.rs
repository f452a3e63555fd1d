//! Account entry state machine
//!
//! Enforces valid transitions for the AccountEntry lifecycle:
//!
//! ```text
//! NotLoaded → SetupInProgress → Loaded
//!                            ↘ SetupError → SetupInProgress (retry)
//!
//! Loaded/SetupError → UnloadInProgress → NotLoaded
//!                                      ↘ FailedUnload (terminal)
//! ```

use thiserror::Error;

use crate::entry::EntryState;

/// Error when an invalid state transition is attempted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid state transition from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: EntryState,
    pub to: EntryState,
}

impl EntryState {
    /// Attempt a transition to a new state.
    ///
    /// Returns the new state if valid, or an error naming the rejected
    /// transition.
    pub fn try_transition(self, to: EntryState) -> Result<EntryState, InvalidTransition> {
        use EntryState::*;

        let valid = matches!(
            (self, to),
            (NotLoaded, SetupInProgress)
                | (SetupInProgress, Loaded)
                | (SetupInProgress, SetupError)
                | (SetupError, SetupInProgress)
                | (SetupError, UnloadInProgress)
                | (Loaded, UnloadInProgress)
                | (UnloadInProgress, NotLoaded)
                | (UnloadInProgress, FailedUnload)
        );

        if valid {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition_to(self, to: EntryState) -> bool {
        self.try_transition(to).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EntryState::*;

    #[test]
    fn test_setup_success_path() {
        // NotLoaded -> SetupInProgress -> Loaded -> UnloadInProgress -> NotLoaded
        let state = NotLoaded;
        let state = state.try_transition(SetupInProgress).unwrap();
        let state = state.try_transition(Loaded).unwrap();
        let state = state.try_transition(UnloadInProgress).unwrap();
        let state = state.try_transition(NotLoaded).unwrap();
        assert_eq!(state, NotLoaded);
    }

    #[test]
    fn test_setup_error_retry_path() {
        // NotLoaded -> SetupInProgress -> SetupError -> SetupInProgress -> Loaded
        let state = NotLoaded;
        let state = state.try_transition(SetupInProgress).unwrap();
        let state = state.try_transition(SetupError).unwrap();
        let state = state.try_transition(SetupInProgress).unwrap();
        let state = state.try_transition(Loaded).unwrap();
        assert_eq!(state, Loaded);
    }

    #[test]
    fn test_unload_from_setup_error() {
        let state = SetupError;
        let state = state.try_transition(UnloadInProgress).unwrap();
        assert!(state.can_transition_to(NotLoaded));
    }

    #[test]
    fn test_cannot_jump_to_loaded() {
        let err = NotLoaded.try_transition(Loaded).unwrap_err();
        assert_eq!(err.from, NotLoaded);
        assert_eq!(err.to, Loaded);
    }

    #[test]
    fn test_loaded_cannot_resetup_without_unload() {
        assert!(!Loaded.can_transition_to(SetupInProgress));
        assert!(!Loaded.can_transition_to(NotLoaded));
    }

    #[test]
    fn test_setup_in_progress_cannot_abort_to_not_loaded() {
        assert!(!SetupInProgress.can_transition_to(NotLoaded));
    }

    #[test]
    fn test_failed_unload_is_terminal() {
        assert!(!FailedUnload.can_transition_to(NotLoaded));
        assert!(!FailedUnload.can_transition_to(SetupInProgress));
        assert!(!FailedUnload.can_transition_to(Loaded));
        assert!(!FailedUnload.can_transition_to(SetupError));
        assert!(!FailedUnload.can_transition_to(UnloadInProgress));
    }

    #[test]
    fn test_error_display() {
        let err = NotLoaded.try_transition(Loaded).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("NotLoaded"));
        assert!(msg.contains("Loaded"));
    }
}
