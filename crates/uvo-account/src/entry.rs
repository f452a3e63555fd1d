//! Account entry types

use chrono::{DateTime, Utc};
use std::fmt;

use uvo_core::ScanInterval;

use crate::state_machine::InvalidTransition;

/// Account entry lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryState {
    /// Initial state, not yet set up
    #[default]
    NotLoaded,
    /// Setup running (non-recoverable)
    SetupInProgress,
    /// Successfully set up
    Loaded,
    /// Setup failed; retryable after the cause is addressed
    SetupError,
    /// Currently unloading (non-recoverable)
    UnloadInProgress,
    /// Unload failed (terminal)
    FailedUnload,
}

impl EntryState {
    /// Check if the entry can be unloaded or re-set-up from this state
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EntryState::NotLoaded | EntryState::Loaded | EntryState::SetupError
        )
    }
}

/// Why setup failed, in terms the caller can act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupFailureKind {
    /// Credentials were rejected; the user has to re-enter them
    AuthenticationFailed,
    /// The owners service could not be reached or answered with an error
    ConnectionFailed,
    /// The account holds no vehicles
    NoVehicles,
    /// Anything else, caught at the setup boundary
    Unexpected,
}

/// Recorded setup failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFailure {
    pub kind: SetupFailureKind,
    pub detail: String,
}

/// One configured owners account
#[derive(Clone)]
pub struct AccountEntry {
    /// Unique identifier (ULID)
    pub entry_id: String,

    /// Human-readable display name
    pub title: String,

    /// Owners-account username
    pub username: String,

    /// Owners-account password
    pub password: String,

    /// Polling interval option
    pub scan_interval: ScanInterval,

    /// Stable per-account key for duplicate prevention
    pub unique_id: String,

    /// Current lifecycle state
    pub state: EntryState,

    /// Last recorded setup failure, cleared on any non-error transition
    pub failure: Option<SetupFailure>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl AccountEntry {
    /// Create a new entry with the default scan interval
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let username = username.into();
        let unique_id = format!("kia_usa_{}", username.to_lowercase());
        let now = Utc::now();
        Self {
            entry_id: ulid::Ulid::new().to_string(),
            title: title.into(),
            username,
            password: password.into(),
            scan_interval: ScanInterval::default(),
            unique_id,
            state: EntryState::NotLoaded,
            failure: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Set the scan interval option
    pub fn with_scan_interval(mut self, scan_interval: ScanInterval) -> Self {
        self.scan_interval = scan_interval;
        self
    }

    /// Check if the entry is loaded
    pub fn is_loaded(&self) -> bool {
        self.state == EntryState::Loaded
    }

    /// True when the last failure calls for fresh credentials
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self.failure,
            Some(SetupFailure {
                kind: SetupFailureKind::AuthenticationFailed,
                ..
            })
        )
    }

    /// Attempt a validated state transition
    ///
    /// Entering any state other than SetupError clears the recorded
    /// failure.
    pub fn try_set_state(&mut self, new_state: EntryState) -> Result<(), InvalidTransition> {
        self.state.try_transition(new_state)?;
        self.state = new_state;
        if new_state != EntryState::SetupError {
            self.failure = None;
        }
        self.modified_at = Utc::now();
        Ok(())
    }

    /// Record why the entry landed in SetupError
    pub fn record_failure(&mut self, failure: SetupFailure) {
        self.failure = Some(failure);
        self.modified_at = Utc::now();
    }

    /// Replace the scan interval option
    pub fn set_scan_interval(&mut self, scan_interval: ScanInterval) {
        self.scan_interval = scan_interval;
        self.modified_at = Utc::now();
    }

    /// Replace the stored credentials, e.g. after a failed authentication
    pub fn set_credentials(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.username = username.into();
        self.password = password.into();
        self.modified_at = Utc::now();
    }
}

impl fmt::Debug for AccountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountEntry")
            .field("entry_id", &self.entry_id)
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("scan_interval", &self.scan_interval)
            .field("unique_id", &self.unique_id)
            .field("state", &self.state)
            .field("failure", &self.failure)
            .finish()
    }
}
