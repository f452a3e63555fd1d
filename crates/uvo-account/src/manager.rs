//! Account manager
//!
//! Drives an AccountEntry through its lifecycle. Setup either completes
//! fully (every vehicle refreshed once and its coordinator running) or
//! fails leaving nothing behind; there is no partially-loaded account.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use uvo_api::{ApiError, SharedSession};
use uvo_coordinator::VehicleCoordinator;
use uvo_core::{ScanInterval, VehicleId};

use crate::entry::{AccountEntry, EntryState, SetupFailure, SetupFailureKind};
use crate::state_machine::InvalidTransition;

/// Account lifecycle errors
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("an entry for this account already exists ({unique_id})")]
    AlreadyExists { unique_id: String },

    /// Surfaced as an auth-required condition; fresh credentials are needed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Transient upstream condition; retry once the service recovers
    #[error("cannot reach the owners service: {0}")]
    ConnectionFailed(String),

    #[error("no vehicles found in account")]
    NoVehicles,

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("unexpected setup failure: {0}")]
    Unexpected(String),
}

impl SetupError {
    fn from_api(err: ApiError) -> Self {
        match err {
            ApiError::Authentication(msg) => SetupError::AuthenticationFailed(msg),
            other => SetupError::ConnectionFailed(other.to_string()),
        }
    }

    fn failure(&self) -> SetupFailure {
        let kind = match self {
            SetupError::AuthenticationFailed(_) => SetupFailureKind::AuthenticationFailed,
            SetupError::ConnectionFailed(_) => SetupFailureKind::ConnectionFailed,
            SetupError::NoVehicles => SetupFailureKind::NoVehicles,
            _ => SetupFailureKind::Unexpected,
        };
        SetupFailure {
            kind,
            detail: self.to_string(),
        }
    }
}

/// Everything a loaded account hands to its consumers
///
/// The handle carries the shared session and the running per-vehicle
/// coordinators; callers receive it from setup and give it back to
/// unload/reload. Coordinators are never published anywhere else.
pub struct AccountHandle {
    entry_id: String,
    session: SharedSession,
    coordinators: HashMap<VehicleId, Arc<VehicleCoordinator>>,
    tasks: Vec<JoinHandle<()>>,
}

impl AccountHandle {
    /// The entry this handle belongs to
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    /// The shared account session
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Coordinator for one vehicle
    pub fn coordinator(&self, vehicle_id: &VehicleId) -> Option<&Arc<VehicleCoordinator>> {
        self.coordinators.get(vehicle_id)
    }

    /// All coordinators on the account
    pub fn coordinators(&self) -> impl Iterator<Item = &Arc<VehicleCoordinator>> {
        self.coordinators.values()
    }

    /// Number of vehicles on the account
    pub fn vehicle_count(&self) -> usize {
        self.coordinators.len()
    }

    /// Stop every refresh loop and wait for the tasks to finish
    async fn stop(mut self) {
        for coordinator in self.coordinators.values() {
            coordinator.shutdown().await;
        }
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }
}

/// Manages account entries and their setup lifecycle
#[derive(Default)]
pub struct AccountManager {
    entries: DashMap<String, AccountEntry>,
}

impl AccountManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entry, rejecting a second entry for the same account
    pub fn add(&self, entry: AccountEntry) -> Result<String, SetupError> {
        if self
            .entries
            .iter()
            .any(|existing| existing.unique_id == entry.unique_id)
        {
            return Err(SetupError::AlreadyExists {
                unique_id: entry.unique_id.clone(),
            });
        }

        let entry_id = entry.entry_id.clone();
        info!(entry = %entry_id, title = %entry.title, "added account entry");
        self.entries.insert(entry_id.clone(), entry);
        Ok(entry_id)
    }

    /// Get a copy of an entry
    pub fn entry(&self, entry_id: &str) -> Option<AccountEntry> {
        self.entries.get(entry_id).map(|e| e.clone())
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace an entry's scan interval; takes effect on the next reload
    pub fn set_scan_interval(
        &self,
        entry_id: &str,
        scan_interval: ScanInterval,
    ) -> Result<(), SetupError> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| SetupError::EntryNotFound(entry_id.to_string()))?;
        entry.set_scan_interval(scan_interval);
        debug!(entry = %entry_id, minutes = scan_interval.minutes(), "scan interval updated");
        Ok(())
    }

    /// Replace an entry's credentials, e.g. for a re-auth attempt
    pub fn set_credentials(
        &self,
        entry_id: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<(), SetupError> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| SetupError::EntryNotFound(entry_id.to_string()))?;
        entry.set_credentials(username, password);
        Ok(())
    }

    /// Set up an account: authenticate, list vehicles, first-refresh each
    /// one, then start every coordinator
    ///
    /// Any failure aborts the whole setup, records the typed failure on the
    /// entry and leaves no coordinator behind.
    pub async fn setup(
        &self,
        entry_id: &str,
        session: SharedSession,
    ) -> Result<AccountHandle, SetupError> {
        let scan_interval = self
            .entries
            .get(entry_id)
            .map(|e| e.scan_interval)
            .ok_or_else(|| SetupError::EntryNotFound(entry_id.to_string()))?;

        self.try_transition(entry_id, EntryState::SetupInProgress)?;

        match self.try_setup(entry_id, scan_interval, session).await {
            Ok(handle) => {
                self.try_transition(entry_id, EntryState::Loaded)?;
                info!(
                    entry = %entry_id,
                    vehicles = handle.vehicle_count(),
                    "account setup complete"
                );
                Ok(handle)
            }
            Err(err) => {
                warn!(entry = %entry_id, error = %err, "account setup failed");
                self.record_failure(entry_id, &err);
                Err(err)
            }
        }
    }

    /// Unload a loaded account, stopping its coordinators
    pub async fn unload(&self, handle: AccountHandle) -> Result<(), SetupError> {
        let entry_id = handle.entry_id().to_string();
        self.try_transition(&entry_id, EntryState::UnloadInProgress)?;
        handle.stop().await;
        self.try_transition(&entry_id, EntryState::NotLoaded)?;
        info!(entry = %entry_id, "account unloaded");
        Ok(())
    }

    /// Unload and set up again, picking up changed options
    pub async fn reload(
        &self,
        handle: AccountHandle,
        session: SharedSession,
    ) -> Result<AccountHandle, SetupError> {
        let entry_id = handle.entry_id().to_string();
        self.unload(handle).await?;
        self.setup(&entry_id, session).await
    }

    async fn try_setup(
        &self,
        entry_id: &str,
        scan_interval: ScanInterval,
        session: SharedSession,
    ) -> Result<AccountHandle, SetupError> {
        debug!(entry = %entry_id, "logging in to owners account");
        session.authenticate().await.map_err(SetupError::from_api)?;

        debug!(entry = %entry_id, "fetching vehicle list");
        let vehicles = session
            .fetch_vehicles()
            .await
            .map_err(SetupError::from_api)?;
        if vehicles.is_empty() {
            return Err(SetupError::NoVehicles);
        }
        debug!(entry = %entry_id, "found {} vehicle(s)", vehicles.len());

        let mut coordinators = HashMap::new();
        for vehicle in vehicles {
            debug!(vehicle = %vehicle.id, model = %vehicle.model, "setting up vehicle");
            let vehicle_id = vehicle.id.clone();
            let coordinator =
                VehicleCoordinator::new(vehicle, Arc::clone(&session), scan_interval);
            coordinator
                .first_refresh()
                .await
                .map_err(SetupError::from_api)?;
            coordinators.insert(vehicle_id, coordinator);
        }

        let tasks = coordinators
            .values()
            .map(|coordinator| Arc::clone(coordinator).start())
            .collect();

        Ok(AccountHandle {
            entry_id: entry_id.to_string(),
            session,
            coordinators,
            tasks,
        })
    }

    fn try_transition(&self, entry_id: &str, state: EntryState) -> Result<(), SetupError> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| SetupError::EntryNotFound(entry_id.to_string()))?;
        entry.try_set_state(state)?;
        debug!(entry = %entry_id, ?state, "entry state changed");
        Ok(())
    }

    fn record_failure(&self, entry_id: &str, error: &SetupError) {
        let Some(mut entry) = self.entries.get_mut(entry_id) else {
            return;
        };
        if let Err(err) = entry.try_set_state(EntryState::SetupError) {
            warn!(entry = %entry_id, error = %err, "cannot record setup failure");
            return;
        }
        entry.record_failure(error.failure());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uvo_api::testing::{MockAccountSession, ScriptedRefresh};
    use uvo_core::VehicleInfo;

    fn two_vehicles() -> Vec<VehicleInfo> {
        vec![
            VehicleInfo::new("key-001".parse().unwrap(), "My EV6", "EV6"),
            VehicleInfo::new("key-002".parse().unwrap(), "Niro", "Niro EV"),
        ]
    }

    fn manager_with_entry() -> (AccountManager, String) {
        let manager = AccountManager::new();
        let entry_id = manager
            .add(AccountEntry::new(
                "Kia USA Account",
                "owner@example.com",
                "hunter2",
            ))
            .unwrap();
        (manager, entry_id)
    }

    #[tokio::test]
    async fn test_setup_success() {
        let (manager, entry_id) = manager_with_entry();
        let session = Arc::new(MockAccountSession::with_vehicles(two_vehicles()));

        let handle = manager
            .setup(&entry_id, Arc::clone(&session) as SharedSession)
            .await
            .unwrap();

        assert_eq!(handle.vehicle_count(), 2);
        assert!(manager.entry(&entry_id).unwrap().is_loaded());

        let vehicle_id: VehicleId = "key-001".parse().unwrap();
        let coordinator = handle.coordinator(&vehicle_id).unwrap();
        assert!(coordinator.last_update_success());
        assert!(coordinator.snapshot().is_some());

        manager.unload(handle).await.unwrap();
        assert_eq!(
            manager.entry(&entry_id).unwrap().state,
            EntryState::NotLoaded
        );
    }

    #[tokio::test]
    async fn test_setup_auth_failure_creates_no_coordinator() {
        let (manager, entry_id) = manager_with_entry();
        let session = Arc::new(MockAccountSession::with_vehicles(two_vehicles()));
        session.set_fail_authentication(true);

        let err = manager
            .setup(&entry_id, Arc::clone(&session) as SharedSession)
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::AuthenticationFailed(_)));
        // Setup never got as far as a vehicle refresh
        assert_eq!(session.refresh_call_count(), 0);

        let entry = manager.entry(&entry_id).unwrap();
        assert_eq!(entry.state, EntryState::SetupError);
        assert!(entry.needs_reauth());
    }

    #[tokio::test]
    async fn test_setup_fails_with_no_vehicles() {
        let (manager, entry_id) = manager_with_entry();
        let session = Arc::new(MockAccountSession::with_vehicles(Vec::new()));

        let err = manager
            .setup(&entry_id, session as SharedSession)
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::NoVehicles));
        let entry = manager.entry(&entry_id).unwrap();
        assert_eq!(entry.state, EntryState::SetupError);
        assert_eq!(
            entry.failure.unwrap().kind,
            SetupFailureKind::NoVehicles
        );
    }

    #[tokio::test]
    async fn test_setup_aborts_on_first_refresh_failure() {
        let (manager, entry_id) = manager_with_entry();
        let session = Arc::new(MockAccountSession::with_vehicles(two_vehicles()));
        session.push_refresh(ScriptedRefresh::UpstreamError);

        let err = manager
            .setup(&entry_id, Arc::clone(&session) as SharedSession)
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::ConnectionFailed(_)));
        assert_eq!(
            manager.entry(&entry_id).unwrap().state,
            EntryState::SetupError
        );
    }

    #[tokio::test]
    async fn test_reauth_after_auth_failure() {
        let (manager, entry_id) = manager_with_entry();
        let session = Arc::new(MockAccountSession::with_vehicles(two_vehicles()));
        session.set_fail_authentication(true);

        let err = manager
            .setup(&entry_id, Arc::clone(&session) as SharedSession)
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::AuthenticationFailed(_)));

        // User re-enters credentials, setup runs again from SetupError
        manager
            .set_credentials(&entry_id, "owner@example.com", "correct-horse")
            .unwrap();
        session.set_fail_authentication(false);

        let handle = manager
            .setup(&entry_id, Arc::clone(&session) as SharedSession)
            .await
            .unwrap();
        assert!(manager.entry(&entry_id).unwrap().is_loaded());

        manager.unload(handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_account_rejected() {
        let manager = AccountManager::new();
        manager
            .add(AccountEntry::new("First", "owner@example.com", "a"))
            .unwrap();

        let err = manager
            .add(AccountEntry::new("Second", "OWNER@example.com", "b"))
            .unwrap_err();
        assert!(matches!(err, SetupError::AlreadyExists { .. }));
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_setup_unknown_entry() {
        let manager = AccountManager::new();
        let session = Arc::new(MockAccountSession::new());

        let err = manager
            .setup("no-such-entry", session as SharedSession)
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::EntryNotFound(_)));
    }

    #[tokio::test]
    async fn test_reload_applies_new_scan_interval() {
        let (manager, entry_id) = manager_with_entry();
        let session = Arc::new(MockAccountSession::with_vehicles(two_vehicles()));

        let handle = manager
            .setup(&entry_id, Arc::clone(&session) as SharedSession)
            .await
            .unwrap();
        let before = handle.coordinators().next().unwrap().scan_interval();

        manager
            .set_scan_interval(&entry_id, ScanInterval::new(5).unwrap())
            .unwrap();
        let handle = manager
            .reload(handle, Arc::clone(&session) as SharedSession)
            .await
            .unwrap();

        let after = handle.coordinators().next().unwrap().scan_interval();
        assert_ne!(before, after);
        assert_eq!(after, std::time::Duration::from_secs(300));

        manager.unload(handle).await.unwrap();
    }
}
