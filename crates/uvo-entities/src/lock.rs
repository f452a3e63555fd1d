//! Door lock adapter

use std::sync::Arc;
use tracing::debug;

use uvo_api::{ApiResult, SharedSession};
use uvo_coordinator::{ExpectedState, VehicleCoordinator};

use crate::base::VehicleEntity;

/// Remote door lock for one vehicle
pub struct DoorLock {
    coordinator: Arc<VehicleCoordinator>,
    session: SharedSession,
}

impl DoorLock {
    pub fn new(coordinator: Arc<VehicleCoordinator>, session: SharedSession) -> Self {
        Self {
            coordinator,
            session,
        }
    }

    /// Lock state, reporting an unconfirmed lock/unlock optimistically
    pub fn is_locked(&self) -> Option<bool> {
        self.coordinator.doors_locked()
    }

    /// Remotely lock the doors and request a converging refresh
    pub async fn lock(&self) -> ApiResult<()> {
        debug!(vehicle = %self.coordinator.id(), "lock requested");
        self.session.lock_doors(self.coordinator.id()).await?;
        self.coordinator
            .register_pending_command(ExpectedState::DoorsLocked);
        self.coordinator.request_refresh().await;
        Ok(())
    }

    /// Remotely unlock the doors and request a converging refresh
    pub async fn unlock(&self) -> ApiResult<()> {
        debug!(vehicle = %self.coordinator.id(), "unlock requested");
        self.session.unlock_doors(self.coordinator.id()).await?;
        self.coordinator
            .register_pending_command(ExpectedState::DoorsUnlocked);
        self.coordinator.request_refresh().await;
        Ok(())
    }
}

impl VehicleEntity for DoorLock {
    fn coordinator(&self) -> &Arc<VehicleCoordinator> {
        &self.coordinator
    }

    fn key(&self) -> &'static str {
        "door_lock"
    }

    fn label(&self) -> &'static str {
        "Door Lock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uvo_api::testing::{MockAccountSession, RecordedCommand};
    use uvo_core::{ScanInterval, VehicleInfo, VehicleSnapshot};

    fn setup(snapshot: VehicleSnapshot) -> (Arc<MockAccountSession>, Arc<VehicleCoordinator>, DoorLock) {
        let session = Arc::new(MockAccountSession::new());
        session.set_fallback_snapshot(snapshot);
        let coordinator = VehicleCoordinator::new(
            VehicleInfo::new("key-001".parse().unwrap(), "My EV6", "EV6"),
            Arc::clone(&session) as SharedSession,
            ScanInterval::new(30).unwrap(),
        );
        let lock = DoorLock::new(
            Arc::clone(&coordinator),
            Arc::clone(&session) as SharedSession,
        );
        (session, coordinator, lock)
    }

    #[tokio::test]
    async fn test_unknown_before_first_snapshot() {
        let (_session, _coordinator, lock) = setup(VehicleSnapshot::default());
        assert_eq!(lock.is_locked(), None);
    }

    #[tokio::test]
    async fn test_lock_command_and_optimistic_state() {
        let (session, coordinator, lock) = setup(VehicleSnapshot {
            doors_locked: Some(false),
            ..Default::default()
        });
        coordinator.first_refresh().await.unwrap();
        assert_eq!(lock.is_locked(), Some(false));

        lock.lock().await.unwrap();

        assert_eq!(
            session.commands(),
            vec![RecordedCommand::LockDoors("key-001".parse().unwrap())]
        );
        // Reported locked before any refresh confirms it
        assert_eq!(lock.is_locked(), Some(true));
    }

    #[tokio::test]
    async fn test_unlock_command() {
        let (session, coordinator, lock) = setup(VehicleSnapshot {
            doors_locked: Some(true),
            ..Default::default()
        });
        coordinator.first_refresh().await.unwrap();

        lock.unlock().await.unwrap();

        assert_eq!(
            session.commands(),
            vec![RecordedCommand::UnlockDoors("key-001".parse().unwrap())]
        );
        assert_eq!(lock.is_locked(), Some(false));
    }

    #[tokio::test]
    async fn test_entity_identity() {
        let (_session, _coordinator, lock) = setup(VehicleSnapshot::default());
        assert_eq!(lock.name(), "My EV6 Door Lock");
        assert_eq!(lock.unique_id(), "key-001_door_lock");
    }
}
