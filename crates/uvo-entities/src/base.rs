//! Shared entity behavior

use std::sync::Arc;

use uvo_coordinator::VehicleCoordinator;

/// Behavior every vehicle-backed entity shares
///
/// Identity is derived from the vehicle, availability from the
/// coordinator's last refresh outcome.
pub trait VehicleEntity {
    /// Coordinator this entity reads from
    fn coordinator(&self) -> &Arc<VehicleCoordinator>;

    /// Stable key distinguishing this entity on the vehicle
    fn key(&self) -> &'static str;

    /// Human-readable entity label
    fn label(&self) -> &'static str;

    /// Display name
    fn name(&self) -> String {
        format!("{} {}", self.coordinator().vehicle().name, self.label())
    }

    /// Stable identifier
    fn unique_id(&self) -> String {
        format!("{}_{}", self.coordinator().id(), self.key())
    }

    /// Entities go unavailable whenever the last refresh failed
    fn available(&self) -> bool {
        self.coordinator().last_update_success()
    }
}
