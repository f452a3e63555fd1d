//! Thermostat adapter

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use uvo_api::{ApiResult, SharedSession};
use uvo_coordinator::{ExpectedState, VehicleCoordinator};
use uvo_core::{
    clamp_target_temperature, ClimateSettings, SeatSettings, DEFAULT_TARGET_TEMPERATURE_F,
    TEMPERATURE_MAX_F, TEMPERATURE_MIN_F,
};

use crate::base::VehicleEntity;

/// HVAC mode exposed by the thermostat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    Off,
    HeatCool,
}

/// Seat positions with adjustable comfort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatPosition {
    Driver,
    Passenger,
    LeftRear,
    RightRear,
}

/// Driver intent for the next climate start
///
/// Process-local only: set before issuing a command, never validated
/// against the vehicle's installed options, lost on restart.
#[derive(Debug, Clone, Copy, Default)]
struct DesiredClimate {
    defrost: bool,
    heating_accessories: bool,
    driver_seat: Option<SeatSettings>,
    passenger_seat: Option<SeatSettings>,
    left_rear_seat: Option<SeatSettings>,
    right_rear_seat: Option<SeatSettings>,
}

/// Remote climate control for one vehicle
///
/// The mode is a straight projection of the coordinator's HVAC flag:
/// HeatCool while the vehicle reports (or a pending command expects) the
/// system on, Off otherwise. The vehicle does not expose separate heat and
/// cool modes remotely.
pub struct Thermostat {
    coordinator: Arc<VehicleCoordinator>,
    session: SharedSession,
    target_temperature_f: AtomicI32,
    desired: Mutex<DesiredClimate>,
}

impl Thermostat {
    pub fn new(coordinator: Arc<VehicleCoordinator>, session: SharedSession) -> Self {
        let target = coordinator
            .target_temperature_f()
            .unwrap_or(DEFAULT_TARGET_TEMPERATURE_F);
        Self {
            coordinator,
            session,
            target_temperature_f: AtomicI32::new(clamp_target_temperature(target)),
            desired: Mutex::default(),
        }
    }

    /// Current HVAC mode, None before the first snapshot
    pub fn hvac_mode(&self) -> Option<HvacMode> {
        self.coordinator.hvac_on().map(|on| {
            if on {
                HvacMode::HeatCool
            } else {
                HvacMode::Off
            }
        })
    }

    /// Held cabin target, applied on the next climate start
    pub fn target_temperature_f(&self) -> i32 {
        self.target_temperature_f.load(Ordering::SeqCst)
    }

    /// Set the cabin target, clamped to the accepted band
    ///
    /// No command is issued; the value rides along with the next start.
    pub fn set_target_temperature_f(&self, value: i32) {
        let clamped = clamp_target_temperature(value);
        debug!(vehicle = %self.coordinator.id(), target = clamped, "target temperature set");
        self.target_temperature_f.store(clamped, Ordering::SeqCst);
    }

    pub fn min_temperature_f(&self) -> i32 {
        TEMPERATURE_MIN_F
    }

    pub fn max_temperature_f(&self) -> i32 {
        TEMPERATURE_MAX_F
    }

    /// Hold the defroster flag for the next climate start
    pub async fn set_desired_defrost(&self, on: bool) {
        self.desired.lock().await.defrost = on;
    }

    /// Hold the heated-accessories flag for the next climate start
    pub async fn set_desired_heating_accessories(&self, on: bool) {
        self.desired.lock().await.heating_accessories = on;
    }

    /// Hold a seat comfort level for the next climate start
    pub async fn set_seat_comfort(&self, seat: SeatPosition, setting: Option<SeatSettings>) {
        let mut desired = self.desired.lock().await;
        match seat {
            SeatPosition::Driver => desired.driver_seat = setting,
            SeatPosition::Passenger => desired.passenger_seat = setting,
            SeatPosition::LeftRear => desired.left_rear_seat = setting,
            SeatPosition::RightRear => desired.right_rear_seat = setting,
        }
    }

    /// Start or stop remote climate
    ///
    /// Issues the command against the account session, records the expected
    /// effect on the coordinator (so the mode reads back optimistically),
    /// then requests a debounced refresh to converge on the real state.
    pub async fn set_hvac_mode(&self, mode: HvacMode) -> ApiResult<()> {
        debug!(vehicle = %self.coordinator.id(), ?mode, "set hvac mode");
        match mode {
            HvacMode::Off => {
                self.session.stop_climate(self.coordinator.id()).await?;
                self.coordinator
                    .register_pending_command(ExpectedState::HvacOff);
            }
            HvacMode::HeatCool => {
                let settings = self.build_settings().await;
                self.session
                    .start_climate(self.coordinator.id(), &settings)
                    .await?;
                self.coordinator
                    .register_pending_command(ExpectedState::HvacOn);
            }
        }
        self.coordinator.request_refresh().await;
        Ok(())
    }

    async fn build_settings(&self) -> ClimateSettings {
        let desired = *self.desired.lock().await;
        let mut settings = ClimateSettings::new(self.target_temperature_f())
            .with_defrost(desired.defrost)
            .with_heating_accessories(desired.heating_accessories);
        settings.driver_seat = desired.driver_seat;
        settings.passenger_seat = desired.passenger_seat;
        settings.left_rear_seat = desired.left_rear_seat;
        settings.right_rear_seat = desired.right_rear_seat;
        settings
    }
}

impl VehicleEntity for Thermostat {
    fn coordinator(&self) -> &Arc<VehicleCoordinator> {
        &self.coordinator
    }

    fn key(&self) -> &'static str {
        "climate"
    }

    fn label(&self) -> &'static str {
        "Climate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uvo_api::testing::{MockAccountSession, RecordedCommand, ScriptedRefresh};
    use uvo_core::{ScanInterval, VehicleInfo, VehicleSnapshot};

    fn setup(
        snapshot: VehicleSnapshot,
    ) -> (Arc<MockAccountSession>, Arc<VehicleCoordinator>, Thermostat) {
        let session = Arc::new(MockAccountSession::new());
        session.set_fallback_snapshot(snapshot);
        let coordinator = VehicleCoordinator::new(
            VehicleInfo::new("key-001".parse().unwrap(), "My EV6", "EV6"),
            Arc::clone(&session) as SharedSession,
            ScanInterval::new(30).unwrap(),
        );
        let thermostat = Thermostat::new(
            Arc::clone(&coordinator),
            Arc::clone(&session) as SharedSession,
        );
        (session, coordinator, thermostat)
    }

    #[tokio::test]
    async fn test_mode_unknown_before_first_snapshot() {
        let (_session, _coordinator, thermostat) = setup(VehicleSnapshot::default());
        assert_eq!(thermostat.hvac_mode(), None);
        assert!(!thermostat.available());
    }

    #[tokio::test]
    async fn test_target_temperature_clamped() {
        let (_session, _coordinator, thermostat) = setup(VehicleSnapshot::default());
        assert_eq!(thermostat.target_temperature_f(), 72);

        thermostat.set_target_temperature_f(100);
        assert_eq!(thermostat.target_temperature_f(), 82);

        thermostat.set_target_temperature_f(40);
        assert_eq!(thermostat.target_temperature_f(), 62);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heat_cool_start_issues_command_then_converges() {
        let (session, coordinator, thermostat) = setup(VehicleSnapshot {
            hvac_on: Some(false),
            ..Default::default()
        });
        coordinator.first_refresh().await.unwrap();
        assert_eq!(thermostat.hvac_mode(), Some(HvacMode::Off));

        let handle = Arc::clone(&coordinator).start();

        thermostat.set_target_temperature_f(72);
        thermostat.set_hvac_mode(HvacMode::HeatCool).await.unwrap();

        // The exact command the session must have received
        let commands = session.commands();
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            RecordedCommand::StartClimate(vehicle_id, settings) => {
                assert_eq!(vehicle_id.as_str(), "key-001");
                assert_eq!(settings.target_temperature_f, 72);
                assert!(!settings.defrost);
                assert!(settings.climate);
                assert!(!settings.heating_accessories);
            }
            other => panic!("expected StartClimate, got {other:?}"),
        }

        // Requested state shows before the refresh confirms it
        assert_eq!(thermostat.hvac_mode(), Some(HvacMode::HeatCool));

        // The debounced refresh lands and the vehicle reports HVAC on
        session.push_refresh(ScriptedRefresh::Snapshot(VehicleSnapshot {
            hvac_on: Some(true),
            ..Default::default()
        }));
        tokio::time::sleep(Duration::from_secs(12)).await;

        assert_eq!(session.refresh_call_count(), 2);
        assert_eq!(thermostat.hvac_mode(), Some(HvacMode::HeatCool));
        assert!(coordinator.pending_command().is_none());

        coordinator.shutdown().await;
        let _ = handle.await;
    }

    #[tokio::test]
    async fn test_turn_off_issues_stop() {
        let (session, coordinator, thermostat) = setup(VehicleSnapshot {
            hvac_on: Some(true),
            ..Default::default()
        });
        coordinator.first_refresh().await.unwrap();
        assert_eq!(thermostat.hvac_mode(), Some(HvacMode::HeatCool));

        thermostat.set_hvac_mode(HvacMode::Off).await.unwrap();

        assert_eq!(
            session.commands(),
            vec![RecordedCommand::StopClimate("key-001".parse().unwrap())]
        );
        assert_eq!(thermostat.hvac_mode(), Some(HvacMode::Off));
    }

    #[tokio::test]
    async fn test_desired_intent_rides_along() {
        let (session, coordinator, thermostat) = setup(VehicleSnapshot {
            hvac_on: Some(false),
            ..Default::default()
        });
        coordinator.first_refresh().await.unwrap();

        thermostat.set_desired_defrost(true).await;
        thermostat.set_desired_heating_accessories(true).await;
        thermostat
            .set_seat_comfort(SeatPosition::Driver, Some(SeatSettings::HeatHigh))
            .await;

        thermostat.set_hvac_mode(HvacMode::HeatCool).await.unwrap();

        match &session.commands()[0] {
            RecordedCommand::StartClimate(_, settings) => {
                assert!(settings.defrost);
                assert!(settings.heating_accessories);
                assert_eq!(settings.driver_seat, Some(SeatSettings::HeatHigh));
                assert_eq!(settings.passenger_seat, None);
            }
            other => panic!("expected StartClimate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_entity_identity() {
        let (_session, coordinator, thermostat) = setup(VehicleSnapshot::default());
        assert_eq!(thermostat.name(), "My EV6 Climate");
        assert_eq!(thermostat.unique_id(), "key-001_climate");
        assert!(!thermostat.available());

        coordinator.first_refresh().await.unwrap();
        assert!(thermostat.available());
    }
}
