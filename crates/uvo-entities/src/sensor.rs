//! Sensor adapters
//!
//! Pure projections from the coordinator snapshot to typed sensor values.
//! `SensorValue::Unknown` is the sentinel reported whenever the snapshot is
//! absent or the underlying field is unset; no getter ever fails.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use uvo_coordinator::VehicleCoordinator;

use crate::base::VehicleEntity;

/// Typed value a sensor reports
#[derive(Debug, Clone, PartialEq)]
pub enum SensorValue {
    Float(f64),
    Int(i64),
    Timestamp(DateTime<Utc>),
    /// The snapshot is absent or does not carry this field
    Unknown,
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Float(value) => write!(f, "{value}"),
            SensorValue::Int(value) => write!(f, "{value}"),
            SensorValue::Timestamp(stamp) => write!(f, "{}", stamp.to_rfc3339()),
            SensorValue::Unknown => f.write_str("unknown"),
        }
    }
}

/// Numeric and timestamp sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Odometer,
    FuelLevel,
    CarBatteryLevel,
    EvBatteryLevel,
    EvChargeLimitAc,
    EvChargeLimitDc,
    EvChargeRemainingDuration,
    EvRange,
    FuelRange,
    TotalRange,
    NextService,
    LastSynced,
}

impl SensorKind {
    fn key(&self) -> &'static str {
        match self {
            SensorKind::Odometer => "odometer",
            SensorKind::FuelLevel => "fuel_level",
            SensorKind::CarBatteryLevel => "car_battery_level",
            SensorKind::EvBatteryLevel => "ev_battery_level",
            SensorKind::EvChargeLimitAc => "ev_charge_limit_ac",
            SensorKind::EvChargeLimitDc => "ev_charge_limit_dc",
            SensorKind::EvChargeRemainingDuration => "ev_charge_remaining_duration",
            SensorKind::EvRange => "ev_range",
            SensorKind::FuelRange => "fuel_range",
            SensorKind::TotalRange => "total_range",
            SensorKind::NextService => "next_service",
            SensorKind::LastSynced => "last_synced",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SensorKind::Odometer => "Odometer",
            SensorKind::FuelLevel => "Fuel Level",
            SensorKind::CarBatteryLevel => "12V Battery",
            SensorKind::EvBatteryLevel => "EV Battery",
            SensorKind::EvChargeLimitAc => "AC Charge Limit",
            SensorKind::EvChargeLimitDc => "DC Charge Limit",
            SensorKind::EvChargeRemainingDuration => "Charging Time Remaining",
            SensorKind::EvRange => "EV Range",
            SensorKind::FuelRange => "Fuel Range",
            SensorKind::TotalRange => "Total Range",
            SensorKind::NextService => "Next Service",
            SensorKind::LastSynced => "Last Synced",
        }
    }

    /// Unit of measurement, None for timestamps
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SensorKind::Odometer
            | SensorKind::EvRange
            | SensorKind::FuelRange
            | SensorKind::TotalRange
            | SensorKind::NextService => Some("mi"),
            SensorKind::FuelLevel
            | SensorKind::CarBatteryLevel
            | SensorKind::EvBatteryLevel
            | SensorKind::EvChargeLimitAc
            | SensorKind::EvChargeLimitDc => Some("%"),
            SensorKind::EvChargeRemainingDuration => Some("min"),
            SensorKind::LastSynced => None,
        }
    }
}

/// One numeric/timestamp sensor on a vehicle
pub struct VehicleSensor {
    kind: SensorKind,
    coordinator: Arc<VehicleCoordinator>,
}

impl VehicleSensor {
    pub fn new(kind: SensorKind, coordinator: Arc<VehicleCoordinator>) -> Self {
        Self { kind, coordinator }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Current value projected from the snapshot
    pub fn state(&self) -> SensorValue {
        let c = &self.coordinator;
        let value = match self.kind {
            SensorKind::Odometer => c.odometer_miles().map(SensorValue::Float),
            SensorKind::FuelLevel => c.fuel_level_pct().map(SensorValue::Float),
            SensorKind::CarBatteryLevel => c
                .car_battery_level_pct()
                .map(|v| SensorValue::Int(i64::from(v))),
            SensorKind::EvBatteryLevel => c.ev_battery_level_pct().map(SensorValue::Float),
            SensorKind::EvChargeLimitAc => c
                .ev_charge_limit_ac_pct()
                .map(|v| SensorValue::Int(i64::from(v))),
            SensorKind::EvChargeLimitDc => c
                .ev_charge_limit_dc_pct()
                .map(|v| SensorValue::Int(i64::from(v))),
            SensorKind::EvChargeRemainingDuration => c
                .ev_charge_remaining_minutes()
                .map(|v| SensorValue::Int(i64::from(v))),
            SensorKind::EvRange => c.ev_range_miles().map(|v| SensorValue::Int(i64::from(v))),
            SensorKind::FuelRange => c
                .fuel_range_miles()
                .map(|v| SensorValue::Int(i64::from(v))),
            SensorKind::TotalRange => c
                .total_range_miles()
                .map(|v| SensorValue::Int(i64::from(v))),
            SensorKind::NextService => c.next_service_miles().map(SensorValue::Float),
            SensorKind::LastSynced => c.last_synced_at().map(SensorValue::Timestamp),
        };
        value.unwrap_or(SensorValue::Unknown)
    }
}

impl VehicleEntity for VehicleSensor {
    fn coordinator(&self) -> &Arc<VehicleCoordinator> {
        &self.coordinator
    }

    fn key(&self) -> &'static str {
        self.kind.key()
    }

    fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// On/off sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySensorKind {
    EngineRunning,
    EvBatteryCharging,
    EvPluggedIn,
    TirePressureWarning,
    LowFuelLight,
    HoodOpen,
    TrunkOpen,
    FrontLeftDoorOpen,
    FrontRightDoorOpen,
    BackLeftDoorOpen,
    BackRightDoorOpen,
    AnyOpen,
    DefrostOn,
    RearWindowHeaterOn,
    SideMirrorHeaterOn,
    SteeringWheelHeaterOn,
}

impl BinarySensorKind {
    fn key(&self) -> &'static str {
        match self {
            BinarySensorKind::EngineRunning => "engine_running",
            BinarySensorKind::EvBatteryCharging => "ev_battery_charging",
            BinarySensorKind::EvPluggedIn => "ev_plugged_in",
            BinarySensorKind::TirePressureWarning => "tire_pressure_warning",
            BinarySensorKind::LowFuelLight => "low_fuel_light",
            BinarySensorKind::HoodOpen => "hood_open",
            BinarySensorKind::TrunkOpen => "trunk_open",
            BinarySensorKind::FrontLeftDoorOpen => "front_left_door_open",
            BinarySensorKind::FrontRightDoorOpen => "front_right_door_open",
            BinarySensorKind::BackLeftDoorOpen => "back_left_door_open",
            BinarySensorKind::BackRightDoorOpen => "back_right_door_open",
            BinarySensorKind::AnyOpen => "any_open",
            BinarySensorKind::DefrostOn => "defrost",
            BinarySensorKind::RearWindowHeaterOn => "rear_window_heater",
            BinarySensorKind::SideMirrorHeaterOn => "side_mirror_heater",
            BinarySensorKind::SteeringWheelHeaterOn => "steering_wheel_heater",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            BinarySensorKind::EngineRunning => "Engine",
            BinarySensorKind::EvBatteryCharging => "Charging",
            BinarySensorKind::EvPluggedIn => "Plugged In",
            BinarySensorKind::TirePressureWarning => "Tire Pressure Warning",
            BinarySensorKind::LowFuelLight => "Low Fuel",
            BinarySensorKind::HoodOpen => "Hood",
            BinarySensorKind::TrunkOpen => "Trunk",
            BinarySensorKind::FrontLeftDoorOpen => "Front Left Door",
            BinarySensorKind::FrontRightDoorOpen => "Front Right Door",
            BinarySensorKind::BackLeftDoorOpen => "Back Left Door",
            BinarySensorKind::BackRightDoorOpen => "Back Right Door",
            BinarySensorKind::AnyOpen => "Door Open",
            BinarySensorKind::DefrostOn => "Defroster",
            BinarySensorKind::RearWindowHeaterOn => "Rear Window Heater",
            BinarySensorKind::SideMirrorHeaterOn => "Side Mirror Heater",
            BinarySensorKind::SteeringWheelHeaterOn => "Steering Wheel Heater",
        }
    }
}

/// One on/off sensor on a vehicle
pub struct VehicleBinarySensor {
    kind: BinarySensorKind,
    coordinator: Arc<VehicleCoordinator>,
}

impl VehicleBinarySensor {
    pub fn new(kind: BinarySensorKind, coordinator: Arc<VehicleCoordinator>) -> Self {
        Self { kind, coordinator }
    }

    pub fn kind(&self) -> BinarySensorKind {
        self.kind
    }

    /// Current flag, None as the unknown sentinel
    pub fn is_on(&self) -> Option<bool> {
        let c = &self.coordinator;
        match self.kind {
            BinarySensorKind::EngineRunning => c.engine_running(),
            BinarySensorKind::EvBatteryCharging => c.ev_battery_charging(),
            BinarySensorKind::EvPluggedIn => c.ev_plugged_in(),
            BinarySensorKind::TirePressureWarning => c.tire_pressure_warning(),
            BinarySensorKind::LowFuelLight => c.low_fuel_light_on(),
            BinarySensorKind::HoodOpen => c.hood_open(),
            BinarySensorKind::TrunkOpen => c.trunk_open(),
            BinarySensorKind::FrontLeftDoorOpen => c.front_left_door_open(),
            BinarySensorKind::FrontRightDoorOpen => c.front_right_door_open(),
            BinarySensorKind::BackLeftDoorOpen => c.back_left_door_open(),
            BinarySensorKind::BackRightDoorOpen => c.back_right_door_open(),
            BinarySensorKind::AnyOpen => c.any_open(),
            BinarySensorKind::DefrostOn => c.defrost_on(),
            BinarySensorKind::RearWindowHeaterOn => c.rear_window_heater_on(),
            BinarySensorKind::SideMirrorHeaterOn => c.side_mirror_heater_on(),
            BinarySensorKind::SteeringWheelHeaterOn => c.steering_wheel_heater_on(),
        }
    }
}

impl VehicleEntity for VehicleBinarySensor {
    fn coordinator(&self) -> &Arc<VehicleCoordinator> {
        &self.coordinator
    }

    fn key(&self) -> &'static str {
        self.kind.key()
    }

    fn label(&self) -> &'static str {
        self.kind.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uvo_api::testing::MockAccountSession;
    use uvo_api::SharedSession;
    use uvo_core::{ScanInterval, VehicleInfo, VehicleSnapshot};

    const ALL_SENSORS: [SensorKind; 12] = [
        SensorKind::Odometer,
        SensorKind::FuelLevel,
        SensorKind::CarBatteryLevel,
        SensorKind::EvBatteryLevel,
        SensorKind::EvChargeLimitAc,
        SensorKind::EvChargeLimitDc,
        SensorKind::EvChargeRemainingDuration,
        SensorKind::EvRange,
        SensorKind::FuelRange,
        SensorKind::TotalRange,
        SensorKind::NextService,
        SensorKind::LastSynced,
    ];

    fn coordinator(snapshot: VehicleSnapshot) -> (Arc<MockAccountSession>, Arc<VehicleCoordinator>) {
        let session = Arc::new(MockAccountSession::new());
        session.set_fallback_snapshot(snapshot);
        let coordinator = VehicleCoordinator::new(
            VehicleInfo::new("key-001".parse().unwrap(), "My EV6", "EV6"),
            Arc::clone(&session) as SharedSession,
            ScanInterval::new(30).unwrap(),
        );
        (session, coordinator)
    }

    #[tokio::test]
    async fn test_every_sensor_unknown_without_snapshot() {
        let (_session, coordinator) = coordinator(VehicleSnapshot::default());
        for kind in ALL_SENSORS {
            let sensor = VehicleSensor::new(kind, Arc::clone(&coordinator));
            assert_eq!(sensor.state(), SensorValue::Unknown, "{kind:?}");
        }
        let binary = VehicleBinarySensor::new(BinarySensorKind::EngineRunning, coordinator);
        assert_eq!(binary.is_on(), None);
    }

    #[tokio::test]
    async fn test_sensor_values_after_refresh() {
        let (_session, coordinator) = coordinator(VehicleSnapshot {
            odometer_miles: Some(12034.5),
            ev_battery_level_pct: Some(81.0),
            car_battery_level_pct: Some(87),
            ev_range_miles: Some(210),
            ..Default::default()
        });
        coordinator.first_refresh().await.unwrap();

        let odometer = VehicleSensor::new(SensorKind::Odometer, Arc::clone(&coordinator));
        assert_eq!(odometer.state(), SensorValue::Float(12034.5));

        let battery = VehicleSensor::new(SensorKind::CarBatteryLevel, Arc::clone(&coordinator));
        assert_eq!(battery.state(), SensorValue::Int(87));

        let range = VehicleSensor::new(SensorKind::EvRange, Arc::clone(&coordinator));
        assert_eq!(range.state(), SensorValue::Int(210));

        // A field the new snapshot does not carry stays unknown
        let fuel = VehicleSensor::new(SensorKind::FuelLevel, coordinator);
        assert_eq!(fuel.state(), SensorValue::Unknown);
    }

    #[tokio::test]
    async fn test_binary_sensors() {
        let (_session, coordinator) = coordinator(VehicleSnapshot {
            ev_battery_charging: Some(true),
            ev_plugged_in: Some(true),
            trunk_open: Some(true),
            front_left_door_open: Some(false),
            ..Default::default()
        });
        coordinator.first_refresh().await.unwrap();

        let charging =
            VehicleBinarySensor::new(BinarySensorKind::EvBatteryCharging, Arc::clone(&coordinator));
        assert_eq!(charging.is_on(), Some(true));

        let any_open = VehicleBinarySensor::new(BinarySensorKind::AnyOpen, Arc::clone(&coordinator));
        assert_eq!(any_open.is_on(), Some(true));

        let engine = VehicleBinarySensor::new(BinarySensorKind::EngineRunning, coordinator);
        assert_eq!(engine.is_on(), None);
    }

    #[tokio::test]
    async fn test_units_and_identity() {
        let (_session, coordinator) = coordinator(VehicleSnapshot::default());
        let sensor = VehicleSensor::new(SensorKind::Odometer, coordinator);

        assert_eq!(sensor.kind().unit(), Some("mi"));
        assert_eq!(sensor.name(), "My EV6 Odometer");
        assert_eq!(sensor.unique_id(), "key-001_odometer");
        assert_eq!(SensorKind::LastSynced.unit(), None);
        assert_eq!(sensor.state().to_string(), "unknown");
    }
}
