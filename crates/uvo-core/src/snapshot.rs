//! Vehicle snapshot captured at refresh time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last-known vehicle state as reported by the owners service
///
/// A snapshot is captured whole at refresh time and replaced whole on the
/// next successful refresh; it is never partially mutated. Every field is
/// optional: whether a value is present is decided once, when the service
/// response is decoded, so readers never probe for attribute presence.
///
/// Distances are miles, temperatures are degrees Fahrenheit and levels are
/// percentages, as delivered by the USA-region service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSnapshot {
    // Doors and closures
    pub doors_locked: Option<bool>,
    pub front_left_door_open: Option<bool>,
    pub front_right_door_open: Option<bool>,
    pub back_left_door_open: Option<bool>,
    pub back_right_door_open: Option<bool>,
    pub hood_open: Option<bool>,
    pub trunk_open: Option<bool>,

    // Location
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // Drivetrain and consumables
    pub odometer_miles: Option<f64>,
    pub fuel_level_pct: Option<f64>,
    pub car_battery_level_pct: Option<i32>,
    pub engine_running: Option<bool>,
    pub tire_pressure_warning: Option<bool>,
    pub low_fuel_light_on: Option<bool>,
    pub next_service_miles: Option<f64>,

    // EV battery and charging
    pub ev_battery_level_pct: Option<f64>,
    pub ev_battery_charging: Option<bool>,
    pub ev_plugged_in: Option<bool>,
    pub ev_charge_limit_ac_pct: Option<i32>,
    pub ev_charge_limit_dc_pct: Option<i32>,
    pub ev_charge_remaining_minutes: Option<i32>,

    // Driving range
    pub ev_range_miles: Option<i32>,
    pub fuel_range_miles: Option<i32>,
    pub total_range_miles: Option<i32>,

    // Climate
    pub hvac_on: Option<bool>,
    pub target_temperature_f: Option<i32>,
    pub defrost_on: Option<bool>,
    pub rear_window_heater_on: Option<bool>,
    pub side_mirror_heater_on: Option<bool>,
    pub steering_wheel_heater_on: Option<bool>,

    /// When the vehicle last synced its state to the cloud service
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl VehicleSnapshot {
    /// True if any door, the hood or the trunk is reported open
    ///
    /// Unknown flags are treated as closed; an all-unknown snapshot
    /// reports None.
    pub fn any_open(&self) -> Option<bool> {
        let flags = [
            self.front_left_door_open,
            self.front_right_door_open,
            self.back_left_door_open,
            self.back_right_door_open,
            self.hood_open,
            self.trunk_open,
        ];
        if flags.iter().all(Option::is_none) {
            return None;
        }
        Some(flags.iter().any(|f| *f == Some(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_is_valid() {
        let snapshot: VehicleSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, VehicleSnapshot::default());
        assert_eq!(snapshot.doors_locked, None);
        assert_eq!(snapshot.any_open(), None);
    }

    #[test]
    fn test_any_open() {
        let snapshot = VehicleSnapshot {
            front_left_door_open: Some(false),
            trunk_open: Some(true),
            ..Default::default()
        };
        assert_eq!(snapshot.any_open(), Some(true));

        let closed = VehicleSnapshot {
            front_left_door_open: Some(false),
            ..Default::default()
        };
        assert_eq!(closed.any_open(), Some(false));
    }

    #[test]
    fn test_serde_roundtrip() {
        let snapshot = VehicleSnapshot {
            doors_locked: Some(true),
            odometer_miles: Some(12034.5),
            ev_battery_level_pct: Some(81.0),
            hvac_on: Some(false),
            target_temperature_f: Some(72),
            ..Default::default()
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: VehicleSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
