//! Wire payload types for the owners gateway
//!
//! These structs mirror the gateway's JSON shapes and stay private to the
//! crate; everything a caller sees has been flattened into
//! [`VehicleSnapshot`] by the time decoding finishes. Open/closed and
//! on/off flags arrive as 0/1 integers, temperatures as strings, and
//! timestamps as compact UTC stamps.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use uvo_core::{parse_temperature_value, ClimateSettings, SeatSettings, VehicleSnapshot};

/// Compact UTC stamp format used by the gateway ("20260801123000")
const SYNC_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Plug type code for DC charging in targetSOC entries
const PLUG_TYPE_DC: i32 = 0;
/// Plug type code for AC charging in targetSOC entries
const PLUG_TYPE_AC: i32 = 1;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceResponse<T> {
    pub status: ResponseStatus,
    #[serde(default)]
    pub payload: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseStatus {
    #[serde(rename = "statusCode")]
    pub status_code: i32,
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(rename = "userId")]
    pub user_id: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginPayload {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default, rename = "expiresIn")]
    pub expires_in_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Vehicle list
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct VehicleListPayload {
    #[serde(default, rename = "vehicleSummary")]
    pub vehicles: Vec<VehicleSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VehicleSummary {
    #[serde(rename = "vehicleKey")]
    pub vehicle_key: String,
    #[serde(default, rename = "nickName")]
    pub nickname: Option<String>,
    #[serde(rename = "modelName")]
    pub model_name: String,
    #[serde(default, rename = "modelYear")]
    pub model_year: Option<String>,
}

// ---------------------------------------------------------------------------
// Vehicle status
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VehicleStatusPayload {
    #[serde(rename = "vehicleStatusRpt")]
    pub report: Option<VehicleStatusReport>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VehicleStatusReport {
    #[serde(rename = "vehicleStatus")]
    pub status: Option<VehicleStatus>,
    pub location: Option<VehicleLocation>,
    pub odometer: Option<ValueReading>,
    pub maintenance: Option<Maintenance>,
    #[serde(rename = "syncDate")]
    pub sync_date: Option<SyncDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VehicleStatus {
    #[serde(rename = "doorLock")]
    pub door_lock: Option<bool>,
    #[serde(rename = "doorStatus")]
    pub door_status: Option<DoorStatus>,
    #[serde(rename = "hoodOpen")]
    pub hood_open: Option<bool>,
    #[serde(rename = "trunkOpen")]
    pub trunk_open: Option<bool>,
    pub engine: Option<bool>,
    #[serde(rename = "lowFuelLight")]
    pub low_fuel_light: Option<bool>,
    #[serde(rename = "fuelLevel")]
    pub fuel_level: Option<f64>,
    #[serde(rename = "batteryStatus")]
    pub battery: Option<BatteryStatus>,
    #[serde(rename = "evStatus")]
    pub ev: Option<EvStatus>,
    pub climate: Option<ClimateStatus>,
    #[serde(rename = "tirePressure")]
    pub tire_pressure: Option<TirePressure>,
    #[serde(rename = "distanceToEmpty")]
    pub distance_to_empty: Option<ValueReading>,
}

/// Door flags use 0 = closed, 1 = open
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DoorStatus {
    #[serde(rename = "frontLeft")]
    pub front_left: Option<i32>,
    #[serde(rename = "frontRight")]
    pub front_right: Option<i32>,
    #[serde(rename = "backLeft")]
    pub back_left: Option<i32>,
    #[serde(rename = "backRight")]
    pub back_right: Option<i32>,
}

/// 12 V battery
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BatteryStatus {
    #[serde(rename = "stateOfCharge")]
    pub state_of_charge: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EvStatus {
    #[serde(rename = "batteryCharge")]
    pub battery_charge: Option<bool>,
    #[serde(rename = "batteryStatus")]
    pub battery_level: Option<f64>,
    /// 0 = not plugged, 1 = fast charger, 2 = portable charger
    #[serde(rename = "batteryPlugin")]
    pub battery_plugin: Option<i32>,
    #[serde(rename = "remainChargeTime")]
    pub remain_charge_time: Option<i32>,
    #[serde(rename = "drvDistance")]
    pub drv_distance: Option<DrivingDistance>,
    #[serde(rename = "targetSOC")]
    pub target_soc: Vec<TargetSoc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TargetSoc {
    #[serde(rename = "plugType")]
    pub plug_type: i32,
    #[serde(rename = "targetSOClevel")]
    pub level: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DrivingDistance {
    #[serde(rename = "evModeRange")]
    pub ev_mode: Option<ValueReading>,
    #[serde(rename = "gasModeRange")]
    pub gas_mode: Option<ValueReading>,
    #[serde(rename = "totalRange")]
    pub total: Option<ValueReading>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ClimateStatus {
    #[serde(rename = "airCtrl")]
    pub air_ctrl: Option<bool>,
    #[serde(rename = "airTemp")]
    pub air_temp: Option<TempValue>,
    pub defrost: Option<bool>,
    #[serde(rename = "heatingAccessory")]
    pub heating_accessory: Option<HeatingAccessory>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TempValue {
    pub value: String,
}

/// Accessory heater flags use 0 = off, 1 = on
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct HeatingAccessory {
    #[serde(rename = "rearWindow")]
    pub rear_window: Option<i32>,
    #[serde(rename = "sideMirror")]
    pub side_mirror: Option<i32>,
    #[serde(rename = "steeringWheel")]
    pub steering_wheel: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TirePressure {
    pub all: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValueReading {
    pub value: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Maintenance {
    #[serde(rename = "nextServiceMile")]
    pub next_service_mile: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncDate {
    pub utc: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VehicleLocation {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

fn flag(value: Option<i32>) -> Option<bool> {
    value.map(|v| v != 0)
}

fn parse_sync_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, SYNC_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

impl VehicleStatusReport {
    /// Flatten the nested report into the typed snapshot
    pub(crate) fn into_snapshot(self) -> VehicleSnapshot {
        let mut snapshot = VehicleSnapshot::default();

        if let Some(location) = self.location {
            snapshot.latitude = location.lat;
            snapshot.longitude = location.lon;
        }
        snapshot.odometer_miles = self.odometer.map(|o| o.value);
        snapshot.next_service_miles = self.maintenance.and_then(|m| m.next_service_mile);
        snapshot.last_synced_at = self.sync_date.and_then(|d| parse_sync_date(&d.utc));

        let Some(status) = self.status else {
            return snapshot;
        };

        snapshot.doors_locked = status.door_lock;
        if let Some(doors) = status.door_status {
            snapshot.front_left_door_open = flag(doors.front_left);
            snapshot.front_right_door_open = flag(doors.front_right);
            snapshot.back_left_door_open = flag(doors.back_left);
            snapshot.back_right_door_open = flag(doors.back_right);
        }
        snapshot.hood_open = status.hood_open;
        snapshot.trunk_open = status.trunk_open;
        snapshot.engine_running = status.engine;
        snapshot.low_fuel_light_on = status.low_fuel_light;
        snapshot.fuel_level_pct = status.fuel_level;
        snapshot.car_battery_level_pct = status.battery.and_then(|b| b.state_of_charge);
        snapshot.tire_pressure_warning = flag(status.tire_pressure.and_then(|t| t.all));
        snapshot.fuel_range_miles = status.distance_to_empty.map(|d| d.value as i32);

        if let Some(ev) = status.ev {
            snapshot.ev_battery_charging = ev.battery_charge;
            snapshot.ev_battery_level_pct = ev.battery_level;
            snapshot.ev_plugged_in = ev.battery_plugin.map(|p| p != 0);
            snapshot.ev_charge_remaining_minutes = ev.remain_charge_time;
            for target in &ev.target_soc {
                match target.plug_type {
                    PLUG_TYPE_AC => snapshot.ev_charge_limit_ac_pct = Some(target.level),
                    PLUG_TYPE_DC => snapshot.ev_charge_limit_dc_pct = Some(target.level),
                    _ => {}
                }
            }
            if let Some(distance) = ev.drv_distance {
                snapshot.ev_range_miles = distance.ev_mode.map(|d| d.value as i32);
                if let Some(gas) = distance.gas_mode {
                    snapshot.fuel_range_miles = Some(gas.value as i32);
                }
                snapshot.total_range_miles = distance.total.map(|d| d.value as i32);
            }
        }

        if let Some(climate) = status.climate {
            snapshot.hvac_on = climate.air_ctrl;
            snapshot.target_temperature_f = climate
                .air_temp
                .and_then(|t| parse_temperature_value(&t.value));
            snapshot.defrost_on = climate.defrost;
            if let Some(heater) = climate.heating_accessory {
                snapshot.rear_window_heater_on = flag(heater.rear_window);
                snapshot.side_mirror_heater_on = flag(heater.side_mirror);
                snapshot.steering_wheel_heater_on = flag(heater.steering_wheel);
            }
        }

        snapshot
    }
}

// ---------------------------------------------------------------------------
// Remote commands
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct VehicleKeyRequest<'a> {
    #[serde(rename = "vehicleKey")]
    pub vehicle_key: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RemoteClimateRequest<'a> {
    #[serde(rename = "vehicleKey")]
    pub vehicle_key: &'a str,
    #[serde(rename = "airCtrl")]
    pub air_ctrl: bool,
    #[serde(rename = "airTemp")]
    pub air_temp: TempRequest,
    pub defrost: bool,
    #[serde(rename = "heating1")]
    pub heating: i32,
    #[serde(rename = "seatHeaterVentCMD", skip_serializing_if = "Option::is_none")]
    pub seats: Option<SeatCommand>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TempRequest {
    pub value: String,
    /// 1 = Fahrenheit, the only unit the USA gateway accepts
    pub unit: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct SeatCommand {
    #[serde(rename = "drvSeatOptCmd")]
    pub driver: i32,
    #[serde(rename = "astSeatOptCmd")]
    pub passenger: i32,
    #[serde(rename = "rlSeatOptCmd")]
    pub rear_left: i32,
    #[serde(rename = "rrSeatOptCmd")]
    pub rear_right: i32,
}

/// Gateway code for a seat comfort level
fn seat_code(setting: SeatSettings) -> i32 {
    match setting {
        SeatSettings::Off => 0,
        SeatSettings::CoolLow => 3,
        SeatSettings::CoolMedium => 4,
        SeatSettings::CoolHigh => 5,
        SeatSettings::HeatLow => 6,
        SeatSettings::HeatMedium => 7,
        SeatSettings::HeatHigh => 8,
    }
}

impl<'a> RemoteClimateRequest<'a> {
    pub(crate) fn new(vehicle_key: &'a str, settings: &ClimateSettings) -> Self {
        let seats = [
            settings.driver_seat,
            settings.passenger_seat,
            settings.left_rear_seat,
            settings.right_rear_seat,
        ];
        let seat_command = if seats.iter().any(Option::is_some) {
            Some(SeatCommand {
                driver: seat_code(settings.driver_seat.unwrap_or_default()),
                passenger: seat_code(settings.passenger_seat.unwrap_or_default()),
                rear_left: seat_code(settings.left_rear_seat.unwrap_or_default()),
                rear_right: seat_code(settings.right_rear_seat.unwrap_or_default()),
            })
        } else {
            None
        };

        Self {
            vehicle_key,
            air_ctrl: settings.climate,
            air_temp: TempRequest {
                value: settings.target_temperature_f.to_string(),
                unit: 1,
            },
            defrost: settings.defrost,
            heating: i32::from(settings.heating_accessories),
            seats: seat_command,
        }
    }
}
