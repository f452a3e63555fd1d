//! Core types for the Kia UVO workspace
//!
//! This crate provides the fundamental types shared by the API client, the
//! vehicle coordinator and the entity adapters: VehicleId, VehicleInfo,
//! VehicleSnapshot, climate settings and the validated scan interval.

mod climate;
mod scan_interval;
mod snapshot;
mod vehicle;

pub use climate::{
    clamp_target_temperature, parse_temperature_value, ClimateSettings, SeatSettings,
    DEFAULT_TARGET_TEMPERATURE_F, TEMPERATURE_MAX_F, TEMPERATURE_MIN_F,
};
pub use scan_interval::{
    ScanInterval, ScanIntervalError, DEFAULT_SCAN_INTERVAL_MINUTES, SCAN_INTERVAL_MAX_MINUTES,
    SCAN_INTERVAL_MIN_MINUTES,
};
pub use snapshot::VehicleSnapshot;
pub use vehicle::{VehicleId, VehicleIdError, VehicleInfo};
