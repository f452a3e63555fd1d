//! Entity adapters over the vehicle coordinator
//!
//! Thin read/command adapters: each one projects derived properties off a
//! [`uvo_coordinator::VehicleCoordinator`] and translates user actions into
//! account-session commands, then requests a coordinator refresh so the
//! snapshot converges on the commanded state.

mod base;
mod climate;
mod lock;
mod sensor;

pub use base::VehicleEntity;
pub use climate::{HvacMode, SeatPosition, Thermostat};
pub use lock::DoorLock;
pub use sensor::{
    BinarySensorKind, SensorKind, SensorValue, VehicleBinarySensor, VehicleSensor,
};
