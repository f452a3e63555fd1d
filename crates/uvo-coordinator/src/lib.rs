//! Per-vehicle polling coordinator
//!
//! One [`VehicleCoordinator`] per vehicle on the account. The coordinator
//! owns a scheduled refresh loop, a [`Debouncer`] that coalesces externally
//! requested refreshes, and the last successful [`uvo_core::VehicleSnapshot`].
//! Entity adapters read derived properties off the coordinator and watch it
//! for changes; they never talk to the refresh loop directly.

mod coordinator;
mod debounce;

pub use coordinator::{
    CoordinatorState, ExpectedState, PendingCommand, VehicleCoordinator,
    REQUEST_REFRESH_COOLDOWN,
};
pub use debounce::{DebouncedFn, Debouncer};
