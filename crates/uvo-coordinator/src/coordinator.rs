//! Vehicle data coordinator

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use uvo_api::{ApiResult, SharedSession};
use uvo_core::{ScanInterval, VehicleId, VehicleInfo, VehicleSnapshot};

use crate::debounce::{DebouncedFn, Debouncer};

/// Cooldown applied to externally requested refreshes
pub const REQUEST_REFRESH_COOLDOWN: Duration = Duration::from_secs(10);

/// How long an issued command may stay unconfirmed before it is dropped
const PENDING_COMMAND_TTL: Duration = Duration::from_secs(300);

/// Effect an issued remote command is expected to have on upcoming snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedState {
    HvacOn,
    HvacOff,
    DoorsLocked,
    DoorsUnlocked,
}

/// A remote command between issue and confirmation
///
/// While a command is pending the affected derived properties report its
/// expected value, so the caller sees the requested state before the next
/// refresh confirms it. Reconciliation happens against each successful
/// refresh: a confirming snapshot clears the record, and a record that
/// outlives its window without confirmation is dropped as presumed failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCommand {
    pub expects: ExpectedState,
    issued_at: Instant,
}

impl PendingCommand {
    fn new(expects: ExpectedState) -> Self {
        Self {
            expects,
            issued_at: Instant::now(),
        }
    }

    fn confirmed_by(&self, snapshot: &VehicleSnapshot) -> bool {
        match self.expects {
            ExpectedState::HvacOn => snapshot.hvac_on == Some(true),
            ExpectedState::HvacOff => snapshot.hvac_on == Some(false),
            ExpectedState::DoorsLocked => snapshot.doors_locked == Some(true),
            ExpectedState::DoorsUnlocked => snapshot.doors_locked == Some(false),
        }
    }

    fn expired(&self) -> bool {
        self.issued_at.elapsed() >= PENDING_COMMAND_TTL
    }
}

/// Observable coordinator state, published through a watch channel
///
/// Listeners are only woken when something here actually changed; a refresh
/// that delivers a byte-identical snapshot is not re-announced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorState {
    /// Last successful snapshot; never None again once the first refresh
    /// has succeeded
    pub snapshot: Option<Arc<VehicleSnapshot>>,

    /// False until the first refresh, and after any failed refresh until
    /// the next successful one
    pub last_update_success: bool,

    /// Command awaiting confirmation, if any
    pub pending_command: Option<PendingCommand>,
}

/// Per-vehicle polling coordinator
///
/// Owns the scheduled refresh loop and the debouncer for on-demand
/// refreshes. Every refresh executes on the single loop task, so at most
/// one refresh per vehicle is ever in flight. A refresh of either kind
/// resets the schedule to one full scan interval.
pub struct VehicleCoordinator {
    vehicle: VehicleInfo,
    session: SharedSession,
    scan_interval: Duration,
    published: watch::Sender<CoordinatorState>,
    refresh_notify: Arc<Notify>,
    debouncer: Debouncer,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl VehicleCoordinator {
    /// Create a coordinator for one vehicle
    ///
    /// The coordinator is inert until [`first_refresh`](Self::first_refresh)
    /// and [`start`](Self::start) are called.
    pub fn new(vehicle: VehicleInfo, session: SharedSession, scan_interval: ScanInterval) -> Arc<Self> {
        let (published, _) = watch::channel(CoordinatorState::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let refresh_notify = Arc::new(Notify::new());
        let notify = Arc::clone(&refresh_notify);
        let on_debounced: DebouncedFn = Arc::new(move || {
            let notify = Arc::clone(&notify);
            Box::pin(async move {
                notify.notify_one();
            })
        });

        Arc::new(Self {
            vehicle,
            session,
            scan_interval: scan_interval.as_duration(),
            published,
            refresh_notify,
            debouncer: Debouncer::new(REQUEST_REFRESH_COOLDOWN, false, on_debounced),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// The vehicle this coordinator polls
    pub fn vehicle(&self) -> &VehicleInfo {
        &self.vehicle
    }

    /// The vehicle's opaque key
    pub fn id(&self) -> &VehicleId {
        &self.vehicle.id
    }

    /// Configured polling interval
    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// Watch the published state for changes
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.published.subscribe()
    }

    /// Mandatory initial refresh
    ///
    /// Setup aborts on error; the coordinator must not enter service
    /// without a snapshot.
    pub async fn first_refresh(&self) -> ApiResult<()> {
        debug!(vehicle = %self.vehicle.id, "first refresh");
        self.do_refresh().await
    }

    /// Refresh now, outside the debounce window
    ///
    /// Errors are absorbed here: the coordinator is marked unavailable,
    /// keeps its stale snapshot, and the next scheduled tick tries again.
    pub async fn refresh(&self) {
        if let Err(err) = self.do_refresh().await {
            warn!(vehicle = %self.vehicle.id, error = %err, "vehicle refresh failed");
            self.published.send_if_modified(|state| {
                let was_available = state.last_update_success;
                state.last_update_success = false;
                was_available
            });
        }
    }

    /// Request a refresh through the debouncer
    ///
    /// Requests landing in the same cooldown window coalesce into a single
    /// remote call.
    pub async fn request_refresh(&self) {
        self.debouncer.call().await;
    }

    /// Spawn the refresh loop
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut shutdown = self.shutdown_rx.clone();
            debug!(vehicle = %self.vehicle.id, "refresh loop started");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.scan_interval) => self.refresh().await,
                    _ = self.refresh_notify.notified() => self.refresh().await,
                    _ = shutdown.changed() => break,
                }
            }
            debug!(vehicle = %self.vehicle.id, "refresh loop stopped");
        })
    }

    /// Stop the refresh loop and cancel any owed debounced refresh
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        self.debouncer.shutdown().await;
    }

    async fn do_refresh(&self) -> ApiResult<()> {
        let snapshot = self.session.refresh_vehicle(&self.vehicle.id).await?;
        self.apply_snapshot(snapshot);
        Ok(())
    }

    /// Replace the snapshot wholesale and reconcile the pending command
    fn apply_snapshot(&self, snapshot: VehicleSnapshot) {
        let snapshot = Arc::new(snapshot);
        let vehicle_id = &self.vehicle.id;

        let changed = self.published.send_if_modified(|state| {
            let mut modified = false;

            if let Some(pending) = state.pending_command {
                if pending.confirmed_by(&snapshot) {
                    debug!(vehicle = %vehicle_id, expects = ?pending.expects, "pending command confirmed");
                    state.pending_command = None;
                    modified = true;
                } else if pending.expired() {
                    warn!(
                        vehicle = %vehicle_id,
                        expects = ?pending.expects,
                        "remote command never reflected by the vehicle, dropping it"
                    );
                    state.pending_command = None;
                    modified = true;
                }
            }

            if !state.last_update_success {
                state.last_update_success = true;
                modified = true;
            }

            if state.snapshot.as_deref() != Some(snapshot.as_ref()) {
                state.snapshot = Some(Arc::clone(&snapshot));
                modified = true;
            }

            modified
        });

        if changed {
            debug!(vehicle = %vehicle_id, "snapshot updated");
        } else {
            trace!(vehicle = %vehicle_id, "snapshot unchanged");
        }
    }

    /// Record the expected effect of a just-issued remote command
    ///
    /// Listeners are woken immediately so the requested state shows up
    /// before the confirming refresh lands.
    pub fn register_pending_command(&self, expects: ExpectedState) {
        debug!(vehicle = %self.vehicle.id, ?expects, "command issued, awaiting confirmation");
        self.published
            .send_modify(|state| state.pending_command = Some(PendingCommand::new(expects)));
    }

    /// Command currently awaiting confirmation, if any
    pub fn pending_command(&self) -> Option<PendingCommand> {
        self.published.borrow().pending_command
    }

    /// Current published state
    pub fn state(&self) -> CoordinatorState {
        self.published.borrow().clone()
    }

    /// Last successful snapshot
    pub fn snapshot(&self) -> Option<Arc<VehicleSnapshot>> {
        self.published.borrow().snapshot.clone()
    }

    /// True while the most recent refresh succeeded
    pub fn last_update_success(&self) -> bool {
        self.published.borrow().last_update_success
    }

    fn project<T>(&self, read: impl FnOnce(&VehicleSnapshot) -> Option<T>) -> Option<T> {
        self.published.borrow().snapshot.as_ref().and_then(|s| read(s))
    }

    // ------------------------------------------------------------------
    // Derived read properties
    //
    // Pure projections from the current snapshot; None is the unknown
    // sentinel used whenever the snapshot is absent or a field is unset.
    // ------------------------------------------------------------------

    /// USA Kia vehicles support remote lock
    pub fn can_remote_lock(&self) -> bool {
        true
    }

    /// USA Kia vehicles support remote climate start
    pub fn can_remote_climate(&self) -> bool {
        true
    }

    /// Door lock state, reporting an unconfirmed lock/unlock optimistically
    pub fn doors_locked(&self) -> Option<bool> {
        let state = self.published.borrow();
        match state.pending_command.map(|p| p.expects) {
            Some(ExpectedState::DoorsLocked) => return Some(true),
            Some(ExpectedState::DoorsUnlocked) => return Some(false),
            _ => {}
        }
        state.snapshot.as_ref().and_then(|s| s.doors_locked)
    }

    /// HVAC state, reporting an unconfirmed start/stop optimistically
    pub fn hvac_on(&self) -> Option<bool> {
        let state = self.published.borrow();
        match state.pending_command.map(|p| p.expects) {
            Some(ExpectedState::HvacOn) => return Some(true),
            Some(ExpectedState::HvacOff) => return Some(false),
            _ => {}
        }
        state.snapshot.as_ref().and_then(|s| s.hvac_on)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.project(|s| s.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.project(|s| s.longitude)
    }

    pub fn odometer_miles(&self) -> Option<f64> {
        self.project(|s| s.odometer_miles)
    }

    pub fn fuel_level_pct(&self) -> Option<f64> {
        self.project(|s| s.fuel_level_pct)
    }

    pub fn car_battery_level_pct(&self) -> Option<i32> {
        self.project(|s| s.car_battery_level_pct)
    }

    pub fn ev_battery_level_pct(&self) -> Option<f64> {
        self.project(|s| s.ev_battery_level_pct)
    }

    pub fn ev_battery_charging(&self) -> Option<bool> {
        self.project(|s| s.ev_battery_charging)
    }

    pub fn ev_plugged_in(&self) -> Option<bool> {
        self.project(|s| s.ev_plugged_in)
    }

    pub fn ev_charge_limit_ac_pct(&self) -> Option<i32> {
        self.project(|s| s.ev_charge_limit_ac_pct)
    }

    pub fn ev_charge_limit_dc_pct(&self) -> Option<i32> {
        self.project(|s| s.ev_charge_limit_dc_pct)
    }

    pub fn ev_charge_remaining_minutes(&self) -> Option<i32> {
        self.project(|s| s.ev_charge_remaining_minutes)
    }

    pub fn ev_range_miles(&self) -> Option<i32> {
        self.project(|s| s.ev_range_miles)
    }

    pub fn fuel_range_miles(&self) -> Option<i32> {
        self.project(|s| s.fuel_range_miles)
    }

    pub fn total_range_miles(&self) -> Option<i32> {
        self.project(|s| s.total_range_miles)
    }

    /// Cabin target temperature (°F) the vehicle last reported
    pub fn target_temperature_f(&self) -> Option<i32> {
        self.project(|s| s.target_temperature_f)
    }

    pub fn defrost_on(&self) -> Option<bool> {
        self.project(|s| s.defrost_on)
    }

    pub fn rear_window_heater_on(&self) -> Option<bool> {
        self.project(|s| s.rear_window_heater_on)
    }

    pub fn side_mirror_heater_on(&self) -> Option<bool> {
        self.project(|s| s.side_mirror_heater_on)
    }

    pub fn steering_wheel_heater_on(&self) -> Option<bool> {
        self.project(|s| s.steering_wheel_heater_on)
    }

    pub fn front_left_door_open(&self) -> Option<bool> {
        self.project(|s| s.front_left_door_open)
    }

    pub fn front_right_door_open(&self) -> Option<bool> {
        self.project(|s| s.front_right_door_open)
    }

    pub fn back_left_door_open(&self) -> Option<bool> {
        self.project(|s| s.back_left_door_open)
    }

    pub fn back_right_door_open(&self) -> Option<bool> {
        self.project(|s| s.back_right_door_open)
    }

    pub fn hood_open(&self) -> Option<bool> {
        self.project(|s| s.hood_open)
    }

    pub fn trunk_open(&self) -> Option<bool> {
        self.project(|s| s.trunk_open)
    }

    /// Any door, hood or trunk open
    pub fn any_open(&self) -> Option<bool> {
        self.project(|s| s.any_open())
    }

    pub fn engine_running(&self) -> Option<bool> {
        self.project(|s| s.engine_running)
    }

    pub fn tire_pressure_warning(&self) -> Option<bool> {
        self.project(|s| s.tire_pressure_warning)
    }

    pub fn low_fuel_light_on(&self) -> Option<bool> {
        self.project(|s| s.low_fuel_light_on)
    }

    pub fn next_service_miles(&self) -> Option<f64> {
        self.project(|s| s.next_service_miles)
    }

    /// When the vehicle last synced with the cloud service
    pub fn last_synced_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.project(|s| s.last_synced_at)
    }
}
