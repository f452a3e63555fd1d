//! Scriptable account session for tests
//!
//! Downstream crates enable the `testing` feature and drive their suites
//! against [`MockAccountSession`] instead of the live gateway: refresh
//! results are scripted up front, issued commands are recorded for
//! assertions, and remote calls are counted.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use uvo_core::{ClimateSettings, VehicleId, VehicleInfo, VehicleSnapshot};

use crate::error::{ApiError, ApiResult};
use crate::session::AccountSession;

/// A remote command the mock received, with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    LockDoors(VehicleId),
    UnlockDoors(VehicleId),
    StartClimate(VehicleId, ClimateSettings),
    StopClimate(VehicleId),
}

/// Scripted outcome for one refresh call
#[derive(Debug, Clone)]
pub enum ScriptedRefresh {
    /// Deliver this snapshot
    Snapshot(VehicleSnapshot),
    /// Fail with an authentication error
    AuthenticationError,
    /// Fail with an upstream error
    UpstreamError,
}

/// In-memory stand-in for the owners gateway
#[derive(Default)]
pub struct MockAccountSession {
    vehicles: Mutex<Vec<VehicleInfo>>,
    fail_authentication: AtomicBool,
    refresh_script: Mutex<VecDeque<ScriptedRefresh>>,
    fallback_snapshot: Mutex<Option<VehicleSnapshot>>,
    refresh_calls: AtomicUsize,
    commands: Mutex<Vec<RecordedCommand>>,
}

impl MockAccountSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock with the given vehicles and an empty fallback snapshot, ready
    /// for a successful setup
    pub fn with_vehicles(vehicles: Vec<VehicleInfo>) -> Self {
        let mock = Self::new();
        *mock.vehicles.lock().expect("mock lock") = vehicles;
        *mock.fallback_snapshot.lock().expect("mock lock") = Some(VehicleSnapshot::default());
        mock
    }

    /// Make authenticate() fail until cleared
    pub fn set_fail_authentication(&self, fail: bool) {
        self.fail_authentication.store(fail, Ordering::SeqCst);
    }

    /// Queue the outcome of the next unscripted refresh call
    pub fn push_refresh(&self, outcome: ScriptedRefresh) {
        self.refresh_script
            .lock()
            .expect("mock lock")
            .push_back(outcome);
    }

    /// Snapshot delivered whenever the script queue is empty
    pub fn set_fallback_snapshot(&self, snapshot: VehicleSnapshot) {
        *self.fallback_snapshot.lock().expect("mock lock") = Some(snapshot);
    }

    /// How many times refresh_vehicle() was called
    pub fn refresh_call_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Every remote command received so far, in order
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.commands.lock().expect("mock lock").clone()
    }

    fn record(&self, command: RecordedCommand) {
        self.commands.lock().expect("mock lock").push(command);
    }
}

#[async_trait]
impl AccountSession for MockAccountSession {
    async fn authenticate(&self) -> ApiResult<()> {
        if self.fail_authentication.load(Ordering::SeqCst) {
            return Err(ApiError::Authentication(
                "mock credentials rejected".to_string(),
            ));
        }
        Ok(())
    }

    async fn fetch_vehicles(&self) -> ApiResult<Vec<VehicleInfo>> {
        Ok(self.vehicles.lock().expect("mock lock").clone())
    }

    async fn refresh_vehicle(&self, _vehicle_id: &VehicleId) -> ApiResult<VehicleSnapshot> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self.refresh_script.lock().expect("mock lock").pop_front();
        match scripted {
            Some(ScriptedRefresh::Snapshot(snapshot)) => {
                *self.fallback_snapshot.lock().expect("mock lock") = Some(snapshot.clone());
                Ok(snapshot)
            }
            Some(ScriptedRefresh::AuthenticationError) => Err(ApiError::Authentication(
                "mock session expired".to_string(),
            )),
            Some(ScriptedRefresh::UpstreamError) => {
                Err(ApiError::Upstream("mock service unavailable".to_string()))
            }
            None => self
                .fallback_snapshot
                .lock()
                .expect("mock lock")
                .clone()
                .ok_or_else(|| ApiError::Upstream("mock has no snapshot scripted".to_string())),
        }
    }

    async fn lock_doors(&self, vehicle_id: &VehicleId) -> ApiResult<()> {
        self.record(RecordedCommand::LockDoors(vehicle_id.clone()));
        Ok(())
    }

    async fn unlock_doors(&self, vehicle_id: &VehicleId) -> ApiResult<()> {
        self.record(RecordedCommand::UnlockDoors(vehicle_id.clone()));
        Ok(())
    }

    async fn start_climate(
        &self,
        vehicle_id: &VehicleId,
        settings: &ClimateSettings,
    ) -> ApiResult<()> {
        self.record(RecordedCommand::StartClimate(
            vehicle_id.clone(),
            settings.clone(),
        ));
        Ok(())
    }

    async fn stop_climate(&self, vehicle_id: &VehicleId) -> ApiResult<()> {
        self.record(RecordedCommand::StopClimate(vehicle_id.clone()));
        Ok(())
    }
}
