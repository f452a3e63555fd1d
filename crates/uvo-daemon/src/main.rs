//! Kia UVO polling daemon
//!
//! Loads the account configuration, sets the account up through the
//! manager, then sits on the coordinators' watch channels logging vehicle
//! state transitions until interrupted.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use uvo_account::{AccountEntry, AccountManager, SetupError};
use uvo_api::{KiaOwnersClient, SharedSession};
use uvo_coordinator::VehicleCoordinator;
use uvo_entities::{SensorKind, VehicleEntity, VehicleSensor};

mod config;
use config::DaemonConfig;

const DEFAULT_CONFIG_PATH: &str = "uvo.yaml";

/// Sensors the daemon reports on every snapshot change
const WATCHED_SENSORS: [SensorKind; 5] = [
    SensorKind::Odometer,
    SensorKind::FuelLevel,
    SensorKind::EvBatteryLevel,
    SensorKind::EvRange,
    SensorKind::LastSynced,
];

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = DaemonConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;

    let filter = config.log_filter.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("starting Kia UVO daemon");

    let manager = AccountManager::new();
    let entry = AccountEntry::new(
        format!("Kia USA Account ({})", config.username),
        &config.username,
        &config.password,
    )
    .with_scan_interval(config.scan_interval()?);
    let entry_id = manager.add(entry)?;

    let session: SharedSession =
        Arc::new(KiaOwnersClient::new(&config.username, &config.password)?);

    let handle = match manager.setup(&entry_id, Arc::clone(&session)).await {
        Ok(handle) => handle,
        Err(SetupError::AuthenticationFailed(detail)) => {
            bail!("authentication failed ({detail}); update the credentials in {config_path} and restart")
        }
        Err(SetupError::NoVehicles) => {
            bail!("the account holds no vehicles; nothing to poll")
        }
        Err(err) => return Err(err).context("account setup failed"),
    };

    info!(vehicles = handle.vehicle_count(), "daemon ready");

    let mut watchers = Vec::new();
    for coordinator in handle.coordinators() {
        watchers.push(tokio::spawn(watch_vehicle(Arc::clone(coordinator))));
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    for watcher in &watchers {
        watcher.abort();
    }
    manager.unload(handle).await?;

    Ok(())
}

/// Log state transitions for one vehicle through its sensor projections
async fn watch_vehicle(coordinator: Arc<VehicleCoordinator>) {
    let mut rx = coordinator.subscribe();
    let name = coordinator.vehicle().name.clone();
    let sensors: Vec<VehicleSensor> = WATCHED_SENSORS
        .into_iter()
        .map(|kind| VehicleSensor::new(kind, Arc::clone(&coordinator)))
        .collect();

    loop {
        if rx.changed().await.is_err() {
            break;
        }
        if !rx.borrow_and_update().last_update_success {
            warn!(vehicle = %name, "vehicle data stale, waiting for the next poll");
            continue;
        }
        info!(
            vehicle = %name,
            locked = ?coordinator.doors_locked(),
            hvac = ?coordinator.hvac_on(),
            "vehicle state updated"
        );
        for sensor in &sensors {
            info!(vehicle = %name, sensor = sensor.label(), value = %sensor.state(), "sensor");
        }
    }
}
