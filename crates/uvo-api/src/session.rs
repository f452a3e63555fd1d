//! The account session seam
//!
//! One session per configured account; shared by every per-vehicle
//! coordinator on that account. The session owns credentials and token
//! state internally, so callers never add locking of their own.

use async_trait::async_trait;
use std::sync::Arc;

use uvo_core::{ClimateSettings, VehicleId, VehicleInfo, VehicleSnapshot};

use crate::error::ApiResult;

/// Operations the owners service exposes for one account
#[async_trait]
pub trait AccountSession: Send + Sync {
    /// Log in (or refresh the session token) with the stored credentials
    async fn authenticate(&self) -> ApiResult<()>;

    /// List every vehicle on the account
    async fn fetch_vehicles(&self) -> ApiResult<Vec<VehicleInfo>>;

    /// Fetch the current cached state of a single vehicle
    async fn refresh_vehicle(&self, vehicle_id: &VehicleId) -> ApiResult<VehicleSnapshot>;

    /// Remotely lock the doors
    async fn lock_doors(&self, vehicle_id: &VehicleId) -> ApiResult<()>;

    /// Remotely unlock the doors
    async fn unlock_doors(&self, vehicle_id: &VehicleId) -> ApiResult<()>;

    /// Start remote climate with the given settings
    async fn start_climate(
        &self,
        vehicle_id: &VehicleId,
        settings: &ClimateSettings,
    ) -> ApiResult<()>;

    /// Stop remote climate
    async fn stop_climate(&self, vehicle_id: &VehicleId) -> ApiResult<()>;
}

/// Shared handle to an account session
pub type SharedSession = Arc<dyn AccountSession>;
