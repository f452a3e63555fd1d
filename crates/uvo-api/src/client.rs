//! Reqwest-backed client for the Kia USA owners gateway

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use uvo_core::{ClimateSettings, VehicleId, VehicleInfo, VehicleSnapshot};

use crate::error::{ApiError, ApiResult};
use crate::payload::{
    LoginPayload, LoginRequest, RemoteClimateRequest, ResponseStatus, ServiceResponse,
    VehicleKeyRequest, VehicleListPayload, VehicleStatusPayload, VehicleSummary,
};
use crate::session::AccountSession;

/// Region discriminator the USA gateway expects
pub const REGION_USA: u8 = 3;

/// Brand discriminator for Kia
pub const BRAND_KIA: u8 = 1;

const BASE_URL: &str = "https://api.owners.kia.com/apigw/v1";
const CLIENT_ID: &str = "MWAMOBILE";
const APP_VERSION: &str = "7.12.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Session lifetime assumed when the gateway omits expiresIn
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Vendor status code for success
const STATUS_OK: i32 = 0;
/// Vendor status code for rejected credentials
const STATUS_INVALID_CREDENTIALS: i32 = 1003;
/// Vendor status code for an expired session id
const STATUS_SESSION_EXPIRED: i32 = 1004;

#[derive(Debug, Clone)]
struct SessionToken {
    session_id: String,
    expires_at: DateTime<Utc>,
}

impl SessionToken {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Map a vendor status envelope onto the error taxonomy
fn check_status(status: &ResponseStatus) -> ApiResult<()> {
    match status.status_code {
        STATUS_OK => Ok(()),
        STATUS_INVALID_CREDENTIALS | STATUS_SESSION_EXPIRED => Err(ApiError::Authentication(
            status
                .error_message
                .clone()
                .unwrap_or_else(|| "credentials rejected".to_string()),
        )),
        code => Err(ApiError::Upstream(format!(
            "status code {code}: {}",
            status.error_message.as_deref().unwrap_or("no message")
        ))),
    }
}

fn vehicle_from_summary(summary: VehicleSummary) -> ApiResult<VehicleInfo> {
    let id =
        VehicleId::new(summary.vehicle_key).map_err(|err| ApiError::Payload(err.to_string()))?;
    let name = summary
        .nickname
        .unwrap_or_else(|| summary.model_name.clone());
    let mut info = VehicleInfo::new(id, name, summary.model_name);
    if let Some(year) = summary.model_year.and_then(|y| y.parse().ok()) {
        info = info.with_year(year);
    }
    Ok(info)
}

/// Account session against the Kia USA owners gateway
///
/// One client per configured account. The session id is kept behind an
/// async RwLock and re-acquired on expiry; the per-vehicle coordinators
/// sharing this client add no locking of their own.
pub struct KiaOwnersClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token: RwLock<Option<SessionToken>>,
}

impl KiaOwnersClient {
    /// Create a client for the production gateway
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> ApiResult<Self> {
        Self::with_base_url(username, password, BASE_URL)
    }

    /// Create a client against an alternate gateway endpoint
    pub fn with_base_url(
        username: impl Into<String>,
        password: impl Into<String>,
        base_url: impl Into<String>,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            token: RwLock::new(None),
        })
    }

    fn apply_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("clientid", CLIENT_ID)
            .header("appversion", APP_VERSION)
            .header("apptype", "L")
            .header("from", "SPA")
            .header("language", "0")
            .header("ostype", "Android")
            .header("region", REGION_USA.to_string())
            .header("brand", BRAND_KIA.to_string())
    }

    async fn login(&self) -> ApiResult<SessionToken> {
        debug!("logging in to the owners service");
        let url = format!("{}/prof/authUser", self.base_url);
        let response = self
            .apply_headers(self.http.post(&url))
            .json(&LoginRequest {
                user_id: &self.username,
                password: &self.password,
            })
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(ApiError::Authentication("credentials rejected".to_string()));
        }
        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!("HTTP {}", response.status())));
        }

        let body: ServiceResponse<LoginPayload> = response.json().await?;
        check_status(&body.status)?;
        let payload = body
            .payload
            .ok_or_else(|| ApiError::Payload("login response missing payload".to_string()))?;

        let ttl = payload.expires_in_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS);
        Ok(SessionToken {
            session_id: payload.session_id,
            expires_at: Utc::now() + chrono::Duration::seconds(ttl as i64),
        })
    }

    /// Current session id, logging in again if the held one expired
    async fn session_id(&self) -> ApiResult<String> {
        {
            let token = self.token.read().await;
            if let Some(token) = token.as_ref() {
                if !token.is_expired() {
                    return Ok(token.session_id.clone());
                }
            }
        }

        let fresh = self.login().await?;
        let session_id = fresh.session_id.clone();
        *self.token.write().await = Some(fresh);
        Ok(session_id)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<Option<T>> {
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(ApiError::Authentication("session rejected".to_string()));
        }
        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!("HTTP {}", response.status())));
        }

        let body: ServiceResponse<T> = response.json().await?;
        check_status(&body.status)?;
        Ok(body.payload)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        let session_id = self.session_id().await?;
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .apply_headers(self.http.get(&url))
            .header("sid", session_id)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let session_id = self.session_id().await?;
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .apply_headers(self.http.post(&url))
            .header("sid", session_id)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Issue a remote command, discarding any acknowledgement payload
    async fn command<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let _: Option<serde_json::Value> = self.post(path, body).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountSession for KiaOwnersClient {
    async fn authenticate(&self) -> ApiResult<()> {
        let token = self.login().await?;
        *self.token.write().await = Some(token);
        info!("authenticated with the owners service");
        Ok(())
    }

    async fn fetch_vehicles(&self) -> ApiResult<Vec<VehicleInfo>> {
        let payload: Option<VehicleListPayload> = self.get("ownr/gvl").await?;
        let payload =
            payload.ok_or_else(|| ApiError::Payload("vehicle list missing payload".to_string()))?;

        let vehicles: Vec<VehicleInfo> = payload
            .vehicles
            .into_iter()
            .map(vehicle_from_summary)
            .collect::<ApiResult<_>>()?;
        debug!("account reports {} vehicle(s)", vehicles.len());
        Ok(vehicles)
    }

    async fn refresh_vehicle(&self, vehicle_id: &VehicleId) -> ApiResult<VehicleSnapshot> {
        debug!(vehicle = %vehicle_id, "fetching vehicle status");
        let payload: Option<VehicleStatusPayload> = self
            .post(
                "cmm/gvi",
                &VehicleKeyRequest {
                    vehicle_key: vehicle_id.as_str(),
                },
            )
            .await?;

        let report = payload
            .and_then(|p| p.report)
            .ok_or_else(|| ApiError::Payload("vehicle status missing report".to_string()))?;
        Ok(report.into_snapshot())
    }

    async fn lock_doors(&self, vehicle_id: &VehicleId) -> ApiResult<()> {
        info!(vehicle = %vehicle_id, "locking doors");
        self.command(
            "rems/door/lock",
            &VehicleKeyRequest {
                vehicle_key: vehicle_id.as_str(),
            },
        )
        .await
    }

    async fn unlock_doors(&self, vehicle_id: &VehicleId) -> ApiResult<()> {
        info!(vehicle = %vehicle_id, "unlocking doors");
        self.command(
            "rems/door/unlock",
            &VehicleKeyRequest {
                vehicle_key: vehicle_id.as_str(),
            },
        )
        .await
    }

    async fn start_climate(
        &self,
        vehicle_id: &VehicleId,
        settings: &ClimateSettings,
    ) -> ApiResult<()> {
        info!(
            vehicle = %vehicle_id,
            target = settings.target_temperature_f,
            defrost = settings.defrost,
            "starting remote climate"
        );
        let request = RemoteClimateRequest::new(vehicle_id.as_str(), settings);
        self.command("rems/start", &request).await
    }

    async fn stop_climate(&self, vehicle_id: &VehicleId) -> ApiResult<()> {
        info!(vehicle = %vehicle_id, "stopping remote climate");
        self.command(
            "rems/stop",
            &VehicleKeyRequest {
                vehicle_key: vehicle_id.as_str(),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: i32, message: Option<&str>) -> ResponseStatus {
        ResponseStatus {
            status_code: code,
            error_message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_check_status_ok() {
        assert!(check_status(&status(STATUS_OK, None)).is_ok());
    }

    #[test]
    fn test_check_status_authentication_codes() {
        for code in [STATUS_INVALID_CREDENTIALS, STATUS_SESSION_EXPIRED] {
            let err = check_status(&status(code, Some("expired"))).unwrap_err();
            assert!(err.is_authentication(), "code {code} should be auth");
        }
    }

    #[test]
    fn test_check_status_other_codes_are_upstream() {
        let err = check_status(&status(9999, Some("maintenance window"))).unwrap_err();
        assert!(matches!(err, ApiError::Upstream(msg) if msg.contains("maintenance window")));
    }

    #[test]
    fn test_vehicle_from_summary_nickname_fallback() {
        let summary = VehicleSummary {
            vehicle_key: "key-001".to_string(),
            nickname: None,
            model_name: "EV6".to_string(),
            model_year: Some("2024".to_string()),
        };
        let info = vehicle_from_summary(summary).unwrap();
        assert_eq!(info.name, "EV6");
        assert_eq!(info.model, "EV6");
        assert_eq!(info.year, Some(2024));
    }

    #[test]
    fn test_vehicle_from_summary_bad_key() {
        let summary = VehicleSummary {
            vehicle_key: String::new(),
            nickname: None,
            model_name: "EV6".to_string(),
            model_year: None,
        };
        assert!(matches!(
            vehicle_from_summary(summary),
            Err(ApiError::Payload(_))
        ));
    }

    #[test]
    fn test_session_token_expiry() {
        let expired = SessionToken {
            session_id: "sid".to_string(),
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        };
        assert!(expired.is_expired());

        let live = SessionToken {
            session_id: "sid".to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(60),
        };
        assert!(!live.is_expired());
    }
}
