//! HTTP API for Kamero licensing.
//!
//! | Route                     | Operation                          |
//! |---------------------------|------------------------------------|
//! | `GET  /api/auth/key/device` | this machine's device id         |
//! | `GET  /api/auth/key`        | issue today's key                |
//! | `POST /api/auth/activate`   | activate a key                   |
//! | `GET  /api/auth/access`     | invalidate if the device changed |
//! | `GET  /api/auth/test`       | the stored license record        |

mod error;

pub use error::{ApiError, ApiErrorResponse};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use kamero_db::Database;
use kamero_license::{
    AccessMonitor, ActivationGate, FingerprintSource, LicenseConfig, LicenseError, LicenseResult,
    LicenseState, LicenseStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state behind every route.
pub struct AppState {
    gate: ActivationGate<Arc<Database>, Arc<Database>>,
    monitor: AccessMonitor<Arc<Database>>,
    device: Arc<dyn FingerprintSource>,
}

impl AppState {
    /// Builds the state over `db`, which is both the license store and the
    /// business data wiped on a new key.
    pub fn new(
        db: Arc<Database>,
        config: LicenseConfig,
        device: Arc<dyn FingerprintSource>,
    ) -> Self {
        Self {
            gate: ActivationGate::new(Arc::clone(&db))
                .with_reset(Arc::clone(&db))
                .with_config(config),
            monitor: AccessMonitor::new(db),
            device,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub device_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub success: bool,
    pub message: String,
    pub key: String,
    pub device_id: String,
    pub expires_at: DateTime<Utc>,
    pub reissued: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub app_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivateResponse {
    pub success: bool,
    pub message: String,
    /// `dd/mm/yyyy`
    pub original_date: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccessResponse {
    pub success: bool,
}

/// The stored record, in the column names the UI already reads.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub key: Option<String>,
    pub app_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub state: LicenseState,
}

/// Runs a store-touching closure off the async runtime.
async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> LicenseResult<T> + Send + 'static,
{
    let state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| LicenseError::Internal(format!("blocking task failed: {e}")))?;
    Ok(result?)
}

async fn device_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let device = blocking(&state, |s| Ok(s.device.fingerprint())).await?;
    Ok(Json(DeviceResponse {
        device_id: device.id().to_string(),
    }))
}

async fn issue_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IssueResponse>, ApiError> {
    let issued = blocking(&state, |s| s.gate.issue(&s.device.fingerprint())).await?;
    let message = if issued.reissued {
        "Key already exists"
    } else {
        "Key generated"
    };
    Ok(Json(IssueResponse {
        success: true,
        message: message.to_string(),
        key: issued.key,
        device_id: issued.device_id,
        expires_at: issued.expires_at,
        reissued: issued.reissued,
    }))
}

async fn activate_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ActivateRequest>, JsonRejection>,
) -> Result<Json<ActivateResponse>, ApiError> {
    // an unreadable body is treated like one with both fields missing
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let activation = blocking(&state, move |s| {
        s.gate
            .activate(&request.key, &request.app_id, &s.device.fingerprint())
    })
    .await?;

    Ok(Json(ActivateResponse {
        success: true,
        message: "App activated successfully".to_string(),
        original_date: activation.original_date.format("%d/%m/%Y").to_string(),
        expires_at: activation.expires_at,
    }))
}

async fn access_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AccessResponse>, ApiError> {
    blocking(&state, |s| s.monitor.check(&s.device.fingerprint())).await?;
    Ok(Json(AccessResponse { success: true }))
}

async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let record = blocking(&state, |s| s.gate.store().load()).await?;
    Ok(Json(StatusResponse {
        state: record.state(Utc::now()),
        key: record.key,
        app_id: record.bound_device_id,
        expires_at: record.expires_at,
        used: record.activated,
    }))
}

/// Build the HTTP API router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/key/device", get(device_handler))
        .route("/api/auth/key", get(issue_handler))
        .route("/api/auth/activate", post(activate_handler))
        .route("/api/auth/access", get(access_handler))
        .route("/api/auth/test", get(status_handler))
        .with_state(state)
}
