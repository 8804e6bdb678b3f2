//! Device API Routes

use crate::device_registry::Device;
use crate::error::Result;
use crate::models::ApiResponse;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Register device request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDeviceRequest {
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterDeviceResponse {
    pub device_id: String,
    /// false when the device was already known
    pub added: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoverResponse {
    pub added: usize,
    pub total: usize,
}

/// GET /api/devices
pub async fn list_devices(State(state): State<AppState>) -> Json<ApiResponse<Vec<Device>>> {
    Json(ApiResponse::success(state.devices.list().await))
}

/// POST /api/devices
pub async fn register_device(
    State(state): State<AppState>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<Json<ApiResponse<RegisterDeviceResponse>>> {
    let device_id = request.device_id.trim().to_string();
    let added = state
        .devices
        .register(Device {
            device_id: device_id.clone(),
            name: request.name,
            model: request.model,
        })
        .await?;
    Ok(Json(ApiResponse::success(RegisterDeviceResponse {
        device_id,
        added,
    })))
}

/// POST /api/devices/discover
pub async fn discover_devices(
    State(state): State<AppState>,
) -> Json<ApiResponse<DiscoverResponse>> {
    let added = state.devices.discover(&state.api).await;
    let total = state.devices.list().await.len();
    Json(ApiResponse::success(DiscoverResponse { added, total }))
}
