//! Preset API Routes

use crate::error::Result;
use crate::models::ApiResponse;
use crate::preset_store::{DefinePresetRequest, Preset};
use crate::ptz_controller::PtzResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// GET /api/devices/:id/presets
pub async fn list_presets(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Preset>>>> {
    state.devices.require(&device_id).await?;
    let presets = state.presets.list_presets(&device_id).await;
    Ok(Json(ApiResponse::success(presets)))
}

/// PUT /api/devices/:id/presets/:name
pub async fn define_preset(
    State(state): State<AppState>,
    Path((device_id, name)): Path<(String, String)>,
    Json(request): Json<DefinePresetRequest>,
) -> Result<Json<ApiResponse<Preset>>> {
    let preset = state
        .presets
        .define_preset(&device_id, &name, request.position())
        .await?;
    Ok(Json(ApiResponse::success(preset)))
}

/// POST /api/devices/:id/presets/:name/save
pub async fn save_preset(
    State(state): State<AppState>,
    Path((device_id, name)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Preset>>> {
    let preset = state.presets.save_preset(&device_id, &name).await?;
    Ok(Json(ApiResponse::success(preset)))
}

/// POST /api/devices/:id/presets/:name/call
pub async fn call_preset(
    State(state): State<AppState>,
    Path((device_id, name)): Path<(String, String)>,
) -> Result<Json<PtzResponse>> {
    Ok(Json(state.presets.call_preset(&device_id, &name).await?))
}

/// DELETE /api/devices/:id/presets/:name
pub async fn delete_preset(
    State(state): State<AppState>,
    Path((device_id, name)): Path<(String, String)>,
) -> Result<StatusCode> {
    state.presets.delete_preset(&device_id, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
