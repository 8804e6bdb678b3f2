//! PTZ API Routes

use crate::error::Result;
use crate::ptz_controller::{PtzAxis, PtzPosition, PtzResponse, SetAxisRequest, SetPositionRequest};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

/// GET /api/devices/:id/ptz
pub async fn get_position(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<PtzPosition>> {
    Ok(Json(state.ptz.position(&device_id).await?))
}

/// PUT /api/devices/:id/ptz/:axis
/// Updates the stored target only, the camera does not move
pub async fn set_axis(
    State(state): State<AppState>,
    Path((device_id, axis)): Path<(String, String)>,
    Json(request): Json<SetAxisRequest>,
) -> Result<Json<PtzPosition>> {
    let axis: PtzAxis = axis.parse()?;
    let position = state.ptz.set_axis(&device_id, axis, request.value).await?;
    Ok(Json(position))
}

/// POST /api/devices/:id/ptz/move
pub async fn move_to_target(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<PtzResponse>> {
    Ok(Json(state.ptz.move_to_target(&device_id).await?))
}

/// POST /api/devices/:id/ptz/position
pub async fn set_position(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(request): Json<SetPositionRequest>,
) -> Result<Json<PtzResponse>> {
    let response = state
        .ptz
        .set_position(&device_id, request.h, request.v, request.z)
        .await?;
    Ok(Json(response))
}
