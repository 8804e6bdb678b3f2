//! API Routes

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use super::{device_routes, preset_routes, ptz_routes};
use crate::models::ApiResponse;
use crate::state::AppState;
use crate::usage_tracker::UsageSnapshot;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Devices
        .route(
            "/api/devices",
            get(device_routes::list_devices).post(device_routes::register_device),
        )
        .route("/api/devices/discover", post(device_routes::discover_devices))
        // PTZ
        .route("/api/devices/:id/ptz", get(ptz_routes::get_position))
        .route("/api/devices/:id/ptz/move", post(ptz_routes::move_to_target))
        .route("/api/devices/:id/ptz/position", post(ptz_routes::set_position))
        .route("/api/devices/:id/ptz/:axis", put(ptz_routes::set_axis))
        // Presets
        .route("/api/devices/:id/presets", get(preset_routes::list_presets))
        .route(
            "/api/devices/:id/presets/:name",
            put(preset_routes::define_preset).delete(preset_routes::delete_preset),
        )
        .route(
            "/api/devices/:id/presets/:name/save",
            post(preset_routes::save_preset),
        )
        .route(
            "/api/devices/:id/presets/:name/call",
            post(preset_routes::call_preset),
        )
        // Account
        .route("/api/usage", get(get_usage))
        .route("/api/token/invalidate", post(invalidate_token))
        .with_state(state)
}

/// GET /api/usage
async fn get_usage(State(state): State<AppState>) -> Json<ApiResponse<UsageSnapshot>> {
    Json(ApiResponse::success(state.usage.snapshot().await))
}

/// POST /api/token/invalidate
async fn invalidate_token(State(state): State<AppState>) -> StatusCode {
    state.tokens.invalidate().await;
    tracing::info!("Access token invalidated via API");
    StatusCode::NO_CONTENT
}
