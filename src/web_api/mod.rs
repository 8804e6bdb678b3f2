//! WebAPI - command façade
//!
//! ## Responsibilities
//!
//! - Map user-facing commands (set_position, define/save/call preset,
//!   register device) onto the services
//! - Request validation
//! - Response formatting

mod device_routes;
mod preset_routes;
mod ptz_routes;
mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::OnceLock;
use std::time::Instant;

use crate::models::HealthResponse;
use crate::state::AppState;

fn started_at() -> Instant {
    static STARTED: OnceLock<Instant> = OnceLock::new();
    *STARTED.get_or_init(Instant::now)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now().timestamp();
    let token_valid = state
        .tokens
        .expires_at()
        .await
        .map(|exp| now < exp)
        .unwrap_or(false);

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_sec: started_at().elapsed().as_secs(),
        token_valid,
        device_count: state.devices.list().await.len(),
    })
}

/// Mark process start for uptime reporting
pub fn mark_started() {
    let _ = started_at();
}
