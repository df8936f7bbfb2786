//! Unauthenticated liveness and readiness endpoints.

use axum::{extract::State, Json};
use mcp_servarr::Service;
use serde_json::{json, Value};

use crate::AppState;

/// `GET /health`: liveness probe with version and uptime.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// `GET /ready`: reports which backends the dispatcher can reach.
///
/// Backends are not contacted; a configured backend that is down still
/// reports as configured.
pub async fn ready(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ready",
        "sonarr_configured": state.dispatcher.is_configured(Service::Sonarr),
        "radarr_configured": state.dispatcher.is_configured(Service::Radarr),
    }))
}
