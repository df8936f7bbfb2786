//! Optional bearer-token authentication for `/api/*`.
//!
//! When `[auth] api_key` (or `SERVARR_HTTP_API_KEY`) is set, every `/api/*`
//! request must carry `Authorization: Bearer <key>`. `/health` and `/ready`
//! stay open so orchestrators can probe the service.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// The shim's own bearer token, distinct from the Sonarr/Radarr keys.
/// [`crate::build_router`] installs it, and this middleware, only when a
/// key is configured; without one `/api/*` is served open.
#[derive(Clone)]
pub struct ApiKey(pub String);

/// Guards the tool routes. Failures use the same `{"error": ...}` body as
/// tool errors so REST clients handle a single shape:
/// 401 for no bearer token, 403 for the wrong one. A 500 means the layer was
/// mounted without its [`ApiKey`].
pub async fn require_api_key(request: Request, next: Next) -> Response {
    let Some(ApiKey(expected)) = request.extensions().get::<ApiKey>().cloned() else {
        tracing::error!("auth middleware installed without an ApiKey extension");
        return reject(StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error");
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(provided) = provided else {
        return reject(
            StatusCode::UNAUTHORIZED,
            "Missing or invalid Authorization header",
        );
    };

    if !constant_time_eq(expected.as_bytes(), provided.trim().as_bytes()) {
        tracing::debug!(path = %request.uri().path(), "rejected request with wrong API key");
        return reject(StatusCode::FORBIDDEN, "Invalid API key");
    }

    next.run(request).await
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Token comparison that touches every byte of the configured key.
pub fn constant_time_eq(expected: &[u8], provided: &[u8]) -> bool {
    let mut diff = u8::from(expected.len() != provided.len());
    for (i, byte) in expected.iter().enumerate() {
        diff |= byte ^ provided.get(i).copied().unwrap_or(0xff);
    }
    diff == 0
}
