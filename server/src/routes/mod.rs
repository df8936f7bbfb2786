//! HTTP route handlers.
//!
//! Each sub-module corresponds to an API endpoint group. Everything under
//! `/api` goes through the [`mcp_servarr::Dispatcher`] and shares the
//! response shape built here: `200 {"result": text}` on success, otherwise
//! `{"error": text}` with a status derived from the [`ToolError`].

pub mod health;
pub mod media;
pub mod tools;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mcp_servarr::client::ClientError;
use mcp_servarr::ToolError;
use serde_json::{json, Value};

use crate::AppState;

/// HTTP status reported for a failed tool call.
pub fn status_for(err: &ToolError) -> StatusCode {
    match err {
        ToolError::UnknownTool(_) => StatusCode::NOT_FOUND,
        ToolError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ToolError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        ToolError::Backend {
            source: ClientError::Timeout(_),
            ..
        } => StatusCode::GATEWAY_TIMEOUT,
        ToolError::Backend { .. } => StatusCode::BAD_GATEWAY,
    }
}

/// Run one tool and wrap the outcome as a JSON response.
pub(crate) async fn run_tool(state: &AppState, name: &str, args: &Value) -> Response {
    match state.dispatcher.call(name, args).await {
        Ok(text) => Json(json!({ "result": text })).into_response(),
        Err(err) => {
            let status = status_for(&err);
            tracing::warn!(tool = name, status = status.as_u16(), error = %err, "tool call failed");
            error_response(status, &err.to_string())
        }
    }
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mcp_servarr::Service;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            status_for(&ToolError::UnknownTool("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ToolError::InvalidArgument("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ToolError::NotConfigured(Service::Radarr)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&ToolError::Backend {
                service: Service::Sonarr,
                source: ClientError::Timeout(Duration::from_secs(1)),
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&ToolError::Backend {
                service: Service::Sonarr,
                source: ClientError::Status {
                    status: 401,
                    message: "Unauthorized".into(),
                },
            }),
            StatusCode::BAD_GATEWAY
        );
    }
}
