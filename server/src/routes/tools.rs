//! Generic tool endpoints mirroring MCP `tools/list` and `tools/call`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde_json::{json, Value};

use super::{error_response, run_tool};
use crate::AppState;

/// `GET /api/tools`: definitions of the tools whose backend is configured.
pub async fn list(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "tools": state.dispatcher.tool_definitions() }))
}

/// `POST /api/tools/{name}`: body is the JSON argument object (may be empty).
pub async fn call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(v @ Value::Object(_)) => v,
            Ok(Value::Null) => json!({}),
            Ok(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "Invalid argument: request body must be a JSON object",
                )
            }
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Invalid argument: body is not valid JSON: {e}"),
                )
            }
        }
    };
    run_tool(&state, &name, &args).await
}
