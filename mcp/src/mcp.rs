//! MCP (Model Context Protocol) JSON-RPC handler.
//!
//! Implements the [MCP specification](https://spec.modelcontextprotocol.io/)
//! over stdio: reads JSON-RPC 2.0 requests from stdin (one per line) and
//! writes responses to stdout.
//!
//! ## Supported methods
//!
//! | Method              | Description                      |
//! |---------------------|----------------------------------|
//! | `initialize`        | Handshake, returns capabilities  |
//! | `tools/list`        | List available tool definitions  |
//! | `tools/call`        | Execute a tool and return result |
//! | `ping`              | Liveness check                   |
//!
//! Notifications (`notifications/initialized`, `notifications/cancelled`) are
//! acknowledged silently.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::tools::Dispatcher;

const SERVER_NAME: &str = "mcp-servarr";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Run the MCP server on stdio, processing JSON-RPC requests until EOF.
pub async fn run_stdio(dispatcher: &Dispatcher) {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    serve(dispatcher, reader, writer).await;
}

/// Serve JSON-RPC over any line-oriented reader/writer pair until EOF.
pub async fn serve<R, W>(dispatcher: &Dispatcher, mut reader: R, mut writer: W)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // Raw bytes: a non-UTF-8 line is a parse error, not a read error.
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                tracing::error!("stdin read error: {e}");
                break;
            }
        }

        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_slice::<Value>(trimmed) {
            Ok(request) => handle_message(dispatcher, &request).await,
            Err(e) => Some(json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {
                    "code": -32700,
                    "message": format!("Parse error: {e}")
                }
            })),
        };

        if let Some(response) = response {
            write_response(&mut writer, &response).await;
        }
    }
}

/// Handle one decoded JSON-RPC message. Returns `None` for notifications.
pub async fn handle_message(dispatcher: &Dispatcher, request: &Value) -> Option<Value> {
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    // Notifications (no id) get no response
    let Some(id) = request.get("id").cloned() else {
        match method {
            "notifications/initialized" | "notifications/cancelled" => {}
            _ => tracing::debug!("ignoring unknown notification: {method}"),
        }
        return None;
    };

    let response = match method {
        "initialize" => handle_initialize(),
        "tools/list" => json!({
            "jsonrpc": "2.0",
            "result": { "tools": dispatcher.tool_definitions() }
        }),
        "tools/call" => handle_tools_call(request, dispatcher).await,
        "ping" => json!({ "jsonrpc": "2.0", "result": {} }),
        _ => json!({
            "jsonrpc": "2.0",
            "error": {
                "code": -32601,
                "message": format!("Method not found: {method}")
            }
        }),
    };

    Some(inject_id(response, id))
}

/// `initialize`: return protocol version, capabilities, and server info.
fn handle_initialize() -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": {
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            }
        }
    })
}

/// `tools/call`: dispatch to the tool and wrap the text result.
async fn handle_tools_call(request: &Value, dispatcher: &Dispatcher) -> Value {
    let params = request.get("params").cloned().unwrap_or(json!({}));
    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    let result = dispatcher.invoke(name, &args).await;

    let mut response_result = json!({
        "content": result.content()
    });
    if result.is_error {
        response_result["isError"] = json!(true);
    }

    json!({
        "jsonrpc": "2.0",
        "result": response_result
    })
}

/// Inject the request `id` into a response object.
fn inject_id(mut response: Value, id: Value) -> Value {
    response["id"] = id;
    response
}

/// Write a JSON-RPC response (one line, flushed immediately).
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Value) {
    let mut output = response.to_string();
    output.push('\n');
    if let Err(e) = writer.write_all(output.as_bytes()).await {
        tracing::error!("stdout write error: {e}");
    }
    if let Err(e) = writer.flush().await {
        tracing::error!("stdout flush error: {e}");
    }
}
