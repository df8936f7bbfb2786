//! Per-service convenience routes.
//!
//! | Method | Path                                   | Tool                       |
//! |--------|----------------------------------------|----------------------------|
//! | GET    | `/api/{service}/recent?days=`          | `*_get_recent_*`           |
//! | GET    | `/api/{service}/calendar?days=`        | `*_get_calendar`           |
//! | GET    | `/api/{service}/search?query=`         | `*_search_series/movies`   |
//! | GET    | `/api/{service}/status`                | `*_get_system_status`      |
//! | GET    | `/api/{service}/queue`                 | `*_get_queue`              |
//! | POST   | `/api/sonarr/series/{id}/refresh`      | `sonarr_refresh_series`    |
//! | POST   | `/api/sonarr/series/{id}/search`       | `sonarr_search_episodes`   |
//! | POST   | `/api/radarr/movie/{id}/refresh`       | `radarr_refresh_movie`     |
//! | POST   | `/api/radarr/movie/{id}/search`        | `radarr_search_movie`      |

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use super::{error_response, run_tool};
use crate::AppState;

/// Query-string arguments. Everything arrives as text; `days` is turned into
/// a number when it parses as one (`7` or `7.0`, as over MCP) so the
/// dispatcher validates it.
#[derive(Debug, Default, Deserialize)]
pub struct ToolQuery {
    pub days: Option<String>,
    pub query: Option<String>,
}

impl ToolQuery {
    fn into_args(self) -> Value {
        let mut args = Map::new();
        if let Some(days) = self.days {
            let value = numeric(days.trim()).unwrap_or(Value::String(days));
            args.insert("days".into(), value);
        }
        if let Some(query) = self.query {
            args.insert("query".into(), Value::String(query));
        }
        Value::Object(args)
    }
}

/// Integers first, then finite floats. NaN and infinities stay text.
fn numeric(raw: &str) -> Option<Value> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(Value::from(n));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn read_tool(service: &str, view: &str) -> Option<&'static str> {
    Some(match (service, view) {
        ("sonarr", "recent") => "sonarr_get_recent_series",
        ("sonarr", "calendar") => "sonarr_get_calendar",
        ("sonarr", "search") => "sonarr_search_series",
        ("sonarr", "status") => "sonarr_get_system_status",
        ("sonarr", "queue") => "sonarr_get_queue",
        ("radarr", "recent") => "radarr_get_recent_movies",
        ("radarr", "calendar") => "radarr_get_calendar",
        ("radarr", "search") => "radarr_search_movies",
        ("radarr", "status") => "radarr_get_system_status",
        ("radarr", "queue") => "radarr_get_queue",
        _ => return None,
    })
}

/// `GET /api/{service}/{view}`
pub async fn read(
    State(state): State<AppState>,
    Path((service, view)): Path<(String, String)>,
    query: Result<Query<ToolQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid argument: {}", rejection.body_text()),
            )
        }
    };
    let Some(tool) = read_tool(&service, &view) else {
        return error_response(
            StatusCode::NOT_FOUND,
            &format!("No such endpoint: /api/{service}/{view}"),
        );
    };
    run_tool(&state, tool, &query.into_args()).await
}

/// `POST /api/sonarr/series/{id}/{action}`
pub async fn series_command(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    let tool = match action.as_str() {
        "refresh" => "sonarr_refresh_series",
        "search" => "sonarr_search_episodes",
        _ => return unknown_action(&action),
    };
    run_tool(&state, tool, &id_args("series_id", &id)).await
}

/// `POST /api/radarr/movie/{id}/{action}`
pub async fn movie_command(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    let tool = match action.as_str() {
        "refresh" => "radarr_refresh_movie",
        "search" => "radarr_search_movie",
        _ => return unknown_action(&action),
    };
    run_tool(&state, tool, &id_args("movie_id", &id)).await
}

/// Path ids that are not integers are passed through as strings and
/// rejected by the dispatcher with a 400.
fn id_args(name: &str, raw: &str) -> Value {
    let value = raw
        .parse::<i64>()
        .map_or_else(|_| Value::String(raw.to_string()), Value::from);
    let mut args = Map::new();
    args.insert(name.to_string(), value);
    Value::Object(args)
}

fn unknown_action(action: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        &format!("Unknown action '{action}', expected refresh or search"),
    )
}
