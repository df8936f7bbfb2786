//! Tool dispatch.
//!
//! [`Dispatcher`] owns one [`ServiceClient`] per configured backend and turns
//! a tool invocation into text:
//!
//! ```text
//! lookup (registry) -> validate args -> resolve client -> backend call(s) -> format
//! ```
//!
//! Any step may fail with a [`ToolError`]. [`Dispatcher::invoke`] converts
//! those into an `Error: ...` text result so callers never see a raw fault;
//! [`Dispatcher::call`] keeps the typed error for transports that map it to a
//! status code.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::client::{ClientError, ServiceClient};
use crate::config::{ConfigError, ResolvedConfig, Service};
use crate::format::{self, View};
use crate::registry::{self, Tool, ToolDefinition};

/// Largest accepted look-back / look-ahead window.
pub const MAX_DAYS: u32 = 3650;

/// Source of the current time. Swappable so date windows are testable.
pub type Clock = fn() -> DateTime<Utc>;

/// Everything that can go wrong while serving one tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} is not configured")]
    NotConfigured(Service),
    #[error("{service} request failed: {source}")]
    Backend {
        service: Service,
        #[source]
        source: ClientError,
    },
}

/// Result of a tool call, ready to be wrapped by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
    /// Whether the tool call failed (maps to `isError` in the MCP response).
    pub is_error: bool,
}

impl ToolResult {
    fn success(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn error(err: &ToolError) -> Self {
        Self {
            text: format!("Error: {err}"),
            is_error: true,
        }
    }

    /// MCP content blocks for this result.
    pub fn content(&self) -> Vec<Value> {
        vec![json!({ "type": "text", "text": self.text })]
    }
}

/// Routes tool invocations to the Sonarr/Radarr backends.
pub struct Dispatcher {
    sonarr: Option<ServiceClient>,
    radarr: Option<ServiceClient>,
    clock: Clock,
}

impl Dispatcher {
    /// Build one HTTP client per configured backend.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, ConfigError> {
        let build = |service: Service| {
            config
                .endpoint(service)
                .map(ServiceClient::new)
                .transpose()
                .map_err(ConfigError::HttpClient)
        };
        Ok(Self {
            sonarr: build(Service::Sonarr)?,
            radarr: build(Service::Radarr)?,
            clock: Utc::now,
        })
    }

    /// Replace the time source (tests pin "now" to a fixed instant).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_configured(&self, service: Service) -> bool {
        self.client(service).is_ok()
    }

    /// Definitions of the tools whose backend is configured, in registry order.
    pub fn tools(&self) -> impl Iterator<Item = &'static ToolDefinition> + '_ {
        registry::list_tools()
            .iter()
            .filter(|def| self.is_configured(def.service))
    }

    /// JSON descriptors for `tools/list`.
    pub fn tool_definitions(&self) -> Vec<Value> {
        self.tools().map(ToolDefinition::to_json).collect()
    }

    /// Invoke a tool, converting every failure into an error text result.
    pub async fn invoke(&self, name: &str, args: &Value) -> ToolResult {
        match self.call(name, args).await {
            Ok(text) => ToolResult::success(text),
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "tool call failed");
                ToolResult::error(&err)
            }
        }
    }

    /// Invoke a tool, returning the typed error on failure.
    pub async fn call(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        let def = registry::lookup(name)?;
        tracing::debug!(tool = def.name, "dispatching tool call");
        let now = (self.clock)();

        match def.tool {
            Tool::SonarrRecentSeries | Tool::RadarrRecentMovies => {
                let days = days_arg(def, args)?;
                let client = self.client(def.service)?;
                let path = if def.tool == Tool::SonarrRecentSeries {
                    "series"
                } else {
                    "movie"
                };
                let payload = fetch(client, path, &[]).await?;
                let cutoff = now - Duration::days(i64::from(days));
                let view = if def.tool == Tool::SonarrRecentSeries {
                    View::RecentSeries { days, cutoff }
                } else {
                    View::RecentMovies { days, cutoff }
                };
                Ok(format::render(&view, &payload))
            }
            Tool::SonarrCalendar | Tool::RadarrCalendar => {
                let days = days_arg(def, args)?;
                let client = self.client(def.service)?;
                let end = now + Duration::days(i64::from(days));
                let mut query = vec![("start", timestamp(now)), ("end", timestamp(end))];
                let view = if def.tool == Tool::SonarrCalendar {
                    query.push(("includeSeries", "true".to_string()));
                    View::SeriesCalendar { days }
                } else {
                    View::MovieCalendar { days }
                };
                let payload = fetch(client, "calendar", &query).await?;
                Ok(format::render(&view, &payload))
            }
            Tool::SonarrSearchSeries | Tool::RadarrSearchMovies => {
                let query = string_arg(def, args, "query")?;
                let client = self.client(def.service)?;
                let (path, view) = if def.tool == Tool::SonarrSearchSeries {
                    ("series", View::SeriesSearch { query: &query })
                } else {
                    ("movie", View::MovieSearch { query: &query })
                };
                let payload = fetch(client, path, &[]).await?;
                Ok(format::render(&view, &payload))
            }
            Tool::SonarrSystemStatus | Tool::RadarrSystemStatus => {
                let client = self.client(def.service)?;
                let status = fetch(client, "system/status", &[]).await?;
                let diskspace = fetch(client, "diskspace", &[]).await?;
                let payload = json!({ "status": status, "diskspace": diskspace });
                Ok(format::render(
                    &View::SystemStatus {
                        service: def.service,
                    },
                    &payload,
                ))
            }
            Tool::SonarrQueue => {
                let client = self.client(def.service)?;
                let query = [
                    ("includeSeries", "true".to_string()),
                    ("includeEpisode", "true".to_string()),
                ];
                let payload = fetch(client, "queue", &query).await?;
                Ok(format::render(&View::SeriesQueue, &payload))
            }
            Tool::RadarrQueue => {
                let client = self.client(def.service)?;
                let query = [("includeMovie", "true".to_string())];
                let payload = fetch(client, "queue", &query).await?;
                Ok(format::render(&View::MovieQueue, &payload))
            }
            Tool::SonarrRefreshSeries | Tool::SonarrSearchEpisodes => {
                let id = id_arg(def, args, "series_id")?;
                let client = self.client(def.service)?;
                let (command, action) = if def.tool == Tool::SonarrRefreshSeries {
                    ("RefreshSeries", "Refresh")
                } else {
                    ("SeriesSearch", "Episode search")
                };
                let body = json!({ "name": command, "seriesId": id });
                let payload = command_post(client, &body).await?;
                Ok(format::render(
                    &View::Command {
                        action,
                        subject: "series",
                        id,
                    },
                    &payload,
                ))
            }
            Tool::RadarrRefreshMovie | Tool::RadarrSearchMovie => {
                let id = id_arg(def, args, "movie_id")?;
                let client = self.client(def.service)?;
                let (command, action) = if def.tool == Tool::RadarrRefreshMovie {
                    ("RefreshMovie", "Refresh")
                } else {
                    ("MoviesSearch", "Search")
                };
                let body = json!({ "name": command, "movieIds": [id] });
                let payload = command_post(client, &body).await?;
                Ok(format::render(
                    &View::Command {
                        action,
                        subject: "movie",
                        id,
                    },
                    &payload,
                ))
            }
        }
    }

    fn client(&self, service: Service) -> Result<&ServiceClient, ToolError> {
        let client = match service {
            Service::Sonarr => self.sonarr.as_ref(),
            Service::Radarr => self.radarr.as_ref(),
        };
        client.ok_or(ToolError::NotConfigured(service))
    }
}

async fn fetch(
    client: &ServiceClient,
    path: &str,
    query: &[(&str, String)],
) -> Result<Value, ToolError> {
    client
        .get(path, query)
        .await
        .map_err(|source| ToolError::Backend {
            service: client.service(),
            source,
        })
}

async fn command_post(client: &ServiceClient, body: &Value) -> Result<Value, ToolError> {
    client
        .post("command", body)
        .await
        .map_err(|source| ToolError::Backend {
            service: client.service(),
            source,
        })
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Argument object of an invocation; `null` or a missing object means "no arguments".
fn arg<'a>(args: &'a Value, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|v| !v.is_null())
}

/// Accept JSON integers and integral floats (some agents send `7.0`).
fn as_whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

fn days_arg(def: &ToolDefinition, args: &Value) -> Result<u32, ToolError> {
    let default = def.param("days").and_then(|p| p.default).unwrap_or(7);
    let Some(value) = arg(args, "days") else {
        return Ok(default);
    };
    as_whole_number(value)
        .and_then(|d| u32::try_from(d).ok())
        .filter(|d| (1..=MAX_DAYS).contains(d))
        .ok_or_else(|| {
            ToolError::InvalidArgument(format!(
                "days must be an integer between 1 and {MAX_DAYS}, got {value}"
            ))
        })
}

fn id_arg(def: &ToolDefinition, args: &Value, name: &str) -> Result<u64, ToolError> {
    let value = arg(args, name).ok_or_else(|| missing(def, name))?;
    as_whole_number(value)
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ToolError::InvalidArgument(format!("{name} must be a positive integer, got {value}"))
        })
}

fn string_arg(def: &ToolDefinition, args: &Value, name: &str) -> Result<String, ToolError> {
    let value = arg(args, name).ok_or_else(|| missing(def, name))?;
    match value.as_str().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        Some(_) => Err(ToolError::InvalidArgument(format!("{name} must not be empty"))),
        None => Err(ToolError::InvalidArgument(format!("{name} must be a string"))),
    }
}

fn missing(def: &ToolDefinition, name: &str) -> ToolError {
    ToolError::InvalidArgument(format!(
        "missing required parameter '{name}' for {}",
        def.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::lookup;

    #[test]
    fn days_defaults_per_tool() {
        let args = json!({});
        assert_eq!(days_arg(lookup("sonarr_get_calendar").unwrap(), &args).unwrap(), 7);
        assert_eq!(days_arg(lookup("radarr_get_calendar").unwrap(), &args).unwrap(), 30);
        assert_eq!(
            days_arg(lookup("radarr_get_calendar").unwrap(), &Value::Null).unwrap(),
            30
        );
    }

    #[test]
    fn days_accepts_integral_floats() {
        let def = lookup("sonarr_get_recent_series").unwrap();
        assert_eq!(days_arg(def, &json!({"days": 14})).unwrap(), 14);
        assert_eq!(days_arg(def, &json!({"days": 14.0})).unwrap(), 14);
    }

    #[test]
    fn days_rejects_out_of_range_and_wrong_types() {
        let def = lookup("sonarr_get_recent_series").unwrap();
        for bad in [json!(0), json!(-3), json!(2.5), json!("7"), json!(MAX_DAYS + 1)] {
            assert!(
                matches!(days_arg(def, &json!({ "days": bad.clone() })), Err(ToolError::InvalidArgument(_))),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn id_is_required_and_positive() {
        let def = lookup("radarr_refresh_movie").unwrap();
        assert_eq!(id_arg(def, &json!({"movie_id": 12}), "movie_id").unwrap(), 12);
        let err = id_arg(def, &json!({}), "movie_id").unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'movie_id'"));
        assert!(id_arg(def, &json!({"movie_id": 0}), "movie_id").is_err());
        assert!(id_arg(def, &json!({"movie_id": "12"}), "movie_id").is_err());
    }

    #[test]
    fn query_must_be_non_blank_string() {
        let def = lookup("sonarr_search_series").unwrap();
        assert_eq!(
            string_arg(def, &json!({"query": "  Office "}), "query").unwrap(),
            "Office"
        );
        assert!(string_arg(def, &json!({"query": "   "}), "query").is_err());
        assert!(string_arg(def, &json!({"query": 5}), "query").is_err());
        assert!(string_arg(def, &json!({"query": null}), "query").is_err());
    }

    #[test]
    fn error_result_is_prefixed() {
        let result = ToolResult::error(&ToolError::NotConfigured(Service::Radarr));
        assert!(result.is_error);
        assert_eq!(result.text, "Error: Radarr is not configured");
        assert_eq!(result.content()[0]["type"], "text");
    }
}
