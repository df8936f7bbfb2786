//! Configuration loading for mcp-servarr.
//!
//! Backend settings are resolved from two layered sources:
//!
//! 1. **JSON file** via `--config <path>` CLI flag, or the `SERVARR_CONFIG`
//!    environment variable when the flag is absent
//! 2. **Environment variables**: `SONARR_URL`, `SONARR_API_KEY`,
//!    `RADARR_URL`, `RADARR_API_KEY`, `REQUEST_TIMEOUT` (seconds). Values
//!    set here override the file.
//!
//! ```json
//! {
//!   "sonarr": { "url": "http://sonarr:8989", "api_key": "..." },
//!   "radarr": { "url": "http://radarr:7878", "api_key": "..." },
//!   "request_timeout_secs": 30
//! }
//! ```
//!
//! Either backend may be omitted, but at least one must be configured.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

/// Request timeout applied when neither the file nor `REQUEST_TIMEOUT` sets one.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// CLI arguments parsed by `clap`.
#[derive(Parser)]
#[command(name = "mcp-servarr", version, about = "MCP server for Sonarr and Radarr")]
pub struct Cli {
    /// Path to backend config file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// The two backend services this adapter fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Sonarr,
    Radarr,
}

impl Service {
    /// Lowercase identifier used in tool names and REST paths.
    pub fn id(self) -> &'static str {
        match self {
            Service::Sonarr => "sonarr",
            Service::Radarr => "radarr",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Sonarr => f.write_str("Sonarr"),
            Service::Radarr => f.write_str("Radarr"),
        }
    }
}

/// Raw, unvalidated backend configuration (file contents plus env overlay).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServarrConfig {
    pub sonarr: Option<ServiceEntry>,
    pub radarr: Option<ServiceEntry>,
    pub request_timeout_secs: Option<u64>,
}

/// A single backend entry. Both fields must be set for the backend to count
/// as configured.
#[derive(Clone, Default, Deserialize)]
pub struct ServiceEntry {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("url", &self.url)
            .field("api_key", &redacted(&self.api_key))
            .finish()
    }
}

/// Placeholder shown in `Debug` output instead of a key.
pub fn redacted(key: &str) -> &'static str {
    if key.is_empty() {
        ""
    } else {
        "[redacted]"
    }
}

/// Validated connection settings for one backend.
#[derive(Clone)]
pub struct ServiceEndpoint {
    pub service: Service,
    /// Base URL without trailing slash, e.g. `http://sonarr:8989`.
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl fmt::Debug for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEndpoint")
            .field("service", &self.service)
            .field("base_url", &self.base_url)
            .field("api_key", &redacted(&self.api_key))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Validated configuration ready for use by the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub sonarr: Option<ServiceEndpoint>,
    pub radarr: Option<ServiceEndpoint>,
}

impl ResolvedConfig {
    pub fn endpoint(&self, service: Service) -> Option<&ServiceEndpoint> {
        match service {
            Service::Sonarr => self.sonarr.as_ref(),
            Service::Radarr => self.radarr.as_ref(),
        }
    }
}

/// Fatal startup errors. Never reported to a tool caller.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{0}")]
    Invalid(String),
    #[error("no backend configured: set SONARR_URL/SONARR_API_KEY and/or RADARR_URL/RADARR_API_KEY")]
    NoBackends,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl ServarrConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Overlay environment variables on top of the current values.
    ///
    /// `lookup` abstracts `std::env::var` so tests can supply their own map.
    /// Empty variables are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        for (service, url_var, key_var) in [
            (Service::Sonarr, "SONARR_URL", "SONARR_API_KEY"),
            (Service::Radarr, "RADARR_URL", "RADARR_API_KEY"),
        ] {
            let url = get(url_var);
            let api_key = get(key_var);
            if url.is_none() && api_key.is_none() {
                continue;
            }
            let slot = match service {
                Service::Sonarr => &mut self.sonarr,
                Service::Radarr => &mut self.radarr,
            };
            let entry = slot.get_or_insert_with(ServiceEntry::default);
            if let Some(url) = url {
                entry.url = url;
            }
            if let Some(api_key) = api_key {
                entry.api_key = api_key;
            }
        }

        if let Some(raw) = get("REQUEST_TIMEOUT") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::Invalid(format!(
                    "REQUEST_TIMEOUT must be a whole number of seconds, got '{raw}'"
                ))
            })?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// Validate and convert into per-service endpoints.
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let secs = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if secs == 0 {
            return Err(ConfigError::Invalid(
                "request timeout must be at least 1 second".into(),
            ));
        }
        let timeout = Duration::from_secs(secs);

        let resolved = ResolvedConfig {
            sonarr: resolve_entry(Service::Sonarr, self.sonarr, timeout)?,
            radarr: resolve_entry(Service::Radarr, self.radarr, timeout)?,
        };
        if resolved.sonarr.is_none() && resolved.radarr.is_none() {
            return Err(ConfigError::NoBackends);
        }
        Ok(resolved)
    }
}

fn resolve_entry(
    service: Service,
    entry: Option<ServiceEntry>,
    timeout: Duration,
) -> Result<Option<ServiceEndpoint>, ConfigError> {
    let Some(entry) = entry else {
        return Ok(None);
    };
    let url = entry.url.trim();
    let api_key = entry.api_key.trim();

    match (url.is_empty(), api_key.is_empty()) {
        (true, true) => return Ok(None),
        (false, true) => {
            return Err(ConfigError::Invalid(format!(
                "{service} url is set but its api_key is missing"
            )))
        }
        (true, false) => {
            return Err(ConfigError::Invalid(format!(
                "{service} api_key is set but its url is missing"
            )))
        }
        (false, false) => {}
    }

    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ConfigError::Invalid(format!("{service} url '{url}' is invalid: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!(
            "{service} url '{url}' must use http or https"
        )));
    }

    Ok(Some(ServiceEndpoint {
        service,
        base_url: url.trim_end_matches('/').to_string(),
        api_key: api_key.to_string(),
        timeout,
    }))
}

/// Load and validate configuration from CLI args, config file and env vars.
pub fn load_config(cli: &Cli) -> Result<ResolvedConfig, ConfigError> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os("SERVARR_CONFIG").map(PathBuf::from));

    let mut config = match path {
        Some(p) => ServarrConfig::from_file(&expand_tilde(&p))?,
        None => ServarrConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    config.resolve()
}

/// Expand a leading `~` to `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}
