//! Configuration loading and defaults.
//!
//! Configuration is resolved in order of precedence (highest wins):
//!
//! 1. **Environment variables**: `SERVARR_LISTEN`, `PORT`,
//!    `SERVARR_HTTP_API_KEY`, and the backend variables `SONARR_URL`,
//!    `SONARR_API_KEY`, `RADARR_URL`, `RADARR_API_KEY`, `REQUEST_TIMEOUT`
//! 2. **Config file**: path via `--config <path>`, or `servarr.toml` in CWD
//! 3. **Compiled defaults**: see each field's default value below
//!
//! ```toml
//! request_timeout_secs = 30
//!
//! [server]
//! listen = "0.0.0.0:8080"
//!
//! [auth]
//! api_key = "your-secret-key"   # omit to serve /api/* without auth
//!
//! [logging]
//! level = "info"
//!
//! [sonarr]
//! url = "http://sonarr:8989"
//! api_key = "..."
//!
//! [radarr]
//! url = "http://radarr:7878"
//! api_key = "..."
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use mcp_servarr::config::{redacted, ConfigError, ServarrConfig};
use mcp_servarr::ResolvedConfig;
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "servarr.toml";

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// `[sonarr]`, `[radarr]` and `request_timeout_secs`, shared with the
    /// stdio server.
    #[serde(flatten)]
    pub backends: ServarrConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind (default `0.0.0.0:8080`).
    #[serde(default = "default_listen")]
    pub listen: String,
}

/// Authentication settings.
#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer token required on `/api/*`. Override with `SERVARR_HTTP_API_KEY`.
    /// When unset the API is open, which is logged as a warning at startup.
    pub api_key: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key.as_deref().map(redacted))
            .finish()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level (default `info`). Overridden by `RUST_LOG` env var.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration with the precedence chain: env vars > file > defaults.
    ///
    /// If `path` is `Some`, that file must exist. Otherwise `servarr.toml` in
    /// the current directory is used when present.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => Some(PathBuf::from(p)),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };
        let mut config = match file {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Overlay environment variables. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            let port: u16 = port.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("PORT must be a port number, got '{port}'"))
            })?;
            self.server.listen = format!("0.0.0.0:{port}");
        }
        if let Some(listen) = get("SERVARR_LISTEN") {
            self.server.listen = listen;
        }
        if let Some(key) = get("SERVARR_HTTP_API_KEY") {
            self.auth.api_key = Some(key);
        }
        self.backends.apply_env(get)
    }

    /// Validate the backend sections into per-service endpoints.
    pub fn resolve_backends(&self) -> Result<ResolvedConfig, ConfigError> {
        self.backends.clone().resolve()
    }

    /// Configured bearer token, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.auth
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
