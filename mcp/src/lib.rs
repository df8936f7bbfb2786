//! # mcp-servarr
//!
//! Exposes the Sonarr (TV series) and Radarr (movie) REST APIs as MCP tools.
//! The same [`tools::Dispatcher`] backs the stdio server in this crate and
//! the HTTP surface in `servarr-http`.
//!
//! ## Architecture
//!
//! ```text
//! config.rs    JSON file / env-var configuration loading
//! client.rs    HTTP client for one Sonarr/Radarr instance (X-Api-Key auth)
//! registry.rs  static tool table: names, descriptions, input schemas
//! tools.rs     dispatcher: lookup, argument validation, backend calls
//! format.rs    pure JSON -> text rendering
//! mcp.rs       MCP JSON-RPC protocol handler (stdio)
//! ```
//!
//! ## Tools
//!
//! - **Sonarr**: `sonarr_get_recent_series`, `sonarr_get_calendar`,
//!   `sonarr_search_series`, `sonarr_get_system_status`, `sonarr_get_queue`,
//!   `sonarr_refresh_series`, `sonarr_search_episodes`
//! - **Radarr**: `radarr_get_recent_movies`, `radarr_get_calendar`,
//!   `radarr_search_movies`, `radarr_get_system_status`, `radarr_get_queue`,
//!   `radarr_refresh_movie`, `radarr_search_movie`

pub mod client;
pub mod config;
pub mod format;
pub mod mcp;
pub mod registry;
pub mod tools;

pub use config::{ResolvedConfig, Service, ServiceEndpoint};
pub use tools::{Dispatcher, ToolError, ToolResult};
