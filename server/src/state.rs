//! Shared application state passed to every handler via Axum's `State` extractor.

use std::sync::Arc;
use std::time::Instant;

use mcp_servarr::Dispatcher;

use crate::config::Config;

/// Shared application state for the REST shim.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup.
    pub config: Arc<Config>,
    /// Tool dispatcher shared with every request; read-only after startup.
    pub dispatcher: Arc<Dispatcher>,
    /// Monotonic instant when the server started (for uptime calculation).
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            start_time: Instant::now(),
        }
    }
}
