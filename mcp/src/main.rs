//! `mcp-servarr` binary: stdio MCP server for Sonarr and Radarr.
//!
//! Designed to be launched by an AI agent host. stdout carries the JSON-RPC
//! stream, so all logging goes to stderr.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mcp_servarr::config::{self, Cli};
use mcp_servarr::{mcp, Dispatcher, Service};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let resolved = match config::load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let dispatcher = match Dispatcher::from_config(&resolved) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("startup error: {e}");
            std::process::exit(1);
        }
    };

    for service in [Service::Sonarr, Service::Radarr] {
        match resolved.endpoint(service) {
            Some(endpoint) => tracing::info!("{service} client initialized at {}", endpoint.base_url),
            None => tracing::info!("{service} not configured; its tools are hidden"),
        }
    }

    mcp::run_stdio(&dispatcher).await;
}
