#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # servarr-http
//!
//! REST shim exposing the Sonarr/Radarr tools of `mcp-servarr` over HTTP.
//!
//! ## API surface
//!
//! | Method | Path                                | Auth | Description                   |
//! |--------|-------------------------------------|------|-------------------------------|
//! | GET    | `/health`                           | No   | Liveness probe                |
//! | GET    | `/ready`                            | No   | Which backends are configured |
//! | GET    | `/api/tools`                        | Yes* | Configured tool definitions   |
//! | POST   | `/api/tools/{name}`                 | Yes* | Call a tool with a JSON body  |
//! | GET    | `/api/{sonarr,radarr}/{view}`       | Yes* | recent, calendar, search, status, queue |
//! | POST   | `/api/sonarr/series/{id}/{action}`  | Yes* | refresh or search             |
//! | POST   | `/api/radarr/movie/{id}/{action}`   | Yes* | refresh or search             |
//!
//! *Only when `[auth] api_key` or `SERVARR_HTTP_API_KEY` is set.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mcp_servarr::{Dispatcher, Service};
use servarr_http::{build_router, AppState, Config};

/// HTTP server for the Sonarr/Radarr tools.
#[derive(Parser)]
#[command(name = "servarr-http", version)]
struct Cli {
    /// Path to TOML config file (default: ./servarr.toml when present).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            // Subscriber is not up yet; the configured level is unknown.
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let log_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    if let Err(e) = run(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("servarr-http v{} starting", env!("CARGO_PKG_VERSION"));

    let resolved = config.resolve_backends()?;
    let dispatcher = Dispatcher::from_config(&resolved)?;
    for service in [Service::Sonarr, Service::Radarr] {
        match resolved.endpoint(service) {
            Some(endpoint) => info!("{service} backend at {}", endpoint.base_url),
            None => info!("{service} not configured"),
        }
    }
    if config.api_key().is_none() {
        warn!("No API key configured; /api/* is unauthenticated");
    }

    let listen = config.server.listen.clone();
    let app = build_router(AppState::new(config, dispatcher));

    let listener = TcpListener::bind(&listen)
        .await
        .map_err(|e| format!("failed to bind {listen}: {e}"))?;
    info!("Listening on {listen}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Goodbye");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!("failed to register SIGTERM handler: {e}");
                ctrl_c.await.ok();
                info!("Received SIGINT");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received SIGINT");
    }
}
