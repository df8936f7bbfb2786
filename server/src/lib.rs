#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

//! servarr-http library: the REST surface over [`mcp_servarr::Dispatcher`].
//!
//! - `auth`: optional bearer-token middleware
//! - `config`: TOML + env-var configuration
//! - `routes`: health, per-service and generic tool handlers
//! - `state`: shared [`AppState`]

pub mod auth;
pub mod config;
pub mod routes;
pub mod state;

use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

pub use auth::ApiKey;
pub use config::Config;
pub use state::AppState;

/// Build the full router. `/api/*` is wrapped in [`auth::require_api_key`]
/// only when an API key is configured.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/ready", get(routes::health::ready));

    let mut api_routes = Router::new()
        .route("/api/tools", get(routes::tools::list))
        .route("/api/tools/{name}", post(routes::tools::call))
        .route(
            "/api/sonarr/series/{id}/{action}",
            post(routes::media::series_command),
        )
        .route(
            "/api/radarr/movie/{id}/{action}",
            post(routes::media::movie_command),
        )
        .route("/api/{service}/{view}", get(routes::media::read));

    if let Some(key) = state.config.api_key() {
        api_routes = api_routes
            .layer(middleware::from_fn(auth::require_api_key))
            .layer(Extension(ApiKey(key.to_string())));
    }

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
