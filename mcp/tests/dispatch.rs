use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use chrono::{DateTime, TimeZone, Utc};
use mcp_servarr::client::ClientError;
use mcp_servarr::{format, Dispatcher, ResolvedConfig, Service, ServiceEndpoint, ToolError};
use serde_json::{json, Value};

const API_KEY: &str = "secret-key-123";

async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn endpoint(service: Service, base_url: &str, timeout: Duration) -> ServiceEndpoint {
    ServiceEndpoint {
        service,
        base_url: base_url.to_string(),
        api_key: API_KEY.to_string(),
        timeout,
    }
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap()
}

fn dispatcher(sonarr: Option<&str>, radarr: Option<&str>) -> Dispatcher {
    let timeout = Duration::from_secs(5);
    let config = ResolvedConfig {
        sonarr: sonarr.map(|url| endpoint(Service::Sonarr, url, timeout)),
        radarr: radarr.map(|url| endpoint(Service::Radarr, url, timeout)),
    };
    Dispatcher::from_config(&config)
        .unwrap()
        .with_clock(fixed_now)
}

/// GET route that checks the API key, counts hits and returns `body`.
fn json_route(hits: &Arc<AtomicUsize>, body: Value) -> MethodRouter {
    let hits = Arc::clone(hits);
    get(move |headers: HeaderMap| {
        let hits = Arc::clone(&hits);
        let body = body.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Unauthorized"})),
                );
            }
            (StatusCode::OK, Json(body))
        }
    })
}

/// Router whose every route bumps `hits`.
fn counting_router(hits: &Arc<AtomicUsize>) -> Router {
    let hits = Arc::clone(hits);
    Router::new().fallback(move || {
        let hits = Arc::clone(&hits);
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            StatusCode::NOT_FOUND
        }
    })
}

#[tokio::test]
async fn recent_series_end_to_end() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/api/v3/series",
        json_route(&hits, json!([{"title": "Show A", "added": "2025-01-01"}])),
    );
    let url = spawn_backend(app).await;
    let d = dispatcher(Some(&url), None);

    let result = d.invoke("sonarr_get_recent_series", &json!({})).await;
    assert!(!result.is_error, "{}", result.text);
    assert!(result.text.contains("Show A"));
    assert!(result.text.contains("2025-01-01"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn recent_series_outside_window_is_none_found() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/api/v3/series",
        json_route(&hits, json!([{"title": "Old", "added": "2024-01-01T00:00:00Z"}])),
    );
    let url = spawn_backend(app).await;
    let d = dispatcher(Some(&url), None);

    let result = d
        .invoke("sonarr_get_recent_series", &json!({"days": 3}))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.text, "No series added in the last 3 days.");
}

#[tokio::test]
async fn empty_movie_queue_is_none_found() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route("/api/v3/queue", json_route(&hits, json!([])));
    let url = spawn_backend(app).await;
    let d = dispatcher(None, Some(&url));

    let result = d.invoke("radarr_get_queue", &json!({})).await;
    assert!(!result.is_error);
    assert_eq!(result.text, format::EMPTY_QUEUE);
}

#[tokio::test]
async fn paged_sonarr_queue_is_listed() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/api/v3/queue",
        json_route(
            &hits,
            json!({"page": 1, "totalRecords": 1, "records": [
                {"series": {"title": "Show A"}, "episode": {"seasonNumber": 2, "episodeNumber": 5},
                 "status": "downloading", "sizeleft": 10485760, "size": 20971520}
            ]}),
        ),
    );
    let url = spawn_backend(app).await;
    let d = dispatcher(Some(&url), None);

    let result = d.invoke("sonarr_get_queue", &json!({})).await;
    assert_eq!(
        result.text,
        "Download queue (1 item):\n- Show A - S02E05 | downloading | 10.00 MB of 20.00 MB remaining"
    );
}

#[tokio::test]
async fn unknown_tool_never_contacts_backend() {
    let hits = Arc::new(AtomicUsize::new(0));
    let url = spawn_backend(counting_router(&hits)).await;
    let d = dispatcher(Some(&url), Some(&url));

    for name in ["sonarr_delete_series", "", "RADARR_GET_QUEUE"] {
        let result = d.invoke(name, &json!({})).await;
        assert!(result.is_error);
        assert!(result.text.starts_with("Error: Unknown tool"), "{}", result.text);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_arguments_never_contact_backend() {
    let hits = Arc::new(AtomicUsize::new(0));
    let url = spawn_backend(counting_router(&hits)).await;
    let d = dispatcher(Some(&url), Some(&url));

    let cases = [
        ("sonarr_search_series", json!({})),
        ("radarr_search_movies", json!({"query": ""})),
        ("radarr_refresh_movie", json!({})),
        ("sonarr_search_episodes", json!({"series_id": "five"})),
        ("radarr_get_calendar", json!({"days": -1})),
    ];
    for (name, args) in cases {
        let err = d.call(name, &args).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)), "{name}: {err}");
        let result = d.invoke(name, &args).await;
        assert!(result.text.starts_with("Error: Invalid argument"));
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unauthorized_error_hides_api_key() {
    let app = Router::new().route(
        "/api/v3/system/status",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": format!("API key {API_KEY} rejected")})),
            )
        }),
    );
    let url = spawn_backend(app).await;
    let d = dispatcher(Some(&url), None);

    let result = d.invoke("sonarr_get_system_status", &json!({})).await;
    assert!(result.is_error);
    assert!(result.text.contains("401"), "{}", result.text);
    assert!(!result.text.contains(API_KEY), "{}", result.text);

    let err = d.call("sonarr_get_system_status", &json!({})).await.unwrap_err();
    match err {
        ToolError::Backend { service, source } => {
            assert_eq!(service, Service::Sonarr);
            assert_eq!(source.status(), Some(401));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn timeout_is_reported_within_bound() {
    let app = Router::new().route(
        "/api/v3/movie",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(json!([]))
        }),
    );
    let url = spawn_backend(app).await;
    let config = ResolvedConfig {
        sonarr: None,
        radarr: Some(endpoint(Service::Radarr, &url, Duration::from_millis(300))),
    };
    let d = Dispatcher::from_config(&config).unwrap();

    let started = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(3),
        d.invoke("radarr_search_movies", &json!({"query": "heat"})),
    )
    .await
    .expect("dispatcher hung past the client timeout");
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(result.is_error);
    assert!(result.text.contains("timed out"), "{}", result.text);

    let err = d
        .call("radarr_search_movies", &json!({"query": "heat"}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToolError::Backend {
            source: ClientError::Timeout(_),
            ..
        }
    ));
}

#[tokio::test]
async fn refused_connection_is_reported() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let d = dispatcher(Some(&url), None);

    let err = d.call("sonarr_get_queue", &json!({})).await.unwrap_err();
    assert!(matches!(
        err,
        ToolError::Backend {
            source: ClientError::Connection(_),
            ..
        }
    ));
    let result = d.invoke("sonarr_get_queue", &json!({})).await;
    assert!(result.text.starts_with("Error: Sonarr request failed: connection failed"));
}

#[tokio::test]
async fn refresh_movie_posts_command() {
    let captured: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    let app = Router::new().route(
        "/api/v3/command",
        post(move |Json(body): Json<Value>| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() = Some(body);
                (
                    StatusCode::CREATED,
                    Json(json!({"id": 42, "name": "RefreshMovie", "status": "queued"})),
                )
            }
        }),
    );
    let url = spawn_backend(app).await;
    let d = dispatcher(None, Some(&url));

    let result = d.invoke("radarr_refresh_movie", &json!({"movie_id": 7})).await;
    assert!(!result.is_error, "{}", result.text);
    assert_eq!(
        result.text,
        "Refresh triggered for movie ID 7 (command 42, status queued)"
    );
    assert_eq!(
        captured.lock().unwrap().clone(),
        Some(json!({"name": "RefreshMovie", "movieIds": [7]}))
    );
}

#[tokio::test]
async fn episode_search_posts_series_command() {
    let captured: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    let app = Router::new().route(
        "/api/v3/command",
        post(move |Json(body): Json<Value>| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() = Some(body);
                Json(json!({"id": 9, "status": "started"}))
            }
        }),
    );
    let url = spawn_backend(app).await;
    let d = dispatcher(Some(&url), None);

    let result = d
        .invoke("sonarr_search_episodes", &json!({"series_id": 3.0}))
        .await;
    assert_eq!(
        result.text,
        "Episode search triggered for series ID 3 (command 9, status started)"
    );
    assert_eq!(
        captured.lock().unwrap().clone(),
        Some(json!({"name": "SeriesSearch", "seriesId": 3}))
    );
}

#[tokio::test]
async fn calendar_requests_the_day_window() {
    let captured: Arc<Mutex<HashMap<String, String>>> = Arc::new(Mutex::new(HashMap::new()));
    let sink = Arc::clone(&captured);
    let app = Router::new().route(
        "/api/v3/calendar",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() = params;
                Json(json!([
                    {"series": {"title": "Show A"}, "seasonNumber": 1, "episodeNumber": 3,
                     "title": "Third", "airDateUtc": "2025-01-05T02:00:00Z"}
                ]))
            }
        }),
    );
    let url = spawn_backend(app).await;
    let d = dispatcher(Some(&url), None);

    let result = d.invoke("sonarr_get_calendar", &json!({"days": 7})).await;
    assert_eq!(
        result.text,
        "Upcoming episodes (next 7 days):\n- Show A - S01E03 \"Third\" | airs 2025-01-05T02:00:00Z"
    );
    let params = captured.lock().unwrap().clone();
    assert_eq!(params["start"], "2025-01-03T12:00:00Z");
    assert_eq!(params["end"], "2025-01-10T12:00:00Z");
    assert_eq!(params["includeSeries"], "true");
}

#[tokio::test]
async fn system_status_combines_two_calls() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/api/v3/system/status",
            json_route(
                &hits,
                json!({"version": "5.2.6", "osName": "debian", "runtimeName": "netcore",
                       "runtimeVersion": "6.0.13"}),
            ),
        )
        .route(
            "/api/v3/diskspace",
            json_route(
                &hits,
                json!([{"path": "/movies", "freeSpace": 536870912, "totalSpace": 1073741824}]),
            ),
        );
    let url = spawn_backend(app).await;
    let d = dispatcher(None, Some(&url));

    let result = d.invoke("radarr_get_system_status", &json!({})).await;
    assert_eq!(
        result.text,
        "Radarr system status:\n  Version: 5.2.6\n  OS: debian\n  Runtime: netcore 6.0.13\n\
         Disk space:\n- /movies: 0.50 GB free of 1.00 GB"
    );
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn partial_configuration_hides_and_rejects_other_backend() {
    let hits = Arc::new(AtomicUsize::new(0));
    let url = spawn_backend(counting_router(&hits)).await;
    let d = dispatcher(Some(&url), None);

    assert!(d.is_configured(Service::Sonarr));
    assert!(!d.is_configured(Service::Radarr));
    assert_eq!(d.tools().count(), 7);

    let err = d.call("radarr_search_movie", &json!({"movie_id": 1})).await.unwrap_err();
    assert!(matches!(err, ToolError::NotConfigured(Service::Radarr)));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
