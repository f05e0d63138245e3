use crate::api::stats;
use crate::ingest::handler::{track_event, track_pixel, AppState};
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>, request_timeout_secs: u64) -> Router {
    // Permissive CORS for ingestion (the tracking snippet runs on any origin)
    let ingestion_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    // Ingestion with permissive CORS and a small body limit; the largest
    // valid payload is well under 8 KB
    let track_routes = Router::new()
        .route("/track", post(track_event).get(track_pixel))
        .layer(DefaultBodyLimit::max(16_384))
        .layer(ingestion_cors);

    let api_routes = Router::new()
        .route("/stats", get(stats::get_stats))
        .route("/stats/timeseries", get(stats::get_timeseries))
        .route("/stats/pages", get(stats::get_top_pages))
        .route("/stats/referrers", get(stats::get_top_referrers))
        .route("/stats/browsers", get(stats::get_browser_breakdown))
        .route("/stats/devices", get(stats::get_device_breakdown))
        .route("/stats/recent", get(stats::get_recent))
        .route("/overview", get(stats::get_overview))
        .layer(CompressionLayer::new());

    Router::new()
        .route("/health", get(health_check))
        .merge(track_routes)
        .nest("/api", api_routes)
        .layer(axum::middleware::map_response(add_security_headers))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Inject OWASP-recommended security headers on every HTTP response.
async fn add_security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

/// GET /health — liveness plus a database ping.
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, axum::Json<serde_json::Value>) {
    let conn = Arc::clone(&state.conn);
    let db_ok = tokio::task::spawn_blocking(move || {
        let conn = conn.lock();
        conn.prepare("SELECT 1")
            .and_then(|mut stmt| stmt.query_row([], |row| row.get::<_, i32>(0)))
            .is_ok()
    })
    .await
    .unwrap_or(false);

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        axum::Json(serde_json::json!({
            "status": if db_ok { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "database": db_ok,
        })),
    )
}
