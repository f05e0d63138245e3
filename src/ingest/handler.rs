use crate::ingest::useragent;
use crate::storage::sites;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use duckdb::Connection;
use parking_lot::Mutex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// A 1x1 transparent GIF89a, returned by the pixel endpoint.
const TRANSPARENT_GIF: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Load times outside this range are treated as clock noise and dropped.
const MAX_LOAD_TIME_MS: i64 = 60_000;

/// Inbound page-view payload. The POST body and the pixel query string
/// carry the same fields.
#[derive(Debug, Deserialize)]
pub struct TrackPayload {
    pub site_id: String,
    pub page_url: String,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub fingerprint: String,
    pub load_time: Option<i64>,
}

/// Shared application state: one embedded database connection behind a mutex.
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
}

/// POST /track — JSON ingestion endpoint used by the fetch and beacon
/// transports.
pub async fn track_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<TrackPayload>,
) -> Response {
    match record_page_view(&state, &headers, payload).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "success"})),
        )
            .into_response(),
        Err(status) => status.into_response(),
    }
}

/// GET /track — image-pixel fallback. Always answers with a 1x1 GIF on
/// success so the `<img>` element loads cleanly.
pub async fn track_pixel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(payload): Query<TrackPayload>,
) -> Response {
    match record_page_view(&state, &headers, payload).await {
        Ok(()) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/gif"),
                (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            ],
            TRANSPARENT_GIF.to_vec(),
        )
            .into_response(),
        Err(status) => status.into_response(),
    }
}

/// Validate the payload and insert one page_views row.
///
/// Timestamps are assigned server-side so client clock skew never reaches
/// storage. The raw fingerprint token is hashed before it is stored.
async fn record_page_view(
    state: &AppState,
    headers: &HeaderMap,
    payload: TrackPayload,
) -> Result<(), StatusCode> {
    if !valid_site_id(&payload.site_id) {
        return Err(StatusCode::BAD_REQUEST);
    }
    if payload.fingerprint.is_empty()
        || payload.fingerprint.len() > 128
        || payload.page_url.is_empty()
        || payload.page_url.len() > 2048
        || payload.page_title.as_ref().is_some_and(|t| t.len() > 512)
        || payload.referrer.as_ref().is_some_and(|r| r.len() > 2048)
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let parsed = useragent::parse_user_agent(user_agent);

    let visitor_id = hash_fingerprint(&payload.fingerprint);
    let load_time = payload
        .load_time
        .filter(|&ms| (0..=MAX_LOAD_TIME_MS).contains(&ms));

    let row_id = uuid::Uuid::new_v4().to_string();
    let viewed_at = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string();

    let conn = Arc::clone(&state.conn);
    let result = tokio::task::spawn_blocking(move || {
        let conn = conn.lock();
        if !sites::site_exists(&conn, &payload.site_id)? {
            return Ok::<bool, duckdb::Error>(false);
        }
        conn.execute(
            "INSERT INTO page_views (id, site_id, visitor_id, page_url, page_title,
             referrer, browser_name, device_type, screen_width, screen_height,
             load_time, viewed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
            duckdb::params![
                row_id,
                payload.site_id,
                visitor_id,
                sanitize_string(&payload.page_url, 2048),
                payload.page_title.as_deref().map(|t| sanitize_string(t, 512)),
                payload.referrer.as_deref().map(|r| sanitize_string(r, 2048)),
                parsed.browser,
                parsed.device_type,
                payload.screen_width,
                payload.screen_height,
                load_time,
                viewed_at,
            ],
        )?;
        Ok(true)
    })
    .await;

    match result {
        Ok(Ok(true)) => Ok(()),
        Ok(Ok(false)) => Err(StatusCode::NOT_FOUND),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to insert page view");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            tracing::error!(error = %e, "insert task panicked");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Site ids are opaque tokens: non-empty, at most 64 chars, limited to
/// alphanumerics plus `.`, `-` and `_`.
fn valid_site_id(site_id: &str) -> bool {
    !site_id.is_empty()
        && site_id.len() <= 64
        && site_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// SHA-256 of the raw fingerprint token, hex encoded. The raw token never
/// reaches storage.
pub fn hash_fingerprint(fingerprint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fingerprint.as_bytes());
    hex::encode(hasher.finalize())
}

/// Truncate to max length and strip control characters.
fn sanitize_string(input: &str, max_len: usize) -> String {
    input
        .chars()
        .filter(|c| !c.is_control())
        .take(max_len)
        .collect()
}
