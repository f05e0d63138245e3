use crate::api::context::AccountContext;
use crate::api::errors::ApiError;
use crate::ingest::handler::AppState;
use crate::query::breakdowns::{self, ShareDimension};
use crate::query::recent::{self, RecentView};
use crate::query::rollup::{self, AccountRollup};
use crate::query::stats::{self, SiteStats};
use crate::query::timeseries::{self, DayBucket};
use crate::query::window::TimeWindow;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_WINDOW_DAYS: u32 = 365;
const MAX_LIMIT: usize = 100;

/// Query parameters shared by the site-scoped stats endpoints.
#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub site_id: String,
    #[serde(default = "default_window")]
    pub window: u32,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

const fn default_window() -> u32 {
    30
}

const fn default_limit() -> usize {
    10
}

impl StatsParams {
    /// Validate the parameters and resolve the trailing window against the
    /// server's current date.
    fn validate(&self) -> Result<TimeWindow, ApiError> {
        if self.window == 0 || self.window > MAX_WINDOW_DAYS {
            return Err(ApiError::BadRequest(format!(
                "window must be between 1 and {MAX_WINDOW_DAYS} days"
            )));
        }
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(TimeWindow::trailing(Utc::now().date_naive(), self.window))
    }
}

/// A browser breakdown row as the dashboard renders it.
#[derive(Debug, Serialize)]
pub struct BrowserRow {
    pub browser: String,
    pub count: u64,
    pub percentage: f64,
}

/// A device breakdown row as the dashboard renders it.
#[derive(Debug, Serialize)]
pub struct DeviceRow {
    pub device: String,
    pub count: u64,
    pub percentage: f64,
}

/// Run a query on the blocking pool after confirming the account owns the
/// site. An unowned or unknown site is a uniform 404.
async fn run_site_query<T, F>(
    state: Arc<AppState>,
    account_id: String,
    site_id: String,
    query: F,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection, &str) -> Result<T, duckdb::Error> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = state.conn.lock();
        if !crate::storage::sites::site_owned_by(&conn, &site_id, &account_id)? {
            return Err(ApiError::NotFound("site not found".to_string()));
        }
        query(&conn, &site_id).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Query task panicked: {e}")))?
}

/// GET /api/stats — headline counters for one site.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    Query(params): Query<StatsParams>,
) -> Result<Json<SiteStats>, ApiError> {
    let window = params.validate()?;
    let result = run_site_query(state, ctx.account_id, params.site_id, move |conn, site| {
        stats::site_stats(conn, site, &window)
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/stats/timeseries — day-bucketed visitors and views.
pub async fn get_timeseries(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    Query(params): Query<StatsParams>,
) -> Result<Json<Vec<DayBucket>>, ApiError> {
    let window = params.validate()?;
    let result = run_site_query(state, ctx.account_id, params.site_id, move |conn, site| {
        timeseries::daily_series(conn, site, &window)
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/stats/pages — top pages by views.
pub async fn get_top_pages(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    Query(params): Query<StatsParams>,
) -> Result<Json<Vec<breakdowns::PageRow>>, ApiError> {
    let window = params.validate()?;
    let limit = params.limit;
    let result = run_site_query(state, ctx.account_id, params.site_id, move |conn, site| {
        breakdowns::top_pages(conn, site, &window, limit)
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/stats/referrers — top traffic sources, with direct traffic
/// folded into a single "Direct" row.
pub async fn get_top_referrers(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    Query(params): Query<StatsParams>,
) -> Result<Json<Vec<breakdowns::ReferrerRow>>, ApiError> {
    let window = params.validate()?;
    let limit = params.limit;
    let result = run_site_query(state, ctx.account_id, params.site_id, move |conn, site| {
        breakdowns::top_referrers(conn, site, &window, limit)
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/stats/browsers — browser share of traffic.
pub async fn get_browser_breakdown(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    Query(params): Query<StatsParams>,
) -> Result<Json<Vec<BrowserRow>>, ApiError> {
    let window = params.validate()?;
    let limit = params.limit;
    let rows = run_site_query(state, ctx.account_id, params.site_id, move |conn, site| {
        breakdowns::share_breakdown(conn, site, &window, ShareDimension::Browser, limit)
    })
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|r| BrowserRow {
                browser: r.value,
                count: r.count,
                percentage: r.percentage,
            })
            .collect(),
    ))
}

/// GET /api/stats/devices — device-type share of traffic.
pub async fn get_device_breakdown(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    Query(params): Query<StatsParams>,
) -> Result<Json<Vec<DeviceRow>>, ApiError> {
    let window = params.validate()?;
    let limit = params.limit;
    let rows = run_site_query(state, ctx.account_id, params.site_id, move |conn, site| {
        breakdowns::share_breakdown(conn, site, &window, ShareDimension::DeviceType, limit)
    })
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|r| DeviceRow {
                device: r.value,
                count: r.count,
                percentage: r.percentage,
            })
            .collect(),
    ))
}

/// GET /api/stats/recent — latest page views for the live feed.
pub async fn get_recent(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    Query(params): Query<StatsParams>,
) -> Result<Json<Vec<RecentView>>, ApiError> {
    params.validate()?;
    let limit = params.limit;
    let result = run_site_query(state, ctx.account_id, params.site_id, move |conn, site| {
        recent::recent_page_views(conn, site, limit)
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/overview — combined totals plus per-site summaries for the
/// requesting account.
pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
) -> Result<Json<AccountRollup>, ApiError> {
    let today = Utc::now().date_naive();
    let result = tokio::task::spawn_blocking(move || {
        let conn = state.conn.lock();
        rollup::account_rollup(&conn, &ctx.account_id, today)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Query task panicked: {e}")))??;
    Ok(Json(result))
}
