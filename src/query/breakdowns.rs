use crate::query::window::TimeWindow;
use duckdb::Connection;

/// A top-pages row: URL/title pair with view and distinct-visitor counts.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PageRow {
    pub page_url: String,
    pub page_title: Option<String>,
    pub views: u64,
    pub unique_visitors: u64,
}

/// A top-referrers row. `source` is "Direct" when the referrer was absent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReferrerRow {
    pub source: String,
    pub views: u64,
    pub visitors: u64,
}

/// A share-of-traffic row for browser/device breakdowns.
///
/// `percentage` is rounded to one decimal independently per row, so the
/// column does not necessarily sum to exactly 100.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ShareRow {
    pub value: String,
    pub count: u64,
    pub percentage: f64,
}

/// Dimensions that are reported as a share of the window total.
#[derive(Debug, Clone, Copy)]
pub enum ShareDimension {
    Browser,
    DeviceType,
}

impl ShareDimension {
    const fn column_name(self) -> &'static str {
        match self {
            Self::Browser => "browser_name",
            Self::DeviceType => "device_type",
        }
    }
}

/// Top pages by view count, grouped by (page_url, page_title).
///
/// Ties beyond the view-count ordering are unspecified.
pub fn top_pages(
    conn: &Connection,
    site_id: &str,
    window: &TimeWindow,
    limit: usize,
) -> Result<Vec<PageRow>, duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT page_url,
                page_title,
                COUNT(*) AS views,
                COUNT(DISTINCT visitor_id) AS unique_visitors
         FROM page_views
         WHERE site_id = ?
           AND viewed_at > CAST(? AS TIMESTAMP)
           AND viewed_at < CAST(? AS TIMESTAMP)
         GROUP BY page_url, page_title
         ORDER BY views DESC
         LIMIT ?",
    )?;

    let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(
            duckdb::params![
                site_id,
                window.start.to_string(),
                window.end.to_string(),
                limit_i64
            ],
            |row| {
                Ok(PageRow {
                    page_url: row.get(0)?,
                    page_title: row.get(1)?,
                    views: row.get(2)?,
                    unique_visitors: row.get(3)?,
                })
            },
        )?
        .filter_map(Result::ok)
        .collect();

    Ok(rows)
}

/// Top referrers by view count.
///
/// NULL and empty referrers are normalized to the "Direct" sentinel before
/// grouping, so direct traffic is always exactly one row.
pub fn top_referrers(
    conn: &Connection,
    site_id: &str,
    window: &TimeWindow,
    limit: usize,
) -> Result<Vec<ReferrerRow>, duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT CASE WHEN referrer IS NULL OR referrer = '' THEN 'Direct' ELSE referrer END AS source,
                COUNT(*) AS views,
                COUNT(DISTINCT visitor_id) AS visitors
         FROM page_views
         WHERE site_id = ?
           AND viewed_at > CAST(? AS TIMESTAMP)
           AND viewed_at < CAST(? AS TIMESTAMP)
         GROUP BY source
         ORDER BY views DESC
         LIMIT ?",
    )?;

    let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(
            duckdb::params![
                site_id,
                window.start.to_string(),
                window.end.to_string(),
                limit_i64
            ],
            |row| {
                Ok(ReferrerRow {
                    source: row.get(0)?,
                    views: row.get(1)?,
                    visitors: row.get(2)?,
                })
            },
        )?
        .filter_map(Result::ok)
        .collect();

    Ok(rows)
}

/// Share-of-traffic breakdown by browser or device type.
///
/// Missing values group under "Unknown". Each row's percentage is its share
/// of the site/window event total, rounded to one decimal.
pub fn share_breakdown(
    conn: &Connection,
    site_id: &str,
    window: &TimeWindow,
    dimension: ShareDimension,
    limit: usize,
) -> Result<Vec<ShareRow>, duckdb::Error> {
    let col = dimension.column_name();

    // Using format! for the column name is safe here since it comes from a fixed enum
    let sql = format!(
        "SELECT COALESCE({col}, 'Unknown') AS value,
                COUNT(*) AS count,
                ROUND(100.0 * COUNT(*) / SUM(COUNT(*)) OVER (), 1) AS percentage
         FROM page_views
         WHERE site_id = ?
           AND viewed_at > CAST(? AS TIMESTAMP)
           AND viewed_at < CAST(? AS TIMESTAMP)
         GROUP BY value
         ORDER BY count DESC
         LIMIT ?"
    );

    let mut stmt = conn.prepare(&sql)?;
    let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(
            duckdb::params![
                site_id,
                window.start.to_string(),
                window.end.to_string(),
                limit_i64
            ],
            |row| {
                Ok(ShareRow {
                    value: row.get(0)?,
                    count: row.get(1)?,
                    percentage: row.get(2)?,
                })
            },
        )?
        .filter_map(Result::ok)
        .collect();

    Ok(rows)
}
