use crate::query::window::{percent_change, TimeWindow};
use duckdb::Connection;

/// Headline counters for one site and window.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SiteStats {
    pub page_views: u64,
    pub page_views_today: u64,
    /// Day-over-day view change in percent, one decimal, 0.0 when yesterday
    /// had no views.
    pub views_change: f64,
    pub unique_visitors: u64,
    pub unique_visitors_today: u64,
}

/// Query totals and today/yesterday buckets for a site within a window.
///
/// A window with zero events yields all-zero counts, not an error.
pub fn site_stats(
    conn: &Connection,
    site_id: &str,
    window: &TimeWindow,
) -> Result<SiteStats, duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE CAST(viewed_at AS DATE) = CAST(? AS DATE)),
                COUNT(*) FILTER (WHERE CAST(viewed_at AS DATE) = CAST(? AS DATE)),
                COUNT(DISTINCT visitor_id),
                COUNT(DISTINCT visitor_id) FILTER (WHERE CAST(viewed_at AS DATE) = CAST(? AS DATE))
         FROM page_views
         WHERE site_id = ?
           AND viewed_at > CAST(? AS TIMESTAMP)
           AND viewed_at < CAST(? AS TIMESTAMP)",
    )?;

    let (views, views_today, views_yesterday, visitors, visitors_today): (u64, u64, u64, u64, u64) =
        stmt.query_row(
            duckdb::params![
                window.today.to_string(),
                window.yesterday.to_string(),
                window.today.to_string(),
                site_id,
                window.start.to_string(),
                window.end.to_string(),
            ],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )?;

    Ok(SiteStats {
        page_views: views,
        page_views_today: views_today,
        views_change: percent_change(views_today, views_yesterday),
        unique_visitors: visitors,
        unique_visitors_today: visitors_today,
    })
}
