use crate::query::window::TimeWindow;
use duckdb::Connection;

/// One calendar day of the sparkline/chart series.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DayBucket {
    pub date: String,
    pub visitors: u64,
    pub views: u64,
}

/// Query the day-bucketed visitor/view series for a site within a window.
///
/// Days with zero events are absent from the result; callers render gaps.
/// Rows are ordered ascending by date.
pub fn daily_series(
    conn: &Connection,
    site_id: &str,
    window: &TimeWindow,
) -> Result<Vec<DayBucket>, duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT strftime(DATE_TRUNC('day', viewed_at), '%Y-%m-%d') AS day,
                COUNT(DISTINCT visitor_id) AS visitors,
                COUNT(*) AS views
         FROM page_views
         WHERE site_id = ?
           AND viewed_at > CAST(? AS TIMESTAMP)
           AND viewed_at < CAST(? AS TIMESTAMP)
         GROUP BY day
         ORDER BY day",
    )?;

    let rows = stmt
        .query_map(
            duckdb::params![site_id, window.start.to_string(), window.end.to_string()],
            |row| {
                Ok(DayBucket {
                    date: row.get(0)?,
                    visitors: row.get(1)?,
                    views: row.get(2)?,
                })
            },
        )?
        .filter_map(Result::ok)
        .collect();

    Ok(rows)
}
