use duckdb::Connection;

/// One row of the live activity feed.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecentView {
    pub page_url: String,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub browser_name: Option<String>,
    pub device_type: Option<String>,
    pub viewed_at: String,
}

/// The most recent page views for a site, newest first.
pub fn recent_page_views(
    conn: &Connection,
    site_id: &str,
    limit: usize,
) -> Result<Vec<RecentView>, duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT page_url,
                page_title,
                referrer,
                browser_name,
                device_type,
                strftime(viewed_at, '%Y-%m-%d %H:%M:%S') AS viewed_at
         FROM page_views
         WHERE site_id = ?
         ORDER BY viewed_at DESC
         LIMIT ?",
    )?;

    let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(duckdb::params![site_id, limit_i64], |row| {
            Ok(RecentView {
                page_url: row.get(0)?,
                page_title: row.get(1)?,
                referrer: row.get(2)?,
                browser_name: row.get(3)?,
                device_type: row.get(4)?,
                viewed_at: row.get(5)?,
            })
        })?
        .filter_map(Result::ok)
        .collect();

    Ok(rows)
}
