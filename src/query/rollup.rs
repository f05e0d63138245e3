use crate::query::timeseries::{daily_series, DayBucket};
use crate::query::window::{percent_change, TimeWindow};
use crate::storage::sites;
use chrono::NaiveDate;
use duckdb::Connection;

/// Sparkline length for the per-site cards on the overview page.
const SPARKLINE_DAYS: u32 = 7;

/// Combined counters across every site an account owns.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccountTotals {
    pub views_today: u64,
    pub views_yesterday: u64,
    pub views_change: f64,
    pub visitors_today: u64,
    pub active_sites_today: u64,
    pub total_sites: u64,
}

/// One site's card on the overview page: identity, today's visitors with
/// day-over-day change, and a 7-day visitor sparkline.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SiteSummary {
    pub site_id: String,
    pub name: String,
    pub domain: Option<String>,
    pub visitors_today: u64,
    pub visitors_change: f64,
    pub sparkline: Vec<DayBucket>,
}

/// The full multi-site overview for one account.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccountRollup {
    pub totals: AccountTotals,
    pub sites: Vec<SiteSummary>,
}

/// Query the combined totals plus per-site summaries for an account.
///
/// An account with no sites (or no events) yields zero totals and an empty
/// site list, not an error.
pub fn account_rollup(
    conn: &Connection,
    account_id: &str,
    today: NaiveDate,
) -> Result<AccountRollup, duckdb::Error> {
    let yesterday = today.pred_opt().unwrap_or(today);

    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FILTER (WHERE CAST(viewed_at AS DATE) = CAST(? AS DATE)),
                COUNT(*) FILTER (WHERE CAST(viewed_at AS DATE) = CAST(? AS DATE)),
                COUNT(DISTINCT visitor_id) FILTER (WHERE CAST(viewed_at AS DATE) = CAST(? AS DATE)),
                COUNT(DISTINCT site_id) FILTER (WHERE CAST(viewed_at AS DATE) = CAST(? AS DATE))
         FROM page_views
         WHERE site_id IN (SELECT id FROM sites WHERE account_id = ?)",
    )?;

    let (views_today, views_yesterday, visitors_today, active_sites_today): (u64, u64, u64, u64) =
        stmt.query_row(
            duckdb::params![
                today.to_string(),
                yesterday.to_string(),
                today.to_string(),
                today.to_string(),
                account_id,
            ],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

    let owned = sites::sites_for_account(conn, account_id)?;
    let sparkline_window = TimeWindow::trailing(today, SPARKLINE_DAYS);

    let mut summaries = Vec::with_capacity(owned.len());
    for site in owned {
        let (site_today, site_yesterday) = site_day_visitors(conn, &site.id, today, yesterday)?;
        summaries.push(SiteSummary {
            sparkline: daily_series(conn, &site.id, &sparkline_window)?,
            site_id: site.id,
            name: site.name,
            domain: site.domain,
            visitors_today: site_today,
            visitors_change: percent_change(site_today, site_yesterday),
        });
    }

    Ok(AccountRollup {
        totals: AccountTotals {
            views_today,
            views_yesterday,
            views_change: percent_change(views_today, views_yesterday),
            visitors_today,
            active_sites_today,
            total_sites: summaries.len() as u64,
        },
        sites: summaries,
    })
}

/// Distinct visitors for one site on two specific days.
fn site_day_visitors(
    conn: &Connection,
    site_id: &str,
    today: NaiveDate,
    yesterday: NaiveDate,
) -> Result<(u64, u64), duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(DISTINCT visitor_id) FILTER (WHERE CAST(viewed_at AS DATE) = CAST(? AS DATE)),
                COUNT(DISTINCT visitor_id) FILTER (WHERE CAST(viewed_at AS DATE) = CAST(? AS DATE))
         FROM page_views
         WHERE site_id = ?",
    )?;
    stmt.query_row(
        duckdb::params![today.to_string(), yesterday.to_string(), site_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}
