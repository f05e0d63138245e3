use duckdb::Connection;

/// A tracked site row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub domain: Option<String>,
}

/// Insert an account if it does not already exist.
pub fn create_account(conn: &Connection, id: &str, name: &str) -> Result<(), duckdb::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO accounts (id, name) VALUES (?, ?)",
        duckdb::params![id, name],
    )?;
    Ok(())
}

/// Insert a site if it does not already exist.
pub fn create_site(
    conn: &Connection,
    id: &str,
    account_id: &str,
    name: &str,
    domain: Option<&str>,
) -> Result<(), duckdb::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO sites (id, account_id, name, domain) VALUES (?, ?, ?, ?)",
        duckdb::params![id, account_id, name, domain],
    )?;
    Ok(())
}

/// Whether a site with this id is registered at all. Used by ingestion,
/// which has no account context.
pub fn site_exists(conn: &Connection, site_id: &str) -> Result<bool, duckdb::Error> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM sites WHERE id = ?")?;
    let count: i64 = stmt.query_row([site_id], |row| row.get(0))?;
    Ok(count > 0)
}

/// Whether `site_id` belongs to `account_id`.
///
/// Every site-scoped aggregation request must pass this check first; a
/// missing site and a foreign site are indistinguishable to the caller.
pub fn site_owned_by(
    conn: &Connection,
    site_id: &str,
    account_id: &str,
) -> Result<bool, duckdb::Error> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM sites WHERE id = ? AND account_id = ?")?;
    let count: i64 = stmt.query_row(duckdb::params![site_id, account_id], |row| row.get(0))?;
    Ok(count > 0)
}

/// All sites owned by an account, ordered by name.
pub fn sites_for_account(conn: &Connection, account_id: &str) -> Result<Vec<Site>, duckdb::Error> {
    let mut stmt =
        conn.prepare("SELECT id, name, domain FROM sites WHERE account_id = ? ORDER BY name")?;
    let rows = stmt
        .query_map([account_id], |row| {
            Ok(Site {
                id: row.get(0)?,
                name: row.get(1)?,
                domain: row.get(2)?,
            })
        })?
        .filter_map(Result::ok)
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::storage::schema::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_and_lookup_site() {
        let conn = setup_test_db();
        create_account(&conn, "acct-1", "Example Inc").unwrap();
        create_site(&conn, "site-a", "acct-1", "Example", Some("example.com")).unwrap();

        assert!(site_exists(&conn, "site-a").unwrap());
        assert!(!site_exists(&conn, "site-b").unwrap());
    }

    #[test]
    fn test_create_site_idempotent() {
        let conn = setup_test_db();
        create_account(&conn, "acct-1", "Example Inc").unwrap();
        create_site(&conn, "site-a", "acct-1", "Example", None).unwrap();
        create_site(&conn, "site-a", "acct-1", "Example", None).unwrap();

        let sites = sites_for_account(&conn, "acct-1").unwrap();
        assert_eq!(sites.len(), 1);
    }

    #[test]
    fn test_ownership_check() {
        let conn = setup_test_db();
        create_account(&conn, "acct-1", "Alpha").unwrap();
        create_account(&conn, "acct-2", "Beta").unwrap();
        create_site(&conn, "site-a", "acct-1", "Alpha Site", None).unwrap();

        assert!(site_owned_by(&conn, "site-a", "acct-1").unwrap());
        assert!(!site_owned_by(&conn, "site-a", "acct-2").unwrap());
        assert!(!site_owned_by(&conn, "missing", "acct-1").unwrap());
    }

    #[test]
    fn test_sites_for_account_ordered_by_name() {
        let conn = setup_test_db();
        create_account(&conn, "acct-1", "Alpha").unwrap();
        create_site(&conn, "site-z", "acct-1", "Zulu", None).unwrap();
        create_site(&conn, "site-a", "acct-1", "Alpha", None).unwrap();

        let sites = sites_for_account(&conn, "acct-1").unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "Alpha");
        assert_eq!(sites[1].name, "Zulu");
    }

    #[test]
    fn test_sites_for_account_empty() {
        let conn = setup_test_db();
        let sites = sites_for_account(&conn, "nobody").unwrap();
        assert!(sites.is_empty());
    }
}
