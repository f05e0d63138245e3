use duckdb::Connection;

/// SQL statements to create the core tables.
///
/// `page_views` is the flat append-only event log every aggregation query
/// scans. `accounts` and `sites` carry the ownership chain checked before
/// any site-scoped query runs.
pub const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS accounts (
    id          VARCHAR PRIMARY KEY,
    name        VARCHAR NOT NULL,
    created_at  TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS sites (
    id          VARCHAR PRIMARY KEY,
    account_id  VARCHAR NOT NULL,
    name        VARCHAR NOT NULL,
    domain      VARCHAR,
    created_at  TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS page_views (
    id            VARCHAR NOT NULL,
    site_id       VARCHAR NOT NULL,
    visitor_id    VARCHAR NOT NULL,
    page_url      VARCHAR NOT NULL,
    page_title    VARCHAR,
    referrer      VARCHAR,
    browser_name  VARCHAR,
    device_type   VARCHAR,
    screen_width  INTEGER,
    screen_height INTEGER,
    load_time     INTEGER,
    viewed_at     TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_page_views_site_time
    ON page_views (site_id, viewed_at);
";

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), duckdb::Error> {
    conn.execute_batch(CREATE_TABLES)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        // Verify tables exist by querying them
        for table in ["accounts", "sites", "page_views"] {
            let mut stmt = conn
                .prepare(&format!("SELECT COUNT(*) FROM {table}"))
                .unwrap();
            let count: i64 = stmt.query_row([], |row| row.get(0)).unwrap();
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // Should not error
    }

    #[test]
    fn test_page_views_columns() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO page_views (id, site_id, visitor_id, page_url, page_title,
             referrer, browser_name, device_type, screen_width, screen_height,
             load_time, viewed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            duckdb::params![
                "b7a9f1c2",
                "site-example",
                "3f79bb7b435b05321651daefd374cd21",
                "https://example.com/pricing",
                "Pricing",
                "https://google.com",
                "Chrome",
                "desktop",
                1920,
                1080,
                412,
                "2024-01-15 10:30:00",
            ],
        )
        .unwrap();

        let mut stmt = conn.prepare("SELECT COUNT(*) FROM page_views").unwrap();
        let count: i64 = stmt.query_row([], |row| row.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_nullable_telemetry_columns() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO page_views (id, site_id, visitor_id, page_url, viewed_at)
             VALUES ('x1', 'site-example', 'v1', '/', '2024-01-15 10:30:00')",
            [],
        )
        .unwrap();

        let mut stmt = conn
            .prepare("SELECT load_time IS NULL, referrer IS NULL FROM page_views")
            .unwrap();
        let (load_null, ref_null): (bool, bool) = stmt
            .query_row([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        assert!(load_null);
        assert!(ref_null);
    }
}
