use duckdb::Connection;
use parking_lot::Mutex;
use std::sync::Arc;
use swiftlet::config::Config;
use swiftlet::ingest::handler::AppState;
use swiftlet::{server, storage};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swiftlet=info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(std::path::Path::new));

    tracing::info!(
        host = %config.host,
        port = config.port,
        db_path = ?config.db_path,
        "Starting Swiftlet"
    );

    // Open the embedded database; no path means in-memory, all events lost
    // on restart
    let conn = match &config.db_path {
        Some(path) => Connection::open(path).expect("Failed to open database file"),
        None => {
            tracing::warn!("No db_path configured, using in-memory database");
            Connection::open_in_memory().expect("Failed to open in-memory database")
        }
    };
    storage::migrations::run_migrations(&conn).expect("Failed to run migrations");

    // Seed declared tenants; events for unknown sites are rejected at ingest
    for account in &config.accounts {
        storage::sites::create_account(&conn, &account.id, &account.name)
            .expect("Failed to seed account");
    }
    for site in &config.sites {
        storage::sites::create_site(&conn, &site.id, &site.account_id, &site.name, site.domain.as_deref())
            .expect("Failed to seed site");
    }
    if !config.sites.is_empty() {
        tracing::info!(
            accounts = config.accounts.len(),
            sites = config.sites.len(),
            "Seeded tenants"
        );
    }

    let state = Arc::new(AppState {
        conn: Arc::new(Mutex::new(conn)),
    });

    let app = server::build_router(state, config.request_timeout_secs);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!(addr = %addr, "Listening");
    axum::serve(listener, app).await.expect("Server error");
}
