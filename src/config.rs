use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration loaded from environment variables or TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to the DuckDB database file. If not set, an in-memory database
    /// is used (all events are lost on restart).
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Accounts to seed at startup. Account/site CRUD lives outside this
    /// service, so a self-hosted deployment declares its tenants here.
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
    /// Sites to seed at startup. Events for unknown sites are rejected.
    #[serde(default)]
    pub sites: Vec<SeedSite>,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// A seeded account (the tenant owning one or more sites).
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAccount {
    pub id: String,
    pub name: String,
}

/// A seeded tracked site, owned by exactly one account.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSite {
    pub id: String,
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: None,
            accounts: Vec::new(),
            sites: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Environment variables override file values:
    /// - `SWIFTLET_HOST` → host
    /// - `SWIFTLET_PORT` → port
    /// - `SWIFTLET_DB_PATH` → db_path
    /// - `SWIFTLET_REQUEST_TIMEOUT` → request_timeout_secs
    pub fn load(config_path: Option<&Path>) -> Self {
        let mut config =
            config_path.map_or_else(Self::default, |path| match std::fs::read_to_string(path) {
                Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse config file: {e}, using defaults");
                    Self::default()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read config file: {e}, using defaults");
                    Self::default()
                }
            });

        // Environment variable overrides
        if let Ok(host) = std::env::var("SWIFTLET_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("SWIFTLET_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(db_path) = std::env::var("SWIFTLET_DB_PATH") {
            config.db_path = Some(PathBuf::from(db_path));
        }
        if let Ok(val) = std::env::var("SWIFTLET_REQUEST_TIMEOUT") {
            if let Ok(t) = val.parse() {
                config.request_timeout_secs = t;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Mutex to serialize tests that call `Config::load`, which reads
    /// environment variables. Without this, `test_env_var_overrides` can
    /// pollute other tests running in parallel.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert!(config.db_path.is_none());
        assert!(config.accounts.is_empty());
        assert!(config.sites.is_empty());
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_load_from_toml() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        write!(
            file,
            r#"
host = "127.0.0.1"
port = 9000
db_path = "/var/swiftlet/events.db"
request_timeout_secs = 10

[[accounts]]
id = "acct-1"
name = "Example Inc"

[[sites]]
id = "site-example"
account_id = "acct-1"
name = "Example"
domain = "example.com"
"#
        )
        .unwrap();

        let config = Config::load(Some(&config_path));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/swiftlet/events.db"))
        );
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].id, "acct-1");
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].account_id, "acct-1");
        assert_eq!(config.sites[0].domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_load_no_path_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = Config::load(None);
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_env_var_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();

        // Save original values
        let orig_port = std::env::var("SWIFTLET_PORT").ok();

        std::env::set_var("SWIFTLET_PORT", "3000");
        let config = Config::load(None);
        assert_eq!(config.port, 3000);

        // Restore
        match orig_port {
            Some(v) => std::env::set_var("SWIFTLET_PORT", v),
            None => std::env::remove_var("SWIFTLET_PORT"),
        }
    }

    #[test]
    fn test_invalid_toml_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "this is not valid toml {{{").unwrap();

        let config = Config::load(Some(&config_path));
        assert_eq!(config.port, 8000);
    }
}
