//! Runtime configuration, read from the environment.
//!
//! - `WC_CATALOG_REGISTRY_URL` - npm registry base URL (default: `https://registry.npmjs.org`)
//! - `WC_CATALOG_CDN_URL` - CDN serving package files (default: `https://unpkg.com`)
//! - `WC_CATALOG_FETCH_TIMEOUT_SECS` - per-request timeout for registry and CDN fetches (default: 30)
//! - `WC_CATALOG_DB_PATH` - SQLite database file (default: the platform data directory)

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";
const DEFAULT_CDN_URL: &str = "https://unpkg.com";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct Config {
    pub registry_url: String,
    pub cdn_url: String,
    pub fetch_timeout: Duration,
    /// `None` uses the platform data directory.
    pub db_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let registry_url =
            std::env::var("WC_CATALOG_REGISTRY_URL").unwrap_or(defaults.registry_url);
        let cdn_url = std::env::var("WC_CATALOG_CDN_URL").unwrap_or(defaults.cdn_url);

        let fetch_timeout = std::env::var("WC_CATALOG_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);

        let db_path = std::env::var("WC_CATALOG_DB_PATH").ok().map(PathBuf::from);

        Self {
            registry_url,
            cdn_url,
            fetch_timeout,
            db_path,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            cdn_url: DEFAULT_CDN_URL.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            db_path: None,
        }
    }
}
