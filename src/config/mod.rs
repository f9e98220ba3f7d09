//! Configuration handling for the sync pipeline and the query CLI.
//!
//! Everything is read from environment variables with development defaults,
//! so a bare `macpicker-sync` run against the public feed works out of the box.
//! `Config::from_env` validates numeric values and reports the offending
//! variable through `ConfigError`.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable names. Public so tests and scripts can refer to them.
pub const ENV_FEED_URL: &str = "MACPICKER_FEED_URL";
pub const ENV_CATALOG_PATH: &str = "MACPICKER_CATALOG_PATH";
pub const ENV_FETCH_ATTEMPTS: &str = "MACPICKER_FETCH_ATTEMPTS";
pub const ENV_BACKOFF_BASE_MS: &str = "MACPICKER_BACKOFF_BASE_MS";
pub const ENV_LOG_JSON: &str = "MACPICKER_LOG_JSON";

/// Default values used when environment variables are absent.
const DEFAULT_FEED_URL: &str =
    "https://refurb-tracker.com/feeds/cn_in_imac_macpro_macstudio_mini_macbookpro_macbookair.xml";
const DEFAULT_CATALOG_PATH: &str = "data/macs.json";
const DEFAULT_FETCH_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    feed_url: String,
    catalog_path: PathBuf,
    fetch_attempts: u32,
    backoff_base_ms: u64,
    log_json: bool,
}

impl Config {
    /// Create a new config explicitly.
    pub fn new(feed_url: impl Into<String>, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            feed_url: feed_url.into(),
            catalog_path: catalog_path.into(),
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            log_json: false,
        }
    }

    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let feed_url = env::var(ENV_FEED_URL).unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());
        if url::Url::parse(&feed_url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: ENV_FEED_URL,
                reason: format!("not an absolute url: {feed_url}"),
            });
        }

        let catalog_path = catalog_path_from_env();

        let fetch_attempts = parse_var(ENV_FETCH_ATTEMPTS, DEFAULT_FETCH_ATTEMPTS)?;
        if fetch_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_FETCH_ATTEMPTS,
                reason: "must be at least 1".to_string(),
            });
        }
        let backoff_base_ms = parse_var(ENV_BACKOFF_BASE_MS, DEFAULT_BACKOFF_BASE_MS)?;

        let log_json = env::var(ENV_LOG_JSON)
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            feed_url,
            catalog_path,
            fetch_attempts,
            backoff_base_ms,
            log_json,
        })
    }

    /// URL of the RSS/Atom feed to sync from.
    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }
    /// Where the published catalog document lives.
    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }
    /// Total fetch attempts per run, including the first one.
    pub fn fetch_attempts(&self) -> u32 {
        self.fetch_attempts
    }
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
    /// Emit JSON log lines instead of the human-readable format.
    pub fn log_json(&self) -> bool {
        self.log_json
    }

    /// Development defaults (mirrors `from_env` with no env overrides).
    pub fn default() -> Self {
        // not `Default` impl yet to keep explicit semantics
        Self::new(DEFAULT_FEED_URL, DEFAULT_CATALOG_PATH)
    }
}

/// Catalog location alone, for readers that never touch the feed.
pub fn catalog_path_from_env() -> PathBuf {
    env::var(ENV_CATALOG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH))
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                field: key,
                reason: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_FEED_URL,
            ENV_CATALOG_PATH,
            ENV_FETCH_ATTEMPTS,
            ENV_BACKOFF_BASE_MS,
            ENV_LOG_JSON,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.feed_url(), super::DEFAULT_FEED_URL);
        assert_eq!(cfg.catalog_path(), Path::new(super::DEFAULT_CATALOG_PATH));
        assert_eq!(cfg.fetch_attempts(), 3);
        assert_eq!(cfg.backoff_base(), Duration::from_millis(500));
        assert!(!cfg.log_json());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_FEED_URL, "http://localhost:9000/feed.xml");
            env::set_var(ENV_CATALOG_PATH, "/tmp/catalog.json");
            env::set_var(ENV_FETCH_ATTEMPTS, "5");
            env::set_var(ENV_BACKOFF_BASE_MS, "10");
            env::set_var(ENV_LOG_JSON, "1");
        }
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.feed_url(), "http://localhost:9000/feed.xml");
        assert_eq!(cfg.catalog_path(), Path::new("/tmp/catalog.json"));
        assert_eq!(cfg.fetch_attempts(), 5);
        assert_eq!(cfg.backoff_base(), Duration::from_millis(10));
        assert!(cfg.log_json());
        clear_env();
    }

    #[test]
    fn rejects_bad_numbers_and_urls() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_FETCH_ATTEMPTS, "many");
        }
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_FETCH_ATTEMPTS));

        clear_env();
        unsafe {
            env::set_var(ENV_FETCH_ATTEMPTS, "0");
        }
        assert!(Config::from_env().is_err());

        clear_env();
        unsafe {
            env::set_var(ENV_FEED_URL, "not a url");
        }
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_FEED_URL));
        clear_env();
    }

    #[test]
    fn catalog_path_ignores_feed_settings() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert_eq!(catalog_path_from_env(), Path::new(super::DEFAULT_CATALOG_PATH));

        unsafe {
            env::set_var(ENV_FEED_URL, "not a url");
            env::set_var(ENV_CATALOG_PATH, "/srv/macs.json");
        }
        assert!(Config::from_env().is_err());
        assert_eq!(catalog_path_from_env(), Path::new("/srv/macs.json"));
        clear_env();
    }
}
