//! Runtime settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::backoff::{
    BackoffPolicy, DEFAULT_FACTOR, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
};
use crate::extractor::DEFAULT_BATCH_SIZE;
use crate::loader::DEFAULT_CHUNK_SIZE;
use crate::orchestrator::DEFAULT_POLL_INTERVAL;
use crate::IndexingError;
use movies_indexer_repository::opensearch::INDEX_NAME;
use movies_indexer_repository::PostgresConfig;

/// Default PostgreSQL host.
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";

/// Default PostgreSQL port.
const DEFAULT_POSTGRES_PORT: u16 = 5432;

/// Default PostgreSQL database.
const DEFAULT_POSTGRES_DB: &str = "movies_database";

/// Default size of the PostgreSQL pool.
const DEFAULT_POSTGRES_MAX_CONNECTIONS: u32 = 5;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default location of the watermark file.
const DEFAULT_STATE_FILE_PATH: &str = "state/state.json";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// OpenSearch connection settings.
#[derive(Clone)]
pub struct OpenSearchSettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub index_name: String,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
}

impl std::fmt::Debug for OpenSearchSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("index_name", &self.index_name)
            .field("connection_mode", &self.connection_mode)
            .field("retry_interval", &self.retry_interval)
            .finish()
    }
}

/// Sync loop settings.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Rows or film ids per source query.
    pub batch_size: usize,
    /// Documents per bulk request.
    pub chunk_size: usize,
    pub poll_interval: Duration,
    pub run_once: bool,
    pub state_file: PathBuf,
}

/// All settings of the indexer.
#[derive(Debug, Clone)]
pub struct Settings {
    pub postgres: PostgresConfig,
    pub opensearch: OpenSearchSettings,
    pub sync: SyncSettings,
    pub backoff: BackoffPolicy,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_DB`: database location
    ///   (default: 127.0.0.1:5432/movies_database)
    /// - `POSTGRES_USER`, `POSTGRES_PASSWORD`: database credentials (required)
    /// - `POSTGRES_MAX_CONNECTIONS`: pool size (default: 5)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USER`, `OPENSEARCH_PASSWORD`: basic auth (default: none)
    /// - `INDEX_NAME`: target index (default: "movies")
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `SYNC_BATCH_SIZE`, `SYNC_CHUNK_SIZE`: page and bulk sizes (default: 100)
    /// - `SYNC_POLL_INTERVAL_SECS`: pause between passes (default: 10)
    /// - `SYNC_RUN_ONCE`: run a single pass and exit (default: false)
    /// - `STATE_FILE_PATH`: watermark file (default: state/state.json)
    /// - `BACKOFF_INITIAL_DELAY_MS`, `BACKOFF_FACTOR`, `BACKOFF_MAX_DELAY_MS`,
    ///   `BACKOFF_MAX_ATTEMPTS`: retry policy (default: 100, 2.0, 10000, 10)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| IndexingError::config(format!("{} must be set", key)))
        };

        let postgres = PostgresConfig {
            host: lookup("POSTGRES_HOST").unwrap_or_else(|| DEFAULT_POSTGRES_HOST.to_string()),
            port: parse_or(&lookup, "POSTGRES_PORT", DEFAULT_POSTGRES_PORT)?,
            database: lookup("POSTGRES_DB").unwrap_or_else(|| DEFAULT_POSTGRES_DB.to_string()),
            user: required("POSTGRES_USER")?,
            password: required("POSTGRES_PASSWORD")?,
            max_connections: parse_or(
                &lookup,
                "POSTGRES_MAX_CONNECTIONS",
                DEFAULT_POSTGRES_MAX_CONNECTIONS,
            )?,
        };

        let opensearch = OpenSearchSettings {
            url: lookup("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            username: lookup("OPENSEARCH_USER"),
            password: lookup("OPENSEARCH_PASSWORD"),
            index_name: lookup("INDEX_NAME").unwrap_or_else(|| INDEX_NAME.to_string()),
            connection_mode: ConnectionMode::parse(lookup("OPENSEARCH_CONNECTION_MODE")),
            retry_interval: Duration::from_secs(parse_or(
                &lookup,
                "OPENSEARCH_RETRY_INTERVAL_SECS",
                DEFAULT_RETRY_INTERVAL_SECS,
            )?),
        };

        let sync = SyncSettings {
            batch_size: parse_or(&lookup, "SYNC_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            chunk_size: parse_or(&lookup, "SYNC_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            poll_interval: Duration::from_secs(parse_or(
                &lookup,
                "SYNC_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL.as_secs(),
            )?),
            run_once: parse_or(&lookup, "SYNC_RUN_ONCE", false)?,
            state_file: lookup("STATE_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE_PATH)),
        };

        let backoff = BackoffPolicy {
            initial_delay: Duration::from_millis(parse_or(
                &lookup,
                "BACKOFF_INITIAL_DELAY_MS",
                DEFAULT_INITIAL_DELAY.as_millis() as u64,
            )?),
            factor: parse_or(&lookup, "BACKOFF_FACTOR", DEFAULT_FACTOR)?,
            max_delay: Duration::from_millis(parse_or(
                &lookup,
                "BACKOFF_MAX_DELAY_MS",
                DEFAULT_MAX_DELAY.as_millis() as u64,
            )?),
            max_attempts: parse_or(&lookup, "BACKOFF_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
        };

        let settings = Self {
            postgres,
            opensearch,
            sync,
            backoff,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the indexer cannot run with.
    pub fn validate(&self) -> Result<(), IndexingError> {
        if self.sync.batch_size == 0 {
            return Err(IndexingError::config("SYNC_BATCH_SIZE must be greater than 0"));
        }
        if self.sync.chunk_size == 0 {
            return Err(IndexingError::config("SYNC_CHUNK_SIZE must be greater than 0"));
        }
        if self.postgres.max_connections == 0 {
            return Err(IndexingError::config(
                "POSTGRES_MAX_CONNECTIONS must be greater than 0",
            ));
        }
        if self.opensearch.index_name.trim().is_empty() {
            return Err(IndexingError::config("INDEX_NAME must not be empty"));
        }
        self.backoff.validate()?;
        Ok(())
    }
}

/// Parse `key` if set, falling back to `default` when unset.
///
/// A value that is set but unparsable is an error rather than a silent default.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, IndexingError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| IndexingError::config(format!("{} has an invalid value '{}'", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const CREDENTIALS: [(&str, &str); 2] = [("POSTGRES_USER", "app"), ("POSTGRES_PASSWORD", "secret")];

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&CREDENTIALS)).unwrap();

        assert_eq!(settings.postgres.host, "127.0.0.1");
        assert_eq!(settings.postgres.port, 5432);
        assert_eq!(settings.postgres.database, "movies_database");
        assert_eq!(settings.postgres.max_connections, 5);
        assert_eq!(settings.opensearch.retry_interval, Duration::from_secs(15));
        assert_eq!(settings.opensearch.url, "http://localhost:9200");
        assert_eq!(settings.opensearch.index_name, "movies");
        assert_eq!(settings.opensearch.connection_mode, ConnectionMode::Retry);
        assert!(settings.opensearch.username.is_none());
        assert_eq!(settings.sync.batch_size, 100);
        assert_eq!(settings.sync.chunk_size, 100);
        assert_eq!(settings.sync.poll_interval, Duration::from_secs(10));
        assert!(!settings.sync.run_once);
        assert_eq!(settings.sync.state_file, PathBuf::from("state/state.json"));
        assert_eq!(settings.backoff, BackoffPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.extend([
            ("POSTGRES_HOST", "db"),
            ("POSTGRES_PORT", "6432"),
            ("POSTGRES_MAX_CONNECTIONS", "20"),
            ("OPENSEARCH_RETRY_INTERVAL_SECS", "3"),
            ("OPENSEARCH_URL", "https://search:9200"),
            ("OPENSEARCH_USER", "admin"),
            ("OPENSEARCH_PASSWORD", "admin"),
            ("OPENSEARCH_CONNECTION_MODE", "FAIL-FAST"),
            ("SYNC_BATCH_SIZE", "500"),
            ("SYNC_RUN_ONCE", "true"),
            ("STATE_FILE_PATH", "/var/lib/indexer/state.json"),
            ("BACKOFF_MAX_ATTEMPTS", "3"),
            ("BACKOFF_FACTOR", "1.5"),
        ]);

        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(settings.postgres.host, "db");
        assert_eq!(settings.postgres.port, 6432);
        assert_eq!(settings.postgres.max_connections, 20);
        assert_eq!(settings.opensearch.retry_interval, Duration::from_secs(3));
        assert_eq!(settings.opensearch.username.as_deref(), Some("admin"));
        assert_eq!(settings.opensearch.connection_mode, ConnectionMode::FailFast);
        assert_eq!(settings.sync.batch_size, 500);
        assert!(settings.sync.run_once);
        assert_eq!(
            settings.sync.state_file,
            PathBuf::from("/var/lib/indexer/state.json")
        );
        assert_eq!(settings.backoff.max_attempts, 3);
        assert_eq!(settings.backoff.factor, 1.5);
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        let result = Settings::from_lookup(lookup_from(&[("POSTGRES_USER", "app")]));
        assert!(matches!(result, Err(IndexingError::ConfigError(msg)) if msg.contains("POSTGRES_PASSWORD")));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("SYNC_CHUNK_SIZE", "lots"));
        let result = Settings::from_lookup(lookup_from(&pairs));
        assert!(matches!(result, Err(IndexingError::ConfigError(msg)) if msg.contains("SYNC_CHUNK_SIZE")));
    }

    #[test]
    fn test_zero_sizes_are_rejected() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("SYNC_BATCH_SIZE", "0"));
        assert!(Settings::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_invalid_backoff_is_rejected() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("BACKOFF_FACTOR", "0.5"));
        assert!(Settings::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_unknown_connection_mode_defaults_to_retry() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("OPENSEARCH_CONNECTION_MODE", "sometimes"));
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(settings.opensearch.connection_mode, ConnectionMode::Retry);
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("OPENSEARCH_PASSWORD", "hunter2"));
        let settings = Settings::from_lookup(lookup_from(&pairs)).unwrap();

        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("secret"));
    }
}
