//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Storage backend for records and queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            _ => Err(ConfigError::InvalidValue("STORAGE_BACKEND")),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue("LOG_FORMAT")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    pub log_format: LogFormat,

    pub storage_backend: StorageBackend,

    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// How long a received message stays hidden
    pub queue_visibility_timeout: Duration,

    /// Receives allowed before a message is dead-lettered
    pub queue_max_receive_count: u32,

    /// Simulated settlement latency
    pub settlement_latency: Duration,

    /// Simulated settlement failure probability, in [0, 1]
    pub settlement_failure_rate: f64,

    /// Number of consumer slots
    pub worker_concurrency: usize,

    /// Pause after an empty receive
    pub worker_poll_interval: Duration,

    /// Age after which a PENDING record is reported as orphaned
    pub stale_pending_after: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
            storage_backend: StorageBackend::Memory,
            database_url: None,
            database_max_connections: 10,
            queue_visibility_timeout: Duration::from_secs(300),
            queue_max_receive_count: 1,
            settlement_latency: Duration::from_millis(5000),
            settlement_failure_rate: 0.2,
            worker_concurrency: 2,
            worker_poll_interval: Duration::from_millis(500),
            stale_pending_after: Duration::from_secs(600),
        }
    }
}

/// Read an optional variable, parsing it when present
fn parse_env<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name)),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = parse_env("PORT")?.unwrap_or(defaults.port);
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let log_format = parse_env("LOG_FORMAT")?.unwrap_or(defaults.log_format);

        let storage_backend =
            parse_env("STORAGE_BACKEND")?.unwrap_or(defaults.storage_backend);
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let database_max_connections =
            parse_env("DATABASE_MAX_CONNECTIONS")?.unwrap_or(defaults.database_max_connections);

        let queue_visibility_timeout = parse_env("QUEUE_VISIBILITY_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.queue_visibility_timeout);
        let queue_max_receive_count =
            parse_env("QUEUE_MAX_RECEIVE_COUNT")?.unwrap_or(defaults.queue_max_receive_count);

        let settlement_latency = parse_env("SETTLEMENT_LATENCY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.settlement_latency);
        let settlement_failure_rate =
            parse_env("SETTLEMENT_FAILURE_RATE")?.unwrap_or(defaults.settlement_failure_rate);

        let worker_concurrency =
            parse_env("WORKER_CONCURRENCY")?.unwrap_or(defaults.worker_concurrency);
        let worker_poll_interval = parse_env("WORKER_POLL_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.worker_poll_interval);

        let stale_pending_after = parse_env("STALE_PENDING_AFTER_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.stale_pending_after);

        let config = Self {
            host,
            port,
            environment,
            log_format,
            storage_backend,
            database_url,
            database_max_connections,
            queue_visibility_timeout,
            queue_max_receive_count,
            settlement_latency,
            settlement_failure_rate,
            worker_concurrency,
            worker_poll_interval,
            stale_pending_after,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_backend == StorageBackend::Postgres && self.database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        if !(0.0..=1.0).contains(&self.settlement_failure_rate) {
            return Err(ConfigError::InvalidValue("SETTLEMENT_FAILURE_RATE"));
        }

        if self.queue_max_receive_count == 0 {
            return Err(ConfigError::InvalidValue("QUEUE_MAX_RECEIVE_COUNT"));
        }

        if self.worker_concurrency == 0 {
            return Err(ConfigError::InvalidValue("WORKER_CONCURRENCY"));
        }

        // A delivery must not reappear while its settlement call is running
        if self.queue_visibility_timeout <= self.settlement_latency {
            return Err(ConfigError::VisibilityTooShort {
                visibility: self.queue_visibility_timeout,
                latency: self.settlement_latency,
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Queue visibility timeout ({visibility:?}) must exceed settlement latency ({latency:?})")]
    VisibilityTooShort {
        visibility: Duration,
        latency: Duration,
    },
}
