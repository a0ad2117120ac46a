//! Process-level configuration: environment variables and CLI flags.
//!
//! Every setting has a default matching the source's own defaults, and can
//! be overridden by either a `--flag` or its matching environment variable.

use std::time::Duration;

use clap::Parser;

/// Command-line / environment configuration for the server process.
#[derive(Debug, Parser)]
#[command(name = "kvs-server", about = "Arena-backed key/value cache server")]
pub struct Cli {
    /// Bind address for the HTTP listener.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 9889)]
    pub port: u16,

    /// Per-entry time-to-live, e.g. "30m", "45s", "1h".
    #[arg(long, env = "EXPIRATION", default_value = "30m")]
    pub expiration: String,

    /// Interval between maintenance (Clean) passes, e.g. "10m".
    #[arg(long, env = "MAINTENANCE", default_value = "10m")]
    pub maintenance: String,

    /// Bytes to preallocate per arena slab.
    #[arg(long, env = "PREALLOCATED", default_value_t = 1_048_576)]
    pub preallocated: usize,

    /// Storage sharding mode: map, sync-map, partitioned-map, partitioned-sync-map.
    #[arg(long, env = "STORAGE_MODE", default_value = "partitioned-map")]
    pub storage_mode: String,

    /// Log verbosity: DEBUG, INFO, WARNING, ERROR.
    #[arg(long, env = "LOG_LEVEL", default_value = "INFO")]
    pub log_level: String,
}

/// Error returned when a raw CLI value fails to parse into a usable setting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid duration {value:?} for {field}: {source}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("unknown storage mode {0:?}, expected one of map, sync-map, partitioned-map, partitioned-sync-map")]
    UnknownStorageMode(String),
    #[error("unknown log level {0:?}, expected one of DEBUG, INFO, WARNING, ERROR")]
    UnknownLogLevel(String),
}

/// Fully resolved, validated settings derived from [`Cli`].
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub host: String,
    pub port: u16,
    pub ttl: Duration,
    pub maintenance_interval: Duration,
    pub preallocated: usize,
    pub partition_count: usize,
    pub log_level: tracing::Level,
}

impl Cli {
    /// Validates and converts the raw CLI/env strings into concrete settings.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let ttl = humantime::parse_duration(&self.expiration).map_err(|source| {
            ConfigError::InvalidDuration {
                field: "EXPIRATION",
                value: self.expiration.clone(),
                source,
            }
        })?;
        let maintenance_interval =
            humantime::parse_duration(&self.maintenance).map_err(|source| {
                ConfigError::InvalidDuration {
                    field: "MAINTENANCE",
                    value: self.maintenance.clone(),
                    source,
                }
            })?;

        let partition_count = match self.storage_mode.as_str() {
            "map" | "sync-map" => 1,
            "partitioned-map" | "partitioned-sync-map" => kvs_core::DEFAULT_PARTITION_COUNT,
            other => return Err(ConfigError::UnknownStorageMode(other.to_string())),
        };

        let log_level = match self.log_level.to_uppercase().as_str() {
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            other => return Err(ConfigError::UnknownLogLevel(other.to_string())),
        };

        Ok(ResolvedConfig {
            host: self.host.clone(),
            port: self.port,
            ttl,
            maintenance_interval,
            preallocated: self.preallocated,
            partition_count,
            log_level,
        })
    }
}
