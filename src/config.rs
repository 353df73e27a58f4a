//! Configuration Module
//!
//! Loads the service configuration from environment variables. The library
//! itself only ever sees the resulting [`RegistryConfig`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::registry::RegistryConfig;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// SQLite database file; `None` keeps everything in memory
    pub database_path: Option<PathBuf>,
    /// Lifetime of a cached spec in seconds
    pub spec_cache_ttl: u64,
    /// Maximum cached specs per table
    pub spec_cache_max_entries: usize,
    /// Interval in seconds between sweeps of expired cache entries
    pub cleanup_interval: u64,
    /// Deadline for each storage call in milliseconds
    pub store_timeout_ms: u64,
    /// Capacity of the change notification queue
    pub queue_capacity: usize,
    /// How long a publish may wait for queue space, in milliseconds
    pub notify_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DATABASE_PATH` - SQLite file (default: unset, in-memory storage)
    /// - `SPEC_CACHE_TTL` - Cached spec lifetime in seconds (default: 300)
    /// - `SPEC_CACHE_MAX_ENTRIES` - Cached specs per table (default: 10000)
    /// - `CLEANUP_INTERVAL` - Cache sweep frequency in seconds (default: 60)
    /// - `STORE_TIMEOUT_MS` - Storage call deadline (default: 5000)
    /// - `QUEUE_CAPACITY` - Notification queue capacity (default: 1024)
    /// - `NOTIFY_TIMEOUT_MS` - Notification send timeout (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed("SERVER_PORT").unwrap_or(defaults.server_port),
            database_path: env::var_os("DATABASE_PATH")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            spec_cache_ttl: parsed("SPEC_CACHE_TTL").unwrap_or(defaults.spec_cache_ttl),
            spec_cache_max_entries: parsed("SPEC_CACHE_MAX_ENTRIES")
                .unwrap_or(defaults.spec_cache_max_entries),
            cleanup_interval: parsed("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            store_timeout_ms: parsed("STORE_TIMEOUT_MS").unwrap_or(defaults.store_timeout_ms),
            queue_capacity: parsed("QUEUE_CAPACITY").unwrap_or(defaults.queue_capacity),
            notify_timeout_ms: parsed("NOTIFY_TIMEOUT_MS").unwrap_or(defaults.notify_timeout_ms),
        }
    }

    /// Registry settings derived from this configuration.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            cache_ttl: Duration::from_secs(self.spec_cache_ttl),
            cache_max_entries: self.spec_cache_max_entries,
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            ..RegistryConfig::default()
        }
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_path: None,
            spec_cache_ttl: 300,
            spec_cache_max_entries: 10_000,
            cleanup_interval: 60,
            store_timeout_ms: 5_000,
            queue_capacity: 1024,
            notify_timeout_ms: 1_000,
        }
    }
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
