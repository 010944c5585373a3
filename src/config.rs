//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::engine::Strategy;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of records the bounded cache can hold
    pub max_entries: usize,
    /// Which write-back strategy the engine uses
    pub strategy: Strategy,
    /// Write-back flush interval in seconds (async strategy only)
    pub flush_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Path of the JSON file backing the durable store
    pub store_path: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Cache capacity, at least 1 (default: 100)
    /// - `CACHE_STRATEGY` - `sync` or `async` (default: async)
    /// - `FLUSH_INTERVAL` - Flush frequency in seconds, at least 1 (default: 10)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORE_PATH` - Durable store file (default: overflow_store.json)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v >= 1)
                .unwrap_or(defaults.max_entries),
            strategy: env::var("CACHE_STRATEGY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.strategy),
            flush_interval: env::var("FLUSH_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u64| *v >= 1)
                .unwrap_or(defaults.flush_interval),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            store_path: env::var("STORE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            strategy: Strategy::Async,
            flush_interval: 10,
            server_port: 3000,
            store_path: PathBuf::from("overflow_store.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.strategy, Strategy::Async);
        assert_eq!(config.flush_interval, 10);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.store_path, PathBuf::from("overflow_store.json"));
    }

    // Single test touches the process environment so parallel tests don't race on it.
    #[test]
    fn test_config_from_env() {
        env::remove_var("CACHE_MAX_SIZE");
        env::remove_var("CACHE_STRATEGY");
        env::remove_var("FLUSH_INTERVAL");
        env::remove_var("SERVER_PORT");
        env::remove_var("STORE_PATH");

        let config = Config::from_env();
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.strategy, Strategy::Async);
        assert_eq!(config.flush_interval, 10);

        env::set_var("CACHE_MAX_SIZE", "0");
        env::set_var("CACHE_STRATEGY", "sync");
        env::set_var("FLUSH_INTERVAL", "3");
        let config = Config::from_env();
        assert_eq!(config.max_entries, 100, "zero capacity falls back to default");
        assert_eq!(config.strategy, Strategy::Sync);
        assert_eq!(config.flush_interval, 3);

        env::set_var("CACHE_MAX_SIZE", "7");
        env::set_var("CACHE_STRATEGY", "bogus");
        let config = Config::from_env();
        assert_eq!(config.max_entries, 7);
        assert_eq!(config.strategy, Strategy::Async);

        env::remove_var("CACHE_MAX_SIZE");
        env::remove_var("CACHE_STRATEGY");
        env::remove_var("FLUSH_INTERVAL");
    }
}
