/// Service configuration loader - parses service.toml
///
/// Separates deployment-specific settings from code: the anchor date of
/// the deployed dataset, the "last year" window length, and the HTTP
/// server/pool sizing can all change without recompiling the service.

use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use std::fs;

/// Root configuration structure for TOML parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. "0.0.0.0:8080".
    pub bind: String,
    /// Worker threads handling requests concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Dataset window settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Last known observation date of the deployed dataset. Fixed at
    /// deployment time; "last year" windows are computed from this
    /// date, never from the wall clock.
    pub anchor_date: NaiveDate,
    /// Length of the "last year" window in days.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

/// Connection pool settings for the read-only store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_window_days() -> i64 {
    365
}

fn default_pool_size() -> u32 {
    4
}

impl DataConfig {
    /// First date inside the "last year" window: `anchor_date` minus
    /// `window_days`. Queries filter with `obs_date >= window_start()`.
    pub fn window_start(&self) -> NaiveDate {
        self.anchor_date - Duration::days(self.window_days)
    }
}

impl ServerConfig {
    /// The configured bind address with its port replaced, used by the
    /// `--port` command-line override.
    pub fn bind_with_port(&self, port: u16) -> String {
        let host = match self.bind.rsplit_once(':') {
            Some((host, _)) => host,
            None => self.bind.as_str(),
        };
        format!("{}:{}", host, port)
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<ServiceConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Loads service configuration from the given path.
///
/// # Panics
/// Panics if the configuration file is missing, malformed, or contains
/// invalid settings. This is intentional: the service cannot operate
/// without a valid anchor date and bind address.
pub fn load_config(path: &str) -> ServiceConfig {
    let contents = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));

    let config: ServiceConfig = parse_config(&contents)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path, e));

    if config.data.window_days < 0 {
        panic!(
            "{}: data.window_days must be non-negative, got {}",
            path, config.data.window_days
        );
    }
    if config.server.workers == 0 {
        panic!("{}: server.workers must be at least 1", path);
    }
    if config.database.pool_size == 0 {
        panic!("{}: database.pool_size must be at least 1", path);
    }

    config
}
