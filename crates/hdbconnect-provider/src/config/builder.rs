//! Configuration builder

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::pool::PoolSettings;

const DEFAULT_CONNECTIONS_FILE: &str = "~/.config/hdbconnect-provider/connections.toml";
const FALLBACK_CONNECTIONS_FILE: &str = "./hdbconnect-provider-connections.toml";

/// Provider configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection used when no saved connection is named
    pub connection_url: Option<Url>,
    pub pool: PoolSettings,
    pub query_timeout: Duration,
    /// TOML file holding the saved connections
    pub connections_file: PathBuf,
    pub telemetry: TelemetryConfig,
}

impl Config {
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        self.query_timeout
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json_logs: bool,
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct ConfigBuilder {
    connection_url: Option<Url>,
    pool_size: NonZeroUsize,
    pool_wait_timeout: Duration,
    query_timeout: Duration,
    connections_file: Option<PathBuf>,
    telemetry: TelemetryConfig,
}

impl ConfigBuilder {
    const DEFAULT_POOL_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(3); // 4

    #[must_use]
    pub const fn new() -> Self {
        Self {
            connection_url: None,
            pool_size: Self::DEFAULT_POOL_SIZE,
            pool_wait_timeout: Duration::from_secs(10),
            query_timeout: Duration::from_secs(30),
            connections_file: None,
            telemetry: TelemetryConfig {
                log_level: String::new(),
                json_logs: false,
            },
        }
    }

    #[must_use]
    pub fn connection_url(mut self, url: Url) -> Self {
        self.connection_url = Some(url);
        self
    }

    #[must_use]
    pub const fn pool_size(mut self, size: NonZeroUsize) -> Self {
        self.pool_size = size;
        self
    }

    #[must_use]
    pub const fn pool_wait_timeout(mut self, timeout: Duration) -> Self {
        self.pool_wait_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    #[must_use]
    pub fn connections_file(mut self, path: PathBuf) -> Self {
        self.connections_file = Some(path);
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.telemetry.log_level = level;
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.telemetry.json_logs = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> crate::Result<Config> {
        let connections_file = self.connections_file.unwrap_or_else(default_connections_file);

        let log_level = if self.telemetry.log_level.is_empty() {
            "info".to_string()
        } else {
            self.telemetry.log_level
        };

        Ok(Config {
            connection_url: self.connection_url,
            pool: PoolSettings {
                max_size: self.pool_size.get(),
                wait_timeout: self.pool_wait_timeout,
                ..PoolSettings::default()
            },
            query_timeout: self.query_timeout,
            connections_file,
            telemetry: TelemetryConfig {
                log_level,
                json_logs: self.telemetry.json_logs,
            },
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_connections_file() -> PathBuf {
    std::env::var("HOME").map_or_else(
        |_| PathBuf::from(FALLBACK_CONNECTIONS_FILE),
        |home| PathBuf::from(DEFAULT_CONNECTIONS_FILE.replacen('~', &home, 1)),
    )
}
