//! Configuration sections.
//!
//! Each section converts into the runtime value it configures.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strand_middleware::stages::{BasicAuth, Logger};
use strand_server::{ServerConfig, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
use strand_telemetry::{LogConfig, LogFormat};

/// HTTP server section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl ServerSection {
    /// Builds the server configuration.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .http_addr(self.http_addr.clone())
            .shutdown_timeout(Duration::from_secs(self.shutdown_timeout_secs))
            .build()
    }
}

fn default_http_addr() -> String {
    DEFAULT_HTTP_ADDR.to_string()
}

fn default_shutdown_timeout() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

/// Logging section.
///
/// ```toml
/// [logging]
/// level = "info"
/// format = "compact"
/// filter = "warn,strand::access=info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Whether to install a subscriber at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Full filter directive, overriding `level`.
    #[serde(default)]
    pub filter: Option<String>,

    /// ANSI colours in human-readable formats.
    #[serde(default)]
    pub ansi: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            filter: None,
            ansi: false,
        }
    }
}

impl LoggingSection {
    /// Builds the logging configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            filter: self.filter.clone(),
            format: self.format,
            ansi: self.ansi,
            ..LogConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Basic authentication section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BasicAuthSection {
    /// Protection realm announced in challenges.
    #[serde(default = "default_realm")]
    pub realm: String,
}

impl Default for BasicAuthSection {
    fn default() -> Self {
        Self {
            realm: default_realm(),
        }
    }
}

impl BasicAuthSection {
    /// Builds a basic-auth unit for the configured realm.
    pub fn unit<F>(&self, verify: F) -> BasicAuth
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        BasicAuth::new(self.realm.clone(), verify)
    }
}

fn default_realm() -> String {
    "Restricted".to_string()
}

/// Access logger section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggerSection {
    /// Include panic backtraces in access records.
    #[serde(default = "default_true")]
    pub backtraces: bool,
}

impl Default for LoggerSection {
    fn default() -> Self {
        Self { backtraces: true }
    }
}

impl LoggerSection {
    /// Builds the logger unit.
    #[must_use]
    pub fn unit(&self) -> Logger {
        Logger::new().with_backtraces(self.backtraces)
    }
}

fn default_true() -> bool {
    true
}
