//! The root configuration type.

use serde::{Deserialize, Serialize};
use strand_telemetry::{create_env_filter, LogFormat};

use crate::schema::{BasicAuthSection, LoggerSection, LoggingSection, ServerSection};
use crate::ConfigError;

/// Complete strand configuration.
///
/// Every section is optional in files; missing sections and fields take
/// their defaults. Unknown sections and fields are rejected.
///
/// ```
/// use strand_config::StrandConfig;
///
/// let config = StrandConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.logger.backtraces);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct StrandConfig {
    /// HTTP server.
    #[serde(default)]
    pub server: ServerSection,

    /// Log subscriber.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Basic authentication unit.
    #[serde(default)]
    pub basic_auth: BasicAuthSection,

    /// Access logger unit.
    #[serde(default)]
    pub logger: LoggerSection,
}

impl StrandConfig {
    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        let directive = self
            .logging
            .filter
            .as_deref()
            .unwrap_or(&self.logging.level);
        if let Err(err) = create_env_filter(directive) {
            return Err(ConfigError::invalid_value("logging", err.to_string()));
        }

        if self.basic_auth.realm.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "basic_auth.realm",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Debug-level, human-readable logging.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi = true;
        config
    }

    /// Info-level JSON logging without panic backtraces in access records.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.format = LogFormat::Json;
        config.logger.backtraces = false;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(StrandConfig::default().validate().is_ok());
        assert!(StrandConfig::development().validate().is_ok());
        assert!(StrandConfig::production().validate().is_ok());
    }

    #[test]
    fn test_profiles() {
        assert_eq!(StrandConfig::development().logging.format, LogFormat::Pretty);
        assert!(!StrandConfig::production().logger.backtraces);
    }

    #[test]
    fn test_bad_address() {
        let mut config = StrandConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_bad_filter() {
        let mut config = StrandConfig::default();
        config.logging.filter = Some("strand=loud".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_realm() {
        let mut config = StrandConfig::default();
        config.basic_auth.realm = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = toml::to_string(&StrandConfig::default()).unwrap();
        assert!(toml_str.contains("[logger]"));
        let parsed: StrandConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, StrandConfig::default());
    }
}
