//! Layered configuration loading: defaults, then a file, then environment.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;
use strand_telemetry::LogFormat;

use crate::{ConfigError, StrandConfig};

/// Loads a [`StrandConfig`] in layers, later layers overriding earlier ones:
///
/// 1. defaults, or a development or production profile
/// 2. TOML or JSON files and strings, in the order they are added
/// 3. environment variables named `PREFIX__SECTION__KEY`
///
/// A file or string only overrides the keys it sets. Everything else keeps
/// the value from the layer beneath it.
///
/// ```no_run
/// use strand_config::ConfigLoader;
///
/// # fn main() -> Result<(), strand_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("strand.toml")?
///     .with_env_prefix("STRAND")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: StrandConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = StrandConfig::default();
        self
    }

    /// Starts from the development profile.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = StrandConfig::development();
        self
    }

    /// Starts from the production profile.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = StrandConfig::production();
        self
    }

    /// Loads a file, choosing the format from its extension.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, has an unsupported
    /// extension, or does not parse (unknown fields included).
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.layer(&content, format)?;
        Ok(self)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::with_file`], except for a missing file.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in the named format ("toml" or "json").
    ///
    /// ```
    /// use strand_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[basic_auth]\nrealm = \"ops\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.basic_auth.realm, "ops");
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on an unsupported format or unparseable content.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.layer(content, format)?;
        Ok(self)
    }

    /// Enables environment overrides with `prefix`.
    ///
    /// With prefix `STRAND`, `STRAND__LOGGER__BACKTRACES=false` sets
    /// `logger.backtraces`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails on a malformed override or an invalid final value.
    pub fn load(self) -> Result<StrandConfig, ConfigError> {
        let prefix = self.env_prefix.clone();
        let vars = env::vars().filter(|(key, _)| {
            prefix
                .as_deref()
                .is_some_and(|prefix| key.starts_with(&format!("{prefix}__")))
        });
        self.load_from(vars)
    }

    /// Like [`ConfigLoader::load`], reading overrides from `vars` instead of
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Fails on a malformed override or an invalid final value.
    pub fn load_from<I>(mut self, vars: I) -> Result<StrandConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if let Some(prefix) = self.env_prefix.take() {
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> StrandConfig {
        self.config
    }

    /// Merges `content` over the current configuration, key by key.
    fn layer(&mut self, content: &str, format: &str) -> Result<(), ConfigError> {
        // Typed parse first, so unknown fields and type errors are reported
        // against the source format.
        parse(content, format)?;

        let overlay: Value = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            _ => serde_json::from_str(content)?,
        };
        let mut merged = serde_json::to_value(&self.config)?;
        merge(&mut merged, overlay);
        self.config = serde_json::from_value(merged)?;
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(setting) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = setting.split("__").collect();
        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => self.config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(key, value)?;
            }
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FILTER"] => self.config.logging.filter = Some(value.to_string()),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected json, pretty or compact",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI"] => self.config.logging.ansi = parse_bool(key, value)?,
            ["BASIC_AUTH", "REALM"] => self.config.basic_auth.realm = value.to_string(),
            ["LOGGER", "BACKTRACES"] => self.config.logger.backtraces = parse_bool(key, value)?,
            _ => return Err(ConfigError::env_parse_error(key, "unknown setting")),
        }
        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<StrandConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, StrandConfig::default());
    }

    #[test]
    fn test_loader_with_string_json() {
        let config = ConfigLoader::new()
            .with_string(r#"{"logger": {"backtraces": false}}"#, "json")
            .unwrap()
            .load_unvalidated();
        assert!(!config.logger.backtraces);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_string_keeps_profile_values() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[logging]\nlevel = \"warn\"\n\n[basic_auth]\nrealm = \"ops\"", "toml")
            .unwrap()
            .load()
            .unwrap();

        let development = StrandConfig::development();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, development.logging.format);
        assert!(config.logging.ansi);
        assert_eq!(config.basic_auth.realm, "ops");
        assert_eq!(config.server, development.server);
    }

    #[test]
    fn test_later_strings_override_earlier() {
        let config = ConfigLoader::new()
            .with_string(r#"{"server": {"http_addr": "127.0.0.1:1", "shutdown_timeout_secs": 5}}"#, "json")
            .unwrap()
            .with_string("[server]\nhttp_addr = \"127.0.0.1:2\"", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:2");
        assert_eq!(config.server.shutdown_timeout_secs, 5);
    }

    #[test]
    fn test_unsupported_format() {
        let err = ConfigLoader::new().with_string("", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(f) if f == "yaml"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let err = ConfigLoader::new()
            .with_string("[metrics]\nenabled = true", "toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_env_prefix("strand")
            .load_from(vars(&[
                ("STRAND__SERVER__HTTP_ADDR", "127.0.0.1:7000"),
                ("STRAND__LOGGING__FORMAT", "Compact"),
                ("STRAND__BASIC_AUTH__REALM", "ops"),
                ("STRAND__LOGGER__BACKTRACES", "off"),
            ]))
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:7000");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.basic_auth.realm, "ops");
        assert!(!config.logger.backtraces);
    }

    #[test]
    fn test_env_bad_values() {
        let bad_bool = ConfigLoader::new()
            .with_env_prefix("STRAND")
            .load_from(vars(&[("STRAND__LOGGER__BACKTRACES", "maybe")]))
            .unwrap_err();
        assert!(bad_bool.to_string().contains("expected boolean"));

        let unknown = ConfigLoader::new()
            .with_env_prefix("STRAND")
            .load_from(vars(&[("STRAND__LOGGER__TARGET", "x")]))
            .unwrap_err();
        assert!(unknown.to_string().contains("unknown setting"));
    }

    #[test]
    fn test_overrides_ignored_without_prefix() {
        let config = ConfigLoader::new()
            .load_from(vars(&[("STRAND__LOGGER__BACKTRACES", "false")]))
            .unwrap();
        assert!(config.logger.backtraces);
    }

    #[test]
    fn test_validation_runs_after_overrides() {
        let err = ConfigLoader::new()
            .with_env_prefix("STRAND")
            .load_from(vars(&[("STRAND__SERVER__HTTP_ADDR", "nowhere")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
