/*!
 * Configuration management for hapbridge.
 *
 * This module provides functionality to load and access the bridge settings:
 * controller credentials, the secondary alarm system switch, the ordered
 * ignore-rule list and logging options.
 */
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use config::{Config as ConfigLib, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Core configuration for hapbridge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General configuration
    #[serde(default)]
    pub general: GeneralConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Controller connection configuration
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Ordered list of rules excluding devices from the bridge
    #[serde(default, alias = "ignoreDevices", alias = "ignoredevices")]
    pub ignore_devices: Vec<IgnoreRule>,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to use JSON format for logs
    #[serde(default)]
    pub json_format: bool,
}

/// Controller connection configuration
///
/// These values are handed to the device registry implementation; the bridge
/// itself only reads `elk_enabled`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller host name or address
    #[serde(default)]
    pub host: String,

    /// Controller user name
    #[serde(default)]
    pub username: String,

    /// Controller password
    #[serde(default)]
    pub password: String,

    /// Whether the secondary alarm system (ELK panel) is surfaced
    #[serde(default, alias = "elkEnabled", alias = "elkenabled")]
    pub elk_enabled: bool,
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("elk_enabled", &self.elk_enabled)
            .finish()
    }
}

/// A rule excluding devices from the bridge
///
/// Every field is optional; an empty string means "not specified". A rule
/// matches a device only if all of its specified fields match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    /// Substring the device name must contain
    #[serde(default, alias = "nameContains", alias = "namecontains")]
    pub name_contains: String,

    /// Digit(s) the device address must end with
    #[serde(default, alias = "lastAddressDigit", alias = "lastaddressdigit")]
    pub last_address_digit: String,

    /// Exact device address
    #[serde(default)]
    pub address: String,
}

impl IgnoreRule {
    /// A rule matching devices whose name contains `needle`
    pub fn name_contains<S: Into<String>>(needle: S) -> Self {
        Self {
            name_contains: needle.into(),
            ..Self::default()
        }
    }

    /// A rule matching devices whose address ends with `digits`
    pub fn last_address_digit<S: Into<String>>(digits: S) -> Self {
        Self {
            last_address_digit: digits.into(),
            ..Self::default()
        }
    }

    /// A rule matching exactly one address
    pub fn address<S: Into<String>>(address: S) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Whether no field is specified, which makes the rule match every device
    pub fn is_catch_all(&self) -> bool {
        self.name_contains.is_empty() && self.last_address_digit.is_empty() && self.address.is_empty()
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] [{}]",
            self.name_contains, self.last_address_digit, self.address
        )
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_app_name() -> String {
    "hapbridge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A builder for creating a configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<String>,
    environment_prefix: Option<String>,
    override_with: Option<Config>,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config file path
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Set the environment variable prefix for configuration
    pub fn with_environment_prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        self.environment_prefix = Some(prefix.as_ref().to_string());
        self
    }

    /// Override with an existing config
    pub fn override_with(mut self, config: Config) -> Self {
        self.override_with = Some(config);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        if let Some(config) = self.override_with {
            config.warn_on_catch_all_rules();
            return Ok(config);
        }

        // Missing keys take their serde defaults
        let mut config_builder = ConfigLib::builder();

        if let Some(config_file) = self.config_file {
            let path = Path::new(&config_file);
            if path.exists() {
                debug!("Loading configuration from {}", config_file);
                config_builder = config_builder.add_source(File::with_name(&config_file));
            } else {
                debug!("Configuration file {} does not exist, using defaults", config_file);
            }
        }

        if let Some(prefix) = self.environment_prefix {
            debug!("Loading configuration from environment variables with prefix {}", prefix);
            config_builder = config_builder.add_source(
                Environment::with_prefix(&prefix)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config_lib = config_builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build configuration: {}", e)))?;

        let config: Config = config_lib
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize configuration: {}", e)))?;

        config.warn_on_catch_all_rules();
        info!(
            "Configuration loaded: {} ignore rule(s), elk enabled: {}",
            config.ignore_devices.len(),
            config.controller.elk_enabled
        );
        Ok(config)
    }
}

impl Config {
    fn warn_on_catch_all_rules(&self) {
        for (index, rule) in self.ignore_devices.iter().enumerate() {
            if rule.is_catch_all() {
                warn!("Ignore rule #{} has no fields set and will exclude every device", index);
            }
        }
    }
}

/// A thread-safe reference to a configuration
#[derive(Debug, Clone)]
pub struct SharedConfig(Arc<Config>);

impl SharedConfig {
    /// Create a new SharedConfig
    pub fn new(config: Config) -> Self {
        Self(Arc::new(config))
    }

    /// Get a reference to the config
    pub fn get(&self) -> &Config {
        &self.0
    }
}

impl From<Config> for SharedConfig {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}

impl AsRef<Config> for SharedConfig {
    fn as_ref(&self) -> &Config {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.app_name, "hapbridge");
        assert_eq!(config.logging.level, "info");
        assert!(!config.controller.elk_enabled);
        assert!(config.ignore_devices.is_empty());
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.general.app_name, "hapbridge");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_builder_with_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("bridge.toml");

        {
            let mut file = File::create(&file_path)?;
            file.write_all(
                br#"
                [logging]
                level = "debug"

                [controller]
                host = "192.168.1.20"
                username = "admin"
                password = "secret"
                elk_enabled = true

                [[ignore_devices]]
                name_contains = "Closet"

                [[ignore_devices]]
                last_address_digit = "5"
                address = ""
            "#,
            )?;
        }

        let config = ConfigBuilder::new().with_config_file(&file_path).build()?;

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.controller.host, "192.168.1.20");
        assert!(config.controller.elk_enabled);
        assert_eq!(
            config.ignore_devices,
            vec![
                IgnoreRule::name_contains("Closet"),
                IgnoreRule::last_address_digit("5"),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_config_builder_accepts_camel_case_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("bridge.json");
        std::fs::write(
            &file_path,
            r#"{
                "controller": { "host": "isy.local", "elkEnabled": true },
                "ignoreDevices": [
                    { "nameContains": "Closet" },
                    { "lastAddressDigit": "5", "address": "" }
                ]
            }"#,
        )?;

        let config = ConfigBuilder::new().with_config_file(&file_path).build()?;

        assert!(config.controller.elk_enabled);
        assert_eq!(config.controller.host, "isy.local");
        assert_eq!(
            config.ignore_devices,
            vec![
                IgnoreRule::name_contains("Closet"),
                IgnoreRule::last_address_digit("5"),
            ]
        );
        assert_eq!(config.general.app_name, "hapbridge");
        assert_eq!(config.logging.level, "info");
        Ok(())
    }

    #[test]
    fn test_config_builder_missing_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = ConfigBuilder::new()
            .with_config_file(dir.path().join("absent.toml"))
            .build()?;
        assert_eq!(config.general.app_name, "hapbridge");
        Ok(())
    }

    #[test]
    fn test_config_builder_with_env() -> Result<()> {
        env::set_var("HAPBRIDGE_TEST__CONTROLLER__HOST", "isy.local");
        env::set_var("HAPBRIDGE_TEST__LOGGING__LEVEL", "trace");

        let config = ConfigBuilder::new()
            .with_environment_prefix("hapbridge_test")
            .build()?;

        assert_eq!(config.controller.host, "isy.local");
        assert_eq!(config.logging.level, "trace");

        env::remove_var("HAPBRIDGE_TEST__CONTROLLER__HOST");
        env::remove_var("HAPBRIDGE_TEST__LOGGING__LEVEL");

        Ok(())
    }

    #[test]
    fn test_ignore_rule_accepts_camel_case_keys() {
        let rule: IgnoreRule = serde_json::from_str(
            r#"{"nameContains": "Garage", "lastAddressDigit": "", "address": "1A 2B 3C 1"}"#,
        )
        .unwrap();
        assert_eq!(rule.name_contains, "Garage");
        assert!(rule.last_address_digit.is_empty());
        assert_eq!(rule.address, "1A 2B 3C 1");
        assert!(!rule.is_catch_all());
        assert!(IgnoreRule::default().is_catch_all());
    }

    #[test]
    fn test_password_is_redacted() {
        let controller = ControllerConfig {
            password: "hunter2".to_string(),
            ..ControllerConfig::default()
        };
        assert!(!format!("{:?}", controller).contains("hunter2"));
    }

    #[test]
    fn test_shared_config() {
        let shared = SharedConfig::new(Config::default());
        let shared2 = shared.clone();
        assert_eq!(shared2.get().general.app_name, "hapbridge");
    }
}
