//! Configuration management for nfclink.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::destination::is_valid_url;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "nfclink";

/// Prefix of environment variables that override the config file.
const ENV_PREFIX: &str = "NFCLINK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `NFCLINK_`, nested keys joined
///    with `__`, e.g. `NFCLINK_READER__TAG_FILE`)
/// 2. TOML config file at `~/.config/nfclink/config.toml`
/// 3. Default values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where scanned values that are not URLs are sent, as `?tag=<value>`.
    /// Empty disables the redirect.
    pub default_redirect_url: String,
    /// Name of the deployment environment, shown in status output.
    pub app_env_name: String,
    /// Reader configuration.
    pub reader: ReaderConfig,
}

/// Reader-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Tag dump file used by the replay reader.
    /// Unset means no reader is available.
    pub tag_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_redirect_url: String::new(),
            app_env_name: "local".to_string(),
            reader: ReaderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.default_redirect_url.is_empty() && !is_valid_url(&self.default_redirect_url) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "default_redirect_url must be an absolute URL, got {:?}",
                    self.default_redirect_url
                ),
            });
        }

        if self.app_env_name.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "app_env_name cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// The environment name as shown to users.
    #[must_use]
    pub fn env_label(&self) -> String {
        self.app_env_name.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.default_redirect_url.is_empty());
        assert_eq!(config.app_env_name, "local");
        assert!(config.reader.tag_file.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_redirect_url() {
        let config = Config {
            default_redirect_url: "https://fallback.example/landing".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_redirect() {
        let config = Config {
            default_redirect_url: "/landing".to_string(),
            ..Config::default()
        };

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_redirect_url"));
    }

    #[test]
    fn test_validate_rejects_blank_env_name() {
        let config = Config {
            app_env_name: "  ".to_string(),
            ..Config::default()
        };

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("app_env_name"));
    }

    #[test]
    fn test_env_label() {
        let config = Config {
            app_env_name: "staging".to_string(),
            ..Config::default()
        };
        assert_eq!(config.env_label(), "STAGING");
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("nfclink"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|_| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
default_redirect_url = "https://fallback.example"
app_env_name = "prod"

[reader]
tag_file = "/tmp/tag.json"
"#,
            )?;

            let config =
                Config::load_from(Some(PathBuf::from("config.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.default_redirect_url, "https://fallback.example");
            assert_eq!(config.env_label(), "PROD");
            assert_eq!(config.reader.tag_file, Some(PathBuf::from("/tmp/tag.json")));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
default_redirect_url = "https://fallback.example"
app_env_name = "prod"

[reader]
tag_file = "/tmp/tag.json"
"#,
            )?;
            jail.set_env("NFCLINK_DEFAULT_REDIRECT_URL", "https://env.example/landing");
            jail.set_env("NFCLINK_READER__TAG_FILE", "/var/lib/nfclink/tag.json");

            let config =
                Config::load_from(Some(PathBuf::from("config.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.default_redirect_url, "https://env.example/landing");
            assert_eq!(
                config.reader.tag_file,
                Some(PathBuf::from("/var/lib/nfclink/tag.json"))
            );
            // Untouched keys keep the file's value
            assert_eq!(config.app_env_name, "prod");
            Ok(())
        });
    }

    #[test]
    fn test_env_is_validated() {
        Jail::expect_with(|jail| {
            jail.set_env("NFCLINK_DEFAULT_REDIRECT_URL", "not a url");

            let result = Config::load_from(Some(PathBuf::from("missing.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_redirect() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "default_redirect_url = \"not a url\"\n")?;

            let result = Config::load_from(Some(PathBuf::from("config.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("default_redirect_url"));
        assert!(json.contains("tag_file"));
    }
}
