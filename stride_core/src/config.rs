//! Configuration file support for DailyStride.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/stride/config.toml`. The
//! insight API key is never stored there; it is read from the environment.

use crate::{Error, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables checked, in order, for the insight API key
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub insight: InsightConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    /// File holding the key-value store inside a data directory
    pub fn store_path(data_dir: &Path) -> PathBuf {
        data_dir.join("store.json")
    }
}

/// Step logging and walk simulation parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_manual_step_increment")]
    pub manual_step_increment: i64,

    #[serde(default = "default_simulation_interval_ms")]
    pub simulation_interval_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            manual_step_increment: default_manual_step_increment(),
            simulation_interval_ms: default_simulation_interval_ms(),
        }
    }
}

impl TrackerConfig {
    pub fn simulation_interval(&self) -> Duration {
        Duration::from_millis(self.simulation_interval_ms)
    }
}

/// Text-generation service parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsightConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl InsightConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Read the API key from the process environment
    pub fn api_key_from_env() -> Option<SecretString> {
        Self::api_key_from_env_with(|k| std::env::var(k).ok())
    }

    /// Read the API key using the provided lookup, so tests never touch the
    /// real environment. Blank values are skipped.
    pub fn api_key_from_env_with<F>(mut get: F) -> Option<SecretString>
    where
        F: FnMut(&str) -> Option<String>,
    {
        API_KEY_VARS
            .iter()
            .filter_map(|var| get(var))
            .find(|value| !value.trim().is_empty())
            .map(|value| SecretString::from(value.trim().to_string()))
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("stride")
}

fn default_manual_step_increment() -> i64 {
    500
}

fn default_simulation_interval_ms() -> u64 {
    3000
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}

fn default_timeout_ms() -> u64 {
    15_000
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the tracker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tracker.simulation_interval_ms == 0 {
            return Err(Error::Config(
                "tracker.simulation_interval_ms must be greater than zero".into(),
            ));
        }
        if self.insight.model.trim().is_empty() {
            return Err(Error::Config("insight.model must not be empty".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("stride").join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracker.manual_step_increment, 500);
        assert_eq!(config.tracker.simulation_interval(), Duration::from_secs(3));
        assert_eq!(config.insight.model, "gemini-2.5-flash");
        assert!(config.data.data_dir.ends_with("stride"));
    }

    #[test]
    fn test_config_file_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stride").join("config.toml");

        let mut config = Config::default();
        config.tracker.manual_step_increment = 250;
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.tracker.manual_step_increment, 250);
        assert_eq!(loaded.insight.base_url, config.insight.base_url);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[tracker]
simulation_interval_ms = 800
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tracker.simulation_interval_ms, 800);
        assert_eq!(config.tracker.manual_step_increment, 500); // default
        assert_eq!(config.insight.timeout_ms, 15_000); // default
    }

    #[test]
    fn test_zero_interval_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[tracker]\nsimulation_interval_ms = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_api_key_lookup_order() {
        let key = InsightConfig::api_key_from_env_with(|k| match k {
            "GEMINI_API_KEY" => Some("primary".into()),
            "API_KEY" => Some("secondary".into()),
            _ => None,
        });
        assert_eq!(key.unwrap().expose_secret(), "primary");

        let key = InsightConfig::api_key_from_env_with(|k| match k {
            "GEMINI_API_KEY" => Some("  ".into()),
            "API_KEY" => Some("secondary".into()),
            _ => None,
        });
        assert_eq!(key.unwrap().expose_secret(), "secondary");

        assert!(InsightConfig::api_key_from_env_with(|_| None).is_none());
    }
}
