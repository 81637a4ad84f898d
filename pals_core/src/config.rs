//! Configuration file support for the PALS reference tool.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/pals/config.toml`.

use crate::metronome::ToneKind;
use crate::{Error, PatientData, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub patient: PatientConfig,

    #[serde(default)]
    pub timer: TimerConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Starting patient values (overridable per run)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatientConfig {
    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(default = "default_age")]
    pub age: f64,

    #[serde(default)]
    pub multi_rescuer: bool,
}

impl Default for PatientConfig {
    fn default() -> Self {
        Self {
            weight: default_weight(),
            age: default_age(),
            multi_rescuer: false,
        }
    }
}

/// Session timer configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct TimerConfig {
    #[serde(default)]
    pub tone: ToneKind,

    #[serde(default)]
    pub metronome_on_start: bool,
}

/// Clinical assistant provider configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

// Default value functions
fn default_weight() -> f64 {
    20.0
}

fn default_age() -> f64 {
    5.0
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_model() -> String {
    "gemini-3-pro-preview".into()
}

fn default_api_key_env() -> String {
    "PALS_ASSISTANT_API_KEY".into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
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

    /// Get the default config file path
    ///
    /// Falls back to `$HOME/.config`, then to the working directory.
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("pals").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values no request could use
    ///
    /// Patient values are not checked; any weight or age flows through the
    /// formulas as entered.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.assistant.temperature) {
            return Err(Error::Config(format!(
                "assistant.temperature must be between 0 and 2, got {}",
                self.assistant.temperature
            )));
        }
        if self.assistant.timeout_seconds == 0 {
            return Err(Error::Config(
                "assistant.timeout_seconds must be positive".into(),
            ));
        }
        if self.assistant.api_key_env.trim().is_empty() {
            return Err(Error::Config("assistant.api_key_env is empty".into()));
        }
        Ok(())
    }

    /// Starting patient from the `[patient]` section
    pub fn patient(&self) -> PatientData {
        PatientData::new(
            self.patient.weight,
            self.patient.age,
            self.patient.multi_rescuer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.patient(), PatientData::default());
        assert_eq!(config.timer.tone, ToneKind::Bell);
        assert!(!config.timer.metronome_on_start);
        assert_eq!(config.assistant.model, "gemini-3-pro-preview");
        assert_eq!(config.assistant.api_key_env, "PALS_ASSISTANT_API_KEY");
        assert_eq!(config.assistant.timeout_seconds, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.patient.weight = 12.5;
        config.timer.tone = ToneKind::Silent;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.patient.weight, 12.5);
        assert_eq!(loaded.timer.tone, ToneKind::Silent);
        assert_eq!(loaded.assistant.endpoint, config.assistant.endpoint);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[patient]
age = 0.5

[timer]
tone = "silent"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.patient.age, 0.5);
        assert_eq!(config.patient.weight, 20.0); // default
        assert_eq!(config.timer.tone, ToneKind::Silent);
        assert_eq!(config.assistant.temperature, 0.7); // default
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[assistant]\ntimeout_seconds = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[patient\nweight = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Toml(_))));
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        let path = Config::default_config_path();
        assert!(path.ends_with("pals/config.toml"));
    }
}
