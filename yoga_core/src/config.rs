//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/yoga/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub practice: PracticeConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
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

/// Identity used for assessments and session records
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
        }
    }
}

/// Practice timer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PracticeConfig {
    #[serde(default = "default_duration_seconds")]
    pub default_duration_seconds: i64,

    /// Preset lengths offered by front ends, in minutes
    #[serde(default = "default_quick_minutes")]
    pub quick_minutes: Vec<u32>,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            default_duration_seconds: default_duration_seconds(),
            quick_minutes: default_quick_minutes(),
        }
    }
}

/// Exercise catalog source
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// TOML catalog to use instead of the bundled one
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("yoga")
}

fn default_user_id() -> String {
    "local".into()
}

fn default_duration_seconds() -> i64 {
    300
}

fn default_quick_minutes() -> Vec<u32> {
    vec![1, 5, 10, 15, 30]
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

    /// Check values serde cannot express as types
    pub fn validate(&self) -> Result<()> {
        if self.practice.default_duration_seconds <= 0 {
            return Err(Error::Config(format!(
                "practice.default_duration_seconds must be positive, got {}",
                self.practice.default_duration_seconds
            )));
        }
        if self.practice.quick_minutes.contains(&0) {
            return Err(Error::Config(
                "practice.quick_minutes must not contain 0".into(),
            ));
        }
        if self.user.id.trim().is_empty() {
            return Err(Error::Config("user.id must not be empty".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("yoga").join("config.toml")
    }
}
