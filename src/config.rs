use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted records (recipes.json, session.json)
    pub data_dir: PathBuf,
    /// Owner id attached to recipes created locally
    pub user_id: String,
    /// Directory recipe exports are written to
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let data_dir = PathBuf::from(&home).join(".recipebook");
        Self {
            export_dir: data_dir.join("exports"),
            data_dir,
            user_id: "local".to_string(),
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::Read(path.clone(), e))?;
            config =
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(path.clone(), e))?;
        }

        if let Ok(data_dir) = std::env::var("RECIPEBOOK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(user_id) = std::env::var("RECIPEBOOK_USER_ID") {
            config.user_id = user_id;
        }
        if let Ok(export_dir) = std::env::var("RECIPEBOOK_EXPORT_DIR") {
            config.export_dir = PathBuf::from(export_dir);
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/recipebook/config.yaml
    pub fn default_config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("recipebook")
            .join("config.yaml")
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_yaml::Error),
}
