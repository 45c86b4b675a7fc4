use super::schema::LocatrConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "LOCATR_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Candidate files, highest priority first:
    /// `$LOCATR_CONFIG`, `./locatr.yaml`, `~/.locatr/config.yaml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from("./locatr.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".locatr").join("config.yaml"));
        }
        paths
    }

    /// First existing file from `search_paths`, or defaults.
    pub async fn load_default() -> Result<LocatrConfig, ConfigError> {
        for path in Self::search_paths() {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                debug!("Loading config from {}", path.display());
                return Self::load_from(&path).await;
            }
        }
        Ok(LocatrConfig::default())
    }

    /// A blank file yields the defaults.
    pub async fn load_from(path: &Path) -> Result<LocatrConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(LocatrConfig::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }
}
