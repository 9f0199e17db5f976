//! XDG config store adapter

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Directory under the user config dir
const APP_DIR: &str = "studio-recorder";

/// TOML config file in the XDG config directory
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    /// `$XDG_CONFIG_HOME/studio-recorder/config.toml`
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR);

        Self {
            path: config_dir.join("config.toml"),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_toml(content: &str) -> Result<AppConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Self::parse_toml(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(AppConfig::empty()),
            Err(e) => Err(ConfigError::ReadError(e.to_string())),
        }
    }

    /// Written to a sibling file first and renamed into place
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let write_err = |e: std::io::Error| ConfigError::WriteError(e.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let staged = self.path.with_extension("toml.tmp");
        fs::write(&staged, Self::to_toml(config)?)
            .await
            .map_err(write_err)?;
        fs::rename(&staged, &self.path).await.map_err(write_err)
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.to_string_lossy().to_string(),
            ));
        }

        let defaults = AppConfig::defaults();
        self.save(&defaults).await
    }
}
