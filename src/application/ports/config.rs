//! Configuration port interface

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration from storage.
    ///
    /// # Returns
    /// The stored config, or an empty config when no file exists yet
    ///
    /// # Errors
    /// `ConfigError` when the file cannot be read or is not valid TOML
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Save configuration to storage, creating parent directories as needed.
    ///
    /// # Arguments
    /// * `config` - The configuration to persist
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the config file
    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write a config holding the defaults. Fails if the file already exists.
    async fn init(&self) -> Result<(), ConfigError>;
}
