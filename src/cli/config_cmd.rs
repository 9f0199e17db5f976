//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::devices::SourceRef;
use crate::domain::error::ConfigError;
use crate::domain::profile::{Plan, Preset};
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => {
            store.init().await?;
            presenter.success(&format!(
                "Config file created at: {}",
                store.path().display()
            ));
            Ok(())
        }
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => {
            check_key(&key)?;
            let config = store.load().await?;
            presenter.output(get_field(&config, &key).as_deref().unwrap_or(NOT_SET));
            Ok(())
        }
        ConfigAction::List => {
            let config = store.load().await?;
            for key in VALID_CONFIG_KEYS {
                presenter.key_value(key, get_field(&config, key).as_deref().unwrap_or(NOT_SET));
            }
            Ok(())
        }
        ConfigAction::Path => {
            presenter.output(&store.path().to_string_lossy());
            Ok(())
        }
    }
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let value = normalize_value(key, value)?;

    let mut config = store.load().await?;
    set_field(&mut config, key, &value)?;
    store.save(&config).await?;

    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Validate a value and return the canonical form that gets stored
fn normalize_value(key: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    match key {
        "server_url" | "settings_url" => {
            if value.starts_with("http://") || value.starts_with("https://") {
                Ok(value.trim_end_matches('/').to_string())
            } else {
                Err(invalid(key, "Value must be an http:// or https:// URL"))
            }
        }
        "plan" => value
            .parse::<Plan>()
            .map(|p| p.to_string())
            .map_err(|e| invalid(key, e.to_string())),
        "preset" => value
            .parse::<Preset>()
            .map(|p| p.to_string())
            .map_err(|e| invalid(key, e.to_string())),
        "screen" => value
            .parse::<SourceRef>()
            .map(|s| s.to_string())
            .map_err(|e| invalid(key, e.to_string())),
        "free_limit" | "chunk_interval" | "health_interval" => value
            .parse::<Duration>()
            .map(|d| d.to_string())
            .map_err(|e| invalid(key, e.to_string())),
        "notify" | "persistent_windows" => parse_bool(value)
            .map(|b| b.to_string())
            .ok_or_else(|| invalid(key, "Value must be 'true' or 'false'")),
        "user_id" | "audio" | "display" if value.is_empty() => {
            Err(invalid(key, "Value must not be empty"))
        }
        _ => Ok(value.to_string()),
    }
}

fn get_field(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "server_url" => config.server_url.clone(),
        "settings_url" => config.settings_url.clone(),
        "user_id" => config.user_id.clone(),
        "plan" => config.plan.clone(),
        "preset" => config.preset.clone(),
        "screen" => config.screen.clone(),
        "audio" => config.audio.clone(),
        "free_limit" => config.free_limit.clone(),
        "chunk_interval" => config.chunk_interval.clone(),
        "health_interval" => config.health_interval.clone(),
        "display" => config.display.clone(),
        "notify" => config.notify.map(|b| b.to_string()),
        "persistent_windows" => config.persistent_windows.map(|b| b.to_string()),
        _ => None,
    }
}

fn set_field(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let text = Some(value.to_string());
    match key {
        "server_url" => config.server_url = text,
        "settings_url" => config.settings_url = text,
        "user_id" => config.user_id = text,
        "plan" => config.plan = text,
        "preset" => config.preset = text,
        "screen" => config.screen = text,
        "audio" => config.audio = text,
        "free_limit" => config.free_limit = text,
        "chunk_interval" => config.chunk_interval = text,
        "health_interval" => config.health_interval = text,
        "display" => config.display = text,
        "notify" => config.notify = parse_bool(value),
        "persistent_windows" => config.persistent_windows = parse_bool(value),
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
