//! Shared runner plumbing: exit codes, logging and config resolution

use std::env;

use tracing_subscriber::EnvFilter;

use crate::application::ports::ConfigStore;
use crate::application::SessionConfig;
use crate::domain::config::AppConfig;
use crate::domain::devices::SourceRef;
use crate::domain::profile::{PartialCaptureProfile, Plan, Preset};
use crate::domain::recording::Duration;
use crate::infrastructure::XdgConfigStore;

use super::args::RunArgs;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

const DEFAULT_LOG_FILTER: &str = "studio_recorder=info";

/// Install the stderr tracing subscriber. `RUST_LOG` overrides the default.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // a second install (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Everything `run` needs, resolved from the merged config
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub server_url: String,
    pub settings_url: String,
    pub seed: PartialCaptureProfile,
    pub session: SessionConfig,
    pub health_interval: Duration,
    pub display: Option<String>,
    pub notify: bool,
    pub persistent_windows: bool,
}

/// Config layer built from `run` flags
pub fn cli_config(args: &RunArgs) -> AppConfig {
    AppConfig {
        server_url: args.server_url.clone(),
        settings_url: args.settings_url.clone(),
        user_id: args.user_id.clone(),
        plan: args.plan.map(|p| Plan::from(p).to_string()),
        preset: args.preset.map(|p| Preset::from(p).to_string()),
        screen: args.screen.clone(),
        audio: args.audio.clone(),
        display: args.display.clone(),
        notify: args.notify.then_some(true),
        persistent_windows: args.persistent_windows.then_some(true),
        ..AppConfig::empty()
    }
}

fn env_config() -> AppConfig {
    let var = |name: &str| env::var(name).ok().filter(|s| !s.is_empty());
    AppConfig {
        server_url: var("STUDIO_SERVER_URL"),
        settings_url: var("STUDIO_SETTINGS_URL"),
        user_id: var("STUDIO_USER_ID"),
        ..AppConfig::empty()
    }
}

/// Merge: defaults < file < env < cli
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, path = %store.path().display(), "ignoring unreadable config");
            AppConfig::empty()
        }
    };

    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}

fn parse_duration(key: &str, value: Option<&String>, default: Duration) -> Result<Duration, String> {
    match value {
        Some(s) => s
            .parse()
            .map_err(|e| format!("Invalid {}: {}", key, e)),
        None => Ok(default),
    }
}

/// Validate the merged config into run options
pub fn resolve_run_options(config: &AppConfig) -> Result<RunOptions, String> {
    let user_id = config.user_id.clone().ok_or_else(|| {
        "Missing user id. Pass --user-id, set STUDIO_USER_ID or run 'studio-recorder config set user_id <id>'"
            .to_string()
    })?;

    let plan = match config.plan.as_deref() {
        Some(s) => Some(s.parse::<Plan>().map_err(|e| e.to_string())?),
        None => None,
    };
    let preset = match config.preset.as_deref() {
        Some(s) => Some(s.parse::<Preset>().map_err(|e| e.to_string())?),
        None => None,
    };
    if let Some(screen) = config.screen.as_deref() {
        screen.parse::<SourceRef>().map_err(|e| e.to_string())?;
    }

    let defaults = SessionConfig::default();
    let session = SessionConfig {
        chunk_interval: parse_duration(
            "chunk_interval",
            config.chunk_interval.as_ref(),
            defaults.chunk_interval,
        )?,
        free_limit: parse_duration("free_limit", config.free_limit.as_ref(), defaults.free_limit)?,
    };
    let health_interval = parse_duration(
        "health_interval",
        config.health_interval.as_ref(),
        Duration::default_health_interval(),
    )?;

    Ok(RunOptions {
        server_url: config.server_url_or_default().to_string(),
        settings_url: config.settings_url_or_default().to_string(),
        seed: PartialCaptureProfile {
            session_id: Some(user_id),
            screen_source_id: config.screen.clone(),
            audio_device_id: config.audio.clone(),
            preset,
            plan,
        },
        session,
        health_interval,
        display: config.display.clone(),
        notify: config.notify_or_default(),
        persistent_windows: config.persistent_windows_or_default(),
    })
}
