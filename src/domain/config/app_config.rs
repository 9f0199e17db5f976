//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::profile::{Plan, Preset, FREE_PLAN_LIMIT_SECS};
use crate::domain::recording::Duration;

/// Default remote chunk endpoint
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Default settings endpoint
pub const DEFAULT_SETTINGS_URL: &str = "http://localhost:3000/api";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: Option<String>,
    pub settings_url: Option<String>,
    pub user_id: Option<String>,
    pub plan: Option<String>,
    pub preset: Option<String>,
    pub screen: Option<String>,
    pub audio: Option<String>,
    pub free_limit: Option<String>,
    pub chunk_interval: Option<String>,
    pub health_interval: Option<String>,
    pub display: Option<String>,
    pub notify: Option<bool>,
    pub persistent_windows: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            server_url: Some(DEFAULT_SERVER_URL.to_string()),
            settings_url: Some(DEFAULT_SETTINGS_URL.to_string()),
            user_id: None,
            plan: Some(Plan::Free.as_str().to_string()),
            preset: Some(Preset::Sd.as_str().to_string()),
            screen: None,
            audio: None,
            free_limit: Some("5m".to_string()),
            chunk_interval: Some("1s".to_string()),
            health_interval: Some("5s".to_string()),
            display: None,
            notify: Some(false),
            persistent_windows: Some(cfg!(target_os = "macos")),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            server_url: other.server_url.or(self.server_url),
            settings_url: other.settings_url.or(self.settings_url),
            user_id: other.user_id.or(self.user_id),
            plan: other.plan.or(self.plan),
            preset: other.preset.or(self.preset),
            screen: other.screen.or(self.screen),
            audio: other.audio.or(self.audio),
            free_limit: other.free_limit.or(self.free_limit),
            chunk_interval: other.chunk_interval.or(self.chunk_interval),
            health_interval: other.health_interval.or(self.health_interval),
            display: other.display.or(self.display),
            notify: other.notify.or(self.notify),
            persistent_windows: other.persistent_windows.or(self.persistent_windows),
        }
    }

    pub fn server_url_or_default(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn settings_url_or_default(&self) -> &str {
        self.settings_url.as_deref().unwrap_or(DEFAULT_SETTINGS_URL)
    }

    /// Get plan as parsed Plan, or FREE if not set/invalid
    pub fn plan_or_default(&self) -> Plan {
        self.plan
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get preset as parsed Preset, or SD if not set/invalid
    pub fn preset_or_default(&self) -> Preset {
        self.preset
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Recording cap applied to the free plan
    pub fn free_limit_or_default(&self) -> Duration {
        self.free_limit
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Duration::from_secs(FREE_PLAN_LIMIT_SECS))
    }

    pub fn chunk_interval_or_default(&self) -> Duration {
        self.chunk_interval
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_chunk_interval)
    }

    pub fn health_interval_or_default(&self) -> Duration {
        self.health_interval
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_health_interval)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    /// Hide surfaces instead of closing them, or the platform default
    pub fn persistent_windows_or_default(&self) -> bool {
        self.persistent_windows
            .unwrap_or(cfg!(target_os = "macos"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.server_url_or_default(), DEFAULT_SERVER_URL);
        assert_eq!(config.plan_or_default(), Plan::Free);
        assert_eq!(config.preset_or_default(), Preset::Sd);
        assert_eq!(config.free_limit_or_default().as_secs(), 300);
        assert_eq!(config.chunk_interval_or_default().as_secs(), 1);
        assert_eq!(config.health_interval_or_default().as_secs(), 5);
        assert!(config.user_id.is_none());
        assert!(!config.notify_or_default());
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.server_url.is_none());
        assert!(config.plan.is_none());
        assert!(config.screen.is_none());
        assert!(config.notify.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            server_url: Some("http://base".to_string()),
            plan: Some("FREE".to_string()),
            screen: Some("screen:0:0".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            server_url: Some("http://other".to_string()),
            plan: None,
            screen: Some("screen:1:0".to_string()),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.server_url.as_deref(), Some("http://other"));
        assert_eq!(merged.plan.as_deref(), Some("FREE"));
        assert_eq!(merged.screen.as_deref(), Some("screen:1:0"));
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig {
            user_id: Some("user_1".to_string()),
            notify: Some(true),
            ..Default::default()
        };

        let merged = base.merge(AppConfig::empty());

        assert_eq!(merged.user_id.as_deref(), Some("user_1"));
        assert_eq!(merged.notify, Some(true));
    }

    #[test]
    fn plan_or_default_parses_case_insensitively() {
        let config = AppConfig {
            plan: Some("pro".to_string()),
            ..Default::default()
        };
        assert_eq!(config.plan_or_default(), Plan::Pro);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AppConfig {
            plan: Some("gold".to_string()),
            preset: Some("4k".to_string()),
            chunk_interval: Some("soon".to_string()),
            ..Default::default()
        };
        assert_eq!(config.plan_or_default(), Plan::Free);
        assert_eq!(config.preset_or_default(), Preset::Sd);
        assert_eq!(config.chunk_interval_or_default().as_secs(), 1);
    }

    #[test]
    fn free_limit_parses() {
        let config = AppConfig {
            free_limit: Some("2m30s".to_string()),
            ..Default::default()
        };
        assert_eq!(config.free_limit_or_default().as_secs(), 150);
    }

    #[test]
    fn toml_round_trip_skips_nothing_set() {
        let config = AppConfig {
            user_id: Some("user_1".to_string()),
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("user_id = \"user_1\""));
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
