//! Settings persistence port interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::profile::{Plan, Preset};

/// Settings errors
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    #[error("Settings request failed: {0}")]
    RequestFailed(String),

    #[error("Settings service returned status {0}")]
    Rejected(u16),

    #[error("Invalid settings response: {0}")]
    InvalidResponse(String),

    #[error("User not found: {0}")]
    NotFound(String),
}

/// Studio settings persisted per studio id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioSettings {
    pub screen: String,
    pub audio: String,
    pub preset: Preset,
}

/// Answer of the settings service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettingsAck {
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

/// Stored studio settings as returned with the user profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoredStudio {
    #[serde(default)]
    pub screen: Option<String>,
    #[serde(default)]
    pub mic: Option<String>,
    #[serde(default)]
    pub preset: Option<Preset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subscription {
    pub plan: Plan,
}

/// User profile used to seed the control surface
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub subscription: Option<Subscription>,
    #[serde(default)]
    pub studio: Option<StoredStudio>,
}

impl UserProfile {
    pub fn plan(&self) -> Option<Plan> {
        self.subscription.as_ref().map(|s| s.plan)
    }
}

/// Port for the external settings service
#[async_trait]
pub trait SettingsSync: Send + Sync {
    /// Persist studio settings
    async fn update(
        &self,
        studio_id: &str,
        settings: &StudioSettings,
    ) -> Result<SettingsAck, SettingsError>;

    /// Load the user profile with stored studio settings and plan
    async fn load(&self, user_id: &str) -> Result<UserProfile, SettingsError>;
}
