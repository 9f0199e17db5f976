//! Capture profile value objects

use serde::{Deserialize, Serialize};

use super::preset::{Plan, Preset, VideoConstraints};
use crate::domain::error::IncompleteProfile;

/// Everything needed to start a recording.
/// Immutable once built; a settings change produces a new profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureProfile {
    #[serde(rename = "id")]
    session_id: String,
    #[serde(rename = "screen")]
    screen_source_id: String,
    #[serde(rename = "audio")]
    audio_device_id: String,
    preset: Preset,
    plan: Plan,
}

impl CaptureProfile {
    /// Create a fully specified profile
    pub fn new(
        session_id: impl Into<String>,
        screen_source_id: impl Into<String>,
        audio_device_id: impl Into<String>,
        preset: Preset,
        plan: Plan,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            screen_source_id: screen_source_id.into(),
            audio_device_id: audio_device_id.into(),
            preset,
            plan,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn screen_source_id(&self) -> &str {
        &self.screen_source_id
    }

    pub fn audio_device_id(&self) -> &str {
        &self.audio_device_id
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    /// Video constraints for this profile's preset
    pub fn video_constraints(&self) -> VideoConstraints {
        self.preset.constraints()
    }

    /// Copy of this profile bound to different devices
    pub fn with_devices(&self, screen_source_id: &str, audio_device_id: &str) -> Self {
        Self {
            screen_source_id: screen_source_id.to_string(),
            audio_device_id: audio_device_id.to_string(),
            ..self.clone()
        }
    }
}

/// A profile as published by the control surface.
/// Any field may be missing; only complete profiles are forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialCaptureProfile {
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(rename = "screen", default, skip_serializing_if = "Option::is_none")]
    pub screen_source_id: Option<String>,
    #[serde(rename = "audio", default, skip_serializing_if = "Option::is_none")]
    pub audio_device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

impl PartialCaptureProfile {
    /// Names of the required fields that are missing or empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.session_id) {
            missing.push("id");
        }
        if is_blank(&self.screen_source_id) {
            missing.push("screen");
        }
        if is_blank(&self.audio_device_id) {
            missing.push("audio");
        }
        if self.preset.is_none() {
            missing.push("preset");
        }
        if self.plan.is_none() {
            missing.push("plan");
        }
        missing
    }

    /// Check if every required field is present
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Build a complete profile, or report which fields are missing
    pub fn complete(&self) -> Result<CaptureProfile, IncompleteProfile> {
        match (
            &self.session_id,
            &self.screen_source_id,
            &self.audio_device_id,
            self.preset,
            self.plan,
        ) {
            (Some(id), Some(screen), Some(audio), Some(preset), Some(plan))
                if self.is_complete() =>
            {
                Ok(CaptureProfile::new(
                    id.clone(),
                    screen.clone(),
                    audio.clone(),
                    preset,
                    plan,
                ))
            }
            _ => Err(IncompleteProfile {
                missing: self.missing_fields(),
            }),
        }
    }
}

impl From<CaptureProfile> for PartialCaptureProfile {
    fn from(profile: CaptureProfile) -> Self {
        Self {
            session_id: Some(profile.session_id),
            screen_source_id: Some(profile.screen_source_id),
            audio_device_id: Some(profile.audio_device_id),
            preset: Some(profile.preset),
            plan: Some(profile.plan),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
