//! Messages exchanged between the coordinator and its surfaces
//!
//! The set of messages is closed. Each one has a fixed destination and the
//! coordinator never rewrites payloads while routing them. On the wire a
//! message is `{"event": "<name>", "payload": ...}`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::devices::MediaSources;
use super::profile::PartialCaptureProfile;
use super::session::SessionState;
use super::visibility::Surface;

/// User actions the studio surface accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudioAction {
    Start,
    Stop,
    TogglePreview,
}

impl StudioAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::TogglePreview => "toggle-preview",
        }
    }
}

impl fmt::Display for StudioAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for unknown studio action names
#[derive(Debug, Clone, Error)]
#[error("Invalid action: \"{input}\". Valid options: start, stop, toggle-preview")]
pub struct InvalidActionError {
    pub input: String,
}

impl FromStr for StudioAction {
    type Err = InvalidActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "toggle-preview" | "preview" => Ok(Self::TogglePreview),
            _ => Err(InvalidActionError {
                input: s.to_string(),
            }),
        }
    }
}

/// Where the coordinator delivers a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Handled by the coordinator itself (window operations, enumeration)
    Coordinator,
    Surface(Surface),
}

/// Bus message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum Message {
    /// Complete capture profile for the studio surface
    #[serde(rename = "profile-received")]
    ProfileReceived(PartialCaptureProfile),
    /// Fresh device list for the control surface
    #[serde(rename = "media-sources")]
    MediaSources(MediaSources),
    #[serde(rename = "resize-studio")]
    ResizeStudio { shrink: bool },
    /// Hide (`true`) or reveal the control surface
    #[serde(rename = "hide-plugin")]
    HidePlugin { state: bool },
    #[serde(rename = "preview-overlay")]
    PreviewOverlay { visible: bool },
    #[serde(rename = "hideOrCloseWindow")]
    HideOrCloseWindow { surface: Surface },
    #[serde(rename = "getSources")]
    GetSources,
    #[serde(rename = "studio-ready")]
    StudioReady,
    #[serde(rename = "studio-action")]
    StudioAction { action: StudioAction },
    #[serde(rename = "studio-status")]
    StudioStatus,
    /// Partial settings update for the control surface
    #[serde(rename = "settings-changed")]
    SettingsChanged(PartialCaptureProfile),
}

impl Message {
    /// Wire name of the message
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProfileReceived(_) => "profile-received",
            Self::MediaSources(_) => "media-sources",
            Self::ResizeStudio { .. } => "resize-studio",
            Self::HidePlugin { .. } => "hide-plugin",
            Self::PreviewOverlay { .. } => "preview-overlay",
            Self::HideOrCloseWindow { .. } => "hideOrCloseWindow",
            Self::GetSources => "getSources",
            Self::StudioReady => "studio-ready",
            Self::StudioAction { .. } => "studio-action",
            Self::StudioStatus => "studio-status",
            Self::SettingsChanged(_) => "settings-changed",
        }
    }

    pub const fn destination(&self) -> Destination {
        match self {
            Self::ProfileReceived(_) | Self::StudioAction { .. } | Self::StudioStatus => {
                Destination::Surface(Surface::Studio)
            }
            Self::MediaSources(_) | Self::StudioReady | Self::SettingsChanged(_) => {
                Destination::Surface(Surface::Control)
            }
            Self::ResizeStudio { .. }
            | Self::HidePlugin { .. }
            | Self::PreviewOverlay { .. }
            | Self::HideOrCloseWindow { .. }
            | Self::GetSources => Destination::Coordinator,
        }
    }
}

/// Snapshot of the studio surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: SessionState,
    pub elapsed_ms: u64,
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub preview: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<PartialCaptureProfile>,
}

/// Answer to a routed message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Reply {
    Ack,
    Sources(MediaSources),
    Status(StatusReport),
    Error(String),
}

impl Reply {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
