//! Quality preset and subscription plan value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{InvalidPlanError, InvalidPresetError};
use crate::domain::recording::Duration;

/// Frame rate requested for every preset
pub const CAPTURE_FRAME_RATE: u32 = 30;

/// Recording length cap for the free plan (5 minutes)
pub const FREE_PLAN_LIMIT_SECS: u64 = 5 * 60;

/// Output resolution tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Preset {
    #[default]
    #[serde(rename = "SD")]
    Sd,
    #[serde(rename = "HD")]
    Hd,
}

/// Video constraints a capture backend must honor.
/// Width and height are exact (min == max), matching the preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl fmt::Display for VideoConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}fps", self.width, self.height, self.frame_rate)
    }
}

impl Preset {
    /// Get the wire identifier for this preset
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sd => "SD",
            Self::Hd => "HD",
        }
    }

    /// Get the human-readable label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sd => "720p",
            Self::Hd => "1080p",
        }
    }

    /// Resolution and frame rate dictated by this preset
    pub const fn constraints(&self) -> VideoConstraints {
        match self {
            Self::Sd => VideoConstraints {
                width: 1280,
                height: 720,
                frame_rate: CAPTURE_FRAME_RATE,
            },
            Self::Hd => VideoConstraints {
                width: 1920,
                height: 1080,
                frame_rate: CAPTURE_FRAME_RATE,
            },
        }
    }
}

impl FromStr for Preset {
    type Err = InvalidPresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SD" => Ok(Self::Sd),
            "HD" => Ok(Self::Hd),
            _ => Err(InvalidPresetError { input: s.to_string() }),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription tier gating recording length and preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Plan {
    #[default]
    #[serde(rename = "FREE")]
    Free,
    #[serde(rename = "PRO")]
    Pro,
}

impl Plan {
    /// Get the wire identifier for this plan
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Pro => "PRO",
        }
    }

    /// Maximum recording length, if the plan has one
    pub const fn recording_limit(&self) -> Option<Duration> {
        match self {
            Self::Free => Some(Duration::from_secs(FREE_PLAN_LIMIT_SECS)),
            Self::Pro => None,
        }
    }

    /// Whether the plan unlocks the given preset
    pub const fn allows(&self, preset: Preset) -> bool {
        match (self, preset) {
            (Self::Free, Preset::Hd) => false,
            _ => true,
        }
    }
}

impl FromStr for Plan {
    type Err = InvalidPlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FREE" => Ok(Self::Free),
            "PRO" => Ok(Self::Pro),
            _ => Err(InvalidPlanError { input: s.to_string() }),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
