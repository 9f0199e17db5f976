//! Surface visibility model
//!
//! The visibility of every surface is a pure function of the session state
//! and whether the preview overlay is shown.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::session::SessionState;

/// Cooperating surfaces managed by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// Settings / source picker
    Control,
    /// Recording controls and timer
    Studio,
    /// Camera preview overlay
    Webcam,
}

impl Surface {
    pub const ALL: [Surface; 3] = [Surface::Control, Surface::Studio, Surface::Webcam];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Studio => "studio",
            Self::Webcam => "webcam",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Size classes of the studio surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    #[default]
    Compact,
    Expanded,
}

impl SizeClass {
    /// Window dimensions as (width, height)
    pub const fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Compact => (400, 100),
            Self::Expanded => (400, 250),
        }
    }

    /// Size class requested by a `resize-studio { shrink }` message
    pub const fn from_shrink(shrink: bool) -> Self {
        if shrink {
            Self::Compact
        } else {
            Self::Expanded
        }
    }

    pub const fn is_shrunk(&self) -> bool {
        matches!(self, Self::Compact)
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        match self {
            Self::Compact => write!(f, "compact ({}x{})", w, h),
            Self::Expanded => write!(f, "expanded ({}x{})", w, h),
        }
    }
}

/// Target visibility of all surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityPlan {
    pub control_hidden: bool,
    pub studio_size: SizeClass,
    pub preview_overlay: bool,
}

impl VisibilityPlan {
    pub fn derive(state: SessionState, preview: bool) -> Self {
        Self {
            control_hidden: state == SessionState::Recording,
            studio_size: if preview {
                SizeClass::Expanded
            } else {
                SizeClass::Compact
            },
            preview_overlay: preview,
        }
    }
}

impl Default for VisibilityPlan {
    fn default() -> Self {
        Self::derive(SessionState::Idle, false)
    }
}
