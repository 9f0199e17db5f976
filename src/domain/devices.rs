//! Capturable sources and audio inputs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rectangle of a screen or window in root-window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A capturable screen or window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSource {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

/// An audio input device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioInput {
    pub device_id: String,
    pub label: String,
}

/// Snapshot of everything that can currently be captured
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSources {
    pub screens: Vec<ScreenSource>,
    pub audio_inputs: Vec<AudioInput>,
}

impl MediaSources {
    pub fn find_screen(&self, id: &str) -> Option<&ScreenSource> {
        self.screens.iter().find(|s| s.id == id)
    }

    pub fn find_audio(&self, device_id: &str) -> Option<&AudioInput> {
        self.audio_inputs.iter().find(|a| a.device_id == device_id)
    }

    /// Requested screen, or the first available one
    pub fn screen_or_first(&self, id: &str) -> Option<&ScreenSource> {
        self.find_screen(id).or_else(|| self.screens.first())
    }

    /// Requested audio input, or the first available one
    pub fn audio_or_first(&self, device_id: &str) -> Option<&AudioInput> {
        self.find_audio(device_id).or_else(|| self.audio_inputs.first())
    }
}

/// Error when a source id is not in `screen:<n>:0` / `window:<xid>:0` form
#[derive(Debug, Clone, Error)]
#[error("Invalid source id: \"{input}\". Expected screen:<index>:0 or window:<id>:0")]
pub struct InvalidSourceId {
    pub input: String,
}

/// Parsed screen source identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// Monitor by index
    Screen(u32),
    /// Top-level window by X11 id (kept in its textual form, e.g. `0x03a00003`)
    Window(String),
}

impl SourceRef {
    pub fn is_window(&self) -> bool {
        matches!(self, Self::Window(_))
    }
}

impl FromStr for SourceRef {
    type Err = InvalidSourceId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidSourceId { input: s.to_string() };
        let mut parts = s.trim().splitn(3, ':');
        let kind = parts.next().ok_or_else(err)?;
        let id = parts.next().filter(|p| !p.is_empty()).ok_or_else(err)?;

        match kind {
            "screen" => id.parse().map(Self::Screen).map_err(|_| err()),
            "window" => Ok(Self::Window(id.to_string())),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Screen(index) => write!(f, "screen:{}:0", index),
            Self::Window(id) => write!(f, "window:{}:0", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> MediaSources {
        MediaSources {
            screens: vec![
                ScreenSource {
                    id: "screen:0:0".to_string(),
                    name: "eDP-1".to_string(),
                    geometry: None,
                },
                ScreenSource {
                    id: "screen:1:0".to_string(),
                    name: "HDMI-1".to_string(),
                    geometry: None,
                },
            ],
            audio_inputs: vec![AudioInput {
                device_id: "mic-1".to_string(),
                label: "USB Mic".to_string(),
            }],
        }
    }

    #[test]
    fn parse_screen_ref() {
        assert_eq!("screen:1:0".parse::<SourceRef>().unwrap(), SourceRef::Screen(1));
    }

    #[test]
    fn parse_window_ref() {
        let r: SourceRef = "window:0x03a00003:0".parse().unwrap();
        assert_eq!(r, SourceRef::Window("0x03a00003".to_string()));
        assert!(r.is_window());
        assert_eq!(r.to_string(), "window:0x03a00003:0");
    }

    #[test]
    fn parse_invalid_ref() {
        assert!("monitor:1:0".parse::<SourceRef>().is_err());
        assert!("screen:abc:0".parse::<SourceRef>().is_err());
        assert!("screen".parse::<SourceRef>().is_err());
        assert!("".parse::<SourceRef>().is_err());
    }

    #[test]
    fn falls_back_to_first_device() {
        let sources = sources();
        assert_eq!(sources.screen_or_first("screen:1:0").unwrap().name, "HDMI-1");
        assert_eq!(sources.screen_or_first("screen:9:0").unwrap().name, "eDP-1");
        assert_eq!(sources.audio_or_first("gone").unwrap().device_id, "mic-1");
    }

    #[test]
    fn empty_sources_have_no_fallback() {
        let sources = MediaSources::default();
        assert!(sources.screen_or_first("screen:0:0").is_none());
        assert!(sources.audio_or_first("mic-1").is_none());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&sources()).unwrap();
        assert!(json.contains("\"audioInputs\""));
        assert!(json.contains("\"deviceId\":\"mic-1\""));
    }
}
