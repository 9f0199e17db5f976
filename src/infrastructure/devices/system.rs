//! Host device enumerator

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::application::ports::{DeviceEnumerator, EnumerationError};
use crate::domain::devices::MediaSources;

use super::{audio, x11};

/// Lists monitors, windows and audio inputs of the local X11 session
pub struct SystemDeviceEnumerator {
    display: Option<String>,
    include_windows: bool,
}

impl SystemDeviceEnumerator {
    /// Use `$DISPLAY` at query time
    pub fn new() -> Self {
        Self {
            display: None,
            include_windows: true,
        }
    }

    /// Pin the X11 display, e.g. `:1`
    pub fn with_display(display: impl Into<String>) -> Self {
        Self {
            display: Some(display.into()),
            include_windows: true,
        }
    }

    /// Only offer whole monitors
    pub fn monitors_only(mut self) -> Self {
        self.include_windows = false;
        self
    }

    /// The display that will be queried
    pub fn display(&self) -> Option<String> {
        self.display
            .clone()
            .or_else(|| std::env::var("DISPLAY").ok())
            .filter(|d| !d.is_empty())
    }
}

impl Default for SystemDeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceEnumerator for SystemDeviceEnumerator {
    async fn list_sources(&self) -> Result<MediaSources, EnumerationError> {
        let x_display = self
            .display()
            .ok_or_else(|| EnumerationError::NoDisplay("DISPLAY is not set".to_string()))?;

        let mut screens = x11::list_monitors(&x_display).await?;
        if self.include_windows {
            screens.extend(x11::list_windows(&x_display).await);
        }

        let audio_inputs = match audio::list_audio_inputs().await {
            Ok(inputs) => inputs,
            Err(e) => {
                warn!(error = %e, "audio input query failed");
                Vec::new()
            }
        };

        debug!(
            display = %x_display,
            screens = screens.len(),
            audio_inputs = audio_inputs.len(),
            "media sources listed"
        );

        Ok(MediaSources {
            screens,
            audio_inputs,
        })
    }
}
