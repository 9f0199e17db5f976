//! Device enumeration port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::devices::MediaSources;

/// Enumeration errors
#[derive(Debug, Clone, Error)]
pub enum EnumerationError {
    #[error("No display available: {0}")]
    NoDisplay(String),

    #[error("Capture permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to list devices: {0}")]
    QueryFailed(String),
}

/// Port for listing capturable screens/windows and audio inputs.
/// Devices come and go; every call queries the host again.
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    /// List capturable screens, windows and audio inputs.
    ///
    /// # Returns
    /// Screens and windows in `screens`, microphones in `audio_inputs`.
    /// Either list may be empty.
    async fn list_sources(&self) -> Result<MediaSources, EnumerationError>;
}

#[async_trait]
impl DeviceEnumerator for Box<dyn DeviceEnumerator> {
    async fn list_sources(&self) -> Result<MediaSources, EnumerationError> {
        self.as_ref().list_sources().await
    }
}
