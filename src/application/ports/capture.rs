//! Media capture port interface

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::profile::{CaptureProfile, VideoConstraints};
use crate::domain::recording::Duration;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Failed to acquire media streams: {0}")]
    AcquisitionFailed(String),

    #[error("No screen source available")]
    NoScreenSource,

    #[error("No audio input available")]
    NoAudioInput,

    #[error("Media streams are not acquired")]
    NotAcquired,

    #[error("Recorder is already running")]
    RecorderRunning,

    #[error("Failed to start recorder: {0}")]
    RecorderStartFailed(String),

    #[error("Failed to stop recorder: {0}")]
    RecorderStopFailed(String),
}

/// Video track bound to a screen or window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoTrack {
    pub source_id: String,
    pub name: String,
    pub constraints: VideoConstraints,
}

/// Audio track bound to an input device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioTrack {
    pub device_id: String,
    pub label: String,
}

/// Live streams held between acquisition and release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquiredStreams {
    pub video: VideoTrack,
    pub audio: AudioTrack,
}

/// Port for acquiring media streams and running the recorder over them.
///
/// Lifecycle: `acquire` -> `start_recorder` -> `stop_recorder` -> `release`.
/// The receiver returned by `start_recorder` yields one payload per
/// timeslice and closes after the final flushed payload, which is how callers
/// learn that the recorder is fully torn down.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Acquire video and audio streams for the profile.
    ///
    /// # Arguments
    /// * `profile` - Screen source, audio device and preset to bind
    ///
    /// # Returns
    /// The bound tracks. Missing devices fall back to the first available
    /// one, so the tracks may differ from what the profile requested.
    ///
    /// # Errors
    /// `NoScreenSource` or `NoAudioInput` when nothing can be bound,
    /// `AcquisitionFailed` when a bound device cannot be opened
    async fn acquire(&self, profile: &CaptureProfile) -> Result<AcquiredStreams, CaptureError>;

    /// Start recording the acquired streams.
    ///
    /// # Arguments
    /// * `timeslice` - Target length of each emitted chunk
    ///
    /// # Returns
    /// A receiver yielding chunks in production order. It closes once the
    /// recorder has flushed its last chunk.
    async fn start_recorder(
        &self,
        timeslice: Duration,
    ) -> Result<mpsc::Receiver<Vec<u8>>, CaptureError>;

    /// Ask the recorder to flush and stop
    async fn stop_recorder(&self) -> Result<(), CaptureError>;

    /// Release all streams. Safe to call when nothing is acquired.
    async fn release(&self) -> Result<(), CaptureError>;
}
