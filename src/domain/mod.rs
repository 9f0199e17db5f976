//! Domain layer - Core business logic
//!
//! Contains value objects, the session state machine, the message set and
//! domain errors. This layer has no dependencies on external systems.

pub mod config;
pub mod devices;
pub mod error;
pub mod message;
pub mod profile;
pub mod recording;
pub mod session;
pub mod visibility;

// Re-export common types
pub use config::AppConfig;
pub use devices::{AudioInput, Geometry, MediaSources, ScreenSource, SourceRef};
pub use error::*;
pub use message::{Destination, Message, Reply, StatusReport, StudioAction};
pub use profile::{CaptureProfile, PartialCaptureProfile, Plan, Preset, VideoConstraints};
pub use recording::{Chunk, Duration, RecordingTimer, SessionFilename};
pub use session::{InvalidStateTransition, SessionMachine, SessionState};
pub use visibility::{SizeClass, Surface, VisibilityPlan};
