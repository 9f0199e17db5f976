//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod devices;
pub mod notifier;
pub mod settings;
pub mod transport;
pub mod windows;

// Re-export common types
pub use capture::{AcquiredStreams, AudioTrack, CaptureError, MediaCapture, VideoTrack};
pub use config::ConfigStore;
pub use devices::{DeviceEnumerator, EnumerationError};
pub use notifier::{NotificationError, NotificationIcon, Notifier};
pub use settings::{
    SettingsAck, SettingsError, SettingsSync, StoredStudio, StudioSettings, Subscription,
    UserProfile,
};
pub use transport::{ChunkTransport, TransportError};
pub use windows::{WindowError, WindowHost};
