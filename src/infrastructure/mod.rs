//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the application ports: ffmpeg capture,
//! X11/cpal device listing, HTTP transport and settings, desktop
//! notifications and the TOML config store.

pub mod capture;
pub mod config;
pub mod devices;
pub mod notification;
pub mod settings;
pub mod transport;
pub mod window;

pub use capture::FfmpegCapture;
pub use config::XdgConfigStore;
pub use devices::SystemDeviceEnumerator;
pub use notification::{create_notifier, DesktopNotifier, NoopNotifier};
pub use settings::HttpSettingsSync;
pub use transport::HttpChunkTransport;
pub use window::HeadlessWindowHost;
