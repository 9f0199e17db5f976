//! Media source enumeration for X11 hosts

mod audio;
mod system;
mod x11;

pub use audio::list_audio_inputs;
pub use system::SystemDeviceEnumerator;
pub use x11::{parse_monitors, parse_windows};
