//! Notification adapters

mod desktop;
mod noop;

pub use desktop::DesktopNotifier;
pub use noop::NoopNotifier;

use crate::application::ports::Notifier;

/// Desktop notifications when enabled, silence otherwise
pub fn create_notifier(enabled: bool) -> Box<dyn Notifier> {
    if enabled {
        Box::new(DesktopNotifier::new())
    } else {
        Box::new(NoopNotifier)
    }
}
