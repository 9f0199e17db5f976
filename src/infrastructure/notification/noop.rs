//! Notifier that drops everything

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        _icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        debug!(title, message, "notification suppressed");
        Ok(())
    }
}
