//! Desktop notifications via notify-rust

use async_trait::async_trait;

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};

const APP_NAME: &str = "studio-recorder";

/// Sends freedesktop (or platform) notifications
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
        }
    }

    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        let title = title.to_owned();
        let message = message.to_owned();
        let app_name = self.app_name.clone();

        // the D-Bus round trip blocks
        tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .appname(&app_name)
                .summary(&title)
                .body(&message)
                .icon(icon.icon_name())
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }
}
