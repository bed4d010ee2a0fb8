//! System notifications for break events

use notify_rust::Notification;
use tracing::{debug, warn};

use crate::error::NotifyError;

pub const BREAK_NOTIFICATION_TITLE: &str = "Move Break Time!";
pub const BREAK_NOTIFICATION_BODY: &str =
    "Stand up, stretch, and move around. Take a break from your computer!";

pub trait Notifier: Send {
    /// Fire and forget. An error means the notification was not dispatched.
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Desktop notifications through the platform notification service.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| NotifyError::NoRuntime)?;
        let app_name = self.app_name.clone();
        let (title, body) = (title.to_string(), body.to_string());

        // D-Bus / NSUserNotification calls block, keep them off the controller task.
        handle.spawn_blocking(move || {
            match send_notification(&app_name, &title, &body) {
                Ok(()) => debug!(%title, "notification shown"),
                Err(e) => warn!(error = %e, "Failed to show notification"),
            }
        });
        Ok(())
    }
}

fn send_notification(app_name: &str, title: &str, body: &str) -> Result<(), NotifyError> {
    let mut notification = Notification::new();
    notification.appname(app_name).summary(title).body(body);

    #[cfg(target_os = "macos")]
    notification.sound_name("Glass");

    notification
        .show()
        .map_err(|e| NotifyError::Dispatch(e.to_string()))?;
    Ok(())
}
