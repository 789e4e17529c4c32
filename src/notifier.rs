//! Desktop notifications via notify-rust (D-Bus).
//!
//! Action results are shown as short-lived toasts; the user can dismiss
//! them, and a failure to show one never affects the action itself.

use notify_rust::{Notification, Urgency};
use tracing::{debug, warn};

const APP_NAME: &str = "Lingo Tutor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn notify(&self, level: Level, body: &str) {
        if !self.enabled {
            return;
        }

        debug!("Notification ({level:?}): {body}");

        let (icon, urgency, timeout) = match level {
            Level::Success => ("dialog-information", Urgency::Low, 2600),
            Level::Error => ("dialog-error", Urgency::Normal, 3200),
        };

        if let Err(e) = Notification::new()
            .appname(APP_NAME)
            .summary(APP_NAME)
            .body(body)
            .icon(icon)
            .urgency(urgency)
            .timeout(timeout)
            .show()
        {
            warn!("Failed to show notification: {e}");
        }
    }
}
