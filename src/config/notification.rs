use serde::{Deserialize, Serialize};

/// Desktop notification settings.
///
/// Exactly one notification is maintained while the service runs; the
/// numeric id doubles as the replaces-id so updates reuse the same bubble.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    /// Channel tag attached to the notification hints.
    pub channel: String,

    /// Fixed notification id.
    pub id: u32,

    /// Application display name shown by the notification daemon.
    pub app_name: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel: "media_playback_channel".to_string(),
            id: 100,
            app_name: "Chime".to_string(),
        }
    }
}
