use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};
use zbus::proxy;
use zbus::zvariant::Value;

use super::{
    Artwork, ArtworkCache, ArtworkCallback, PlaybackError, PlaybackState, PlaybackStatus,
    TrackMetadata,
};
use crate::config::{ConfigPaths, NotificationConfig};

/// NotificationClosed reason for a user dismissal.
const REASON_DISMISSED_BY_USER: u32 = 2;

/// Supplies the text and icon shown by the playback notification.
///
/// Icon resolution is allowed to defer: a `None` return with a pending
/// `on_ready` callback means the icon arrives later, if at all.
pub trait DescriptionAdapter: Send + Sync {
    /// Title line of the notification.
    fn content_title(&self, metadata: &TrackMetadata) -> String;

    /// Body line of the notification, if any.
    fn content_text(&self, metadata: &TrackMetadata) -> Option<String>;

    /// Optional "open app" target. Always absent in this implementation.
    fn open_target(&self) -> Option<String>;

    /// Resolve the large icon for the given artwork URL.
    ///
    /// Returns the cached artwork synchronously when available; otherwise
    /// returns `None` and invokes `on_ready` once a deferred fetch
    /// completes.
    fn large_icon(&self, art_url: Option<&str>, on_ready: ArtworkCallback) -> Option<Artwork>;
}

/// The one description adapter wired into the notifier.
pub struct SessionDescriptionAdapter {
    cache: ArtworkCache,
}

impl SessionDescriptionAdapter {
    /// Create an adapter over the given artwork cache.
    pub fn new(cache: ArtworkCache) -> Self {
        Self { cache }
    }
}

impl DescriptionAdapter for SessionDescriptionAdapter {
    fn content_title(&self, metadata: &TrackMetadata) -> String {
        metadata.title.clone()
    }

    fn content_text(&self, metadata: &TrackMetadata) -> Option<String> {
        if metadata.subtitle.is_empty() {
            None
        } else {
            Some(metadata.subtitle.clone())
        }
    }

    fn open_target(&self) -> Option<String> {
        None
    }

    fn large_icon(&self, art_url: Option<&str>, on_ready: ArtworkCallback) -> Option<Artwork> {
        self.cache.resolve(art_url, on_ready)
    }
}

/// Desktop notification daemon proxy (org.freedesktop.Notifications).
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    /// Post or replace a notification, returning its server-assigned id.
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    /// Close a previously posted notification.
    fn close_notification(&self, id: u32) -> zbus::Result<()>;

    /// Emitted when a notification is closed.
    #[zbus(signal)]
    fn notification_closed(&self, id: u32, reason: u32) -> zbus::Result<()>;
}

/// Body line shown under the notification title. Paused playback is called
/// out; every other state shows the adapter text as-is.
pub(crate) fn notification_body(text: Option<String>, state: PlaybackState) -> String {
    let text = text.unwrap_or_default();
    match state {
        PlaybackState::Paused if text.is_empty() => "Paused".to_string(),
        PlaybackState::Paused => format!("{text} (paused)"),
        _ => text,
    }
}

struct NotifierInner {
    proxy: NotificationsProxy<'static>,
    config: NotificationConfig,
    adapter: Arc<dyn DescriptionAdapter>,
    posted_id: AtomicU32,
    dismissed_tx: watch::Sender<bool>,
}

/// Maintains the single ongoing playback notification.
///
/// Posting failures are logged and absorbed; a missing notification daemon
/// never takes playback down. A close signal with the "dismissed by user"
/// reason flips the dismissal watch channel so the owning service can stop.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

impl Notifier {
    /// Connect to the notification daemon and start watching for closes.
    ///
    /// # Errors
    /// Returns error if the session bus connection fails.
    #[instrument(skip(adapter))]
    pub async fn connect(
        config: NotificationConfig,
        adapter: Arc<dyn DescriptionAdapter>,
    ) -> Result<Self, PlaybackError> {
        let connection = zbus::Connection::session().await?;
        let proxy = NotificationsProxy::new(&connection).await?;
        let (dismissed_tx, _) = watch::channel(false);

        let notifier = Self {
            inner: Arc::new(NotifierInner {
                proxy,
                config,
                adapter,
                posted_id: AtomicU32::new(0),
                dismissed_tx,
            }),
        };

        notifier.watch_closes().await?;
        Ok(notifier)
    }

    /// Subscribe to the user-dismissal flag.
    pub fn dismissed(&self) -> watch::Receiver<bool> {
        self.inner.dismissed_tx.subscribe()
    }

    /// Post or update the notification for the given state.
    ///
    /// Resolves the icon through the description adapter; when the icon is
    /// still being fetched the notification is posted without one and
    /// re-posted by the fetch callback.
    pub async fn post(&self, metadata: &TrackMetadata, status: &PlaybackStatus) {
        let art_url = (!metadata.art_url.is_empty()).then_some(metadata.art_url.as_str());

        let notifier = self.clone();
        let callback_metadata = metadata.clone();
        let callback_status = status.clone();
        let on_ready: ArtworkCallback = Arc::new(move |artwork| {
            let notifier = notifier.clone();
            let metadata = callback_metadata.clone();
            let status = callback_status.clone();
            tokio::spawn(async move {
                notifier.render(&metadata, &status, Some(artwork)).await;
            });
        });

        let icon = self.inner.adapter.large_icon(art_url, on_ready);
        self.render(metadata, status, icon).await;
    }

    /// Close the notification if one was posted.
    pub async fn close(&self) {
        let id = self.inner.posted_id.load(Ordering::SeqCst);
        if id == 0 {
            return;
        }
        if let Err(e) = self.inner.proxy.close_notification(id).await {
            debug!("Failed to close notification {id}: {e}");
        }
    }

    async fn render(
        &self,
        metadata: &TrackMetadata,
        status: &PlaybackStatus,
        icon: Option<Artwork>,
    ) {
        if let Err(e) = self.try_render(metadata, status, icon).await {
            warn!("Failed to post playback notification: {e}");
        }
    }

    async fn try_render(
        &self,
        metadata: &TrackMetadata,
        status: &PlaybackStatus,
        icon: Option<Artwork>,
    ) -> Result<(), PlaybackError> {
        let icon_path = match icon {
            Some(artwork) => Some(self.stage_artwork(&artwork).await?),
            None => None,
        };

        let summary = self.inner.adapter.content_title(metadata);
        let body = notification_body(self.inner.adapter.content_text(metadata), status.state);

        let mut hints: HashMap<&str, Value<'_>> = HashMap::new();
        hints.insert("x-chime-channel", Value::from(self.inner.config.channel.as_str()));
        if let Some(path) = &icon_path {
            hints.insert("image-path", Value::from(path.as_str()));
        }

        let previous = self.inner.posted_id.load(Ordering::SeqCst);
        let replaces_id = if previous == 0 {
            self.inner.config.id
        } else {
            previous
        };

        let id = self
            .inner
            .proxy
            .notify(
                &self.inner.config.app_name,
                replaces_id,
                "",
                &summary,
                &body,
                &[],
                hints,
                0,
            )
            .await?;
        self.inner.posted_id.store(id, Ordering::SeqCst);

        Ok(())
    }

    async fn stage_artwork(&self, artwork: &Artwork) -> Result<String, PlaybackError> {
        let dir = ConfigPaths::artwork_dir()
            .map_err(|e| PlaybackError::ControlFailed(format!("artwork staging failed: {e}")))?;
        let path = dir.join("cover");

        tokio::fs::write(&path, artwork.bytes()).await.map_err(|e| {
            PlaybackError::ControlFailed(format!("artwork staging failed: {e}"))
        })?;

        Ok(path.to_string_lossy().to_string())
    }

    async fn watch_closes(&self) -> Result<(), PlaybackError> {
        let mut closed = self.inner.proxy.receive_notification_closed().await?;

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            while let Some(signal) = closed.next().await {
                let Ok(args) = signal.args() else { continue };

                let posted = inner.posted_id.load(Ordering::SeqCst);
                if args.id != posted {
                    continue;
                }

                if args.reason == REASON_DISMISSED_BY_USER {
                    debug!("Notification dismissed by user, requesting stop");
                    let _ = inner.dismissed_tx.send(true);
                }
            }
        });

        Ok(())
    }
}
