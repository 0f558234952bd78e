use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::Stream;
use tokio::sync::watch;
use tracing::{info, instrument};

use super::{
    ArtworkCache, AudioEngine, HttpArtworkFetcher, MediaItem, MediaSession, MetadataProvider,
    MprisSession, Notifier, PlaybackError, PlaybackStatus, SessionDescriptionAdapter,
    SessionMetadataProvider, TrackMetadata, TransportControls, engine::rodio::RodioEngine,
    monitoring::StateRelay,
};
use crate::config::{Config, TrackConfig};
use crate::services::common::Property;

/// The playback service.
///
/// Owns exactly one engine and one media session for its entire life, plus
/// the two observable holders mirrored from engine events. Constructed once,
/// torn down once; teardown releases the engine and deactivates the session
/// exactly once no matter how often it is requested.
pub struct PlaybackService {
    engine: Arc<dyn AudioEngine>,
    session: Arc<dyn MediaSession>,
    notifier: Option<Notifier>,
    track: TrackConfig,
    playback_status: Property<PlaybackStatus>,
    metadata: Property<TrackMetadata>,
    torn_down: AtomicBool,
    _relay: StateRelay,
}

impl PlaybackService {
    /// Start the service with the production engine and desktop surfaces.
    ///
    /// # Errors
    /// Returns error if the audio output, session bus, or notification
    /// daemon connection fails.
    #[instrument(skip(config))]
    pub async fn start(config: Config) -> Result<Self, PlaybackError> {
        info!("Starting playback service");

        let engine: Arc<dyn AudioEngine> = Arc::new(RodioEngine::spawn()?);
        let controls = TransportControls::new(Arc::clone(&engine));

        let session: Arc<dyn MediaSession> = Arc::new(
            MprisSession::connect(config.notification.app_name.clone(), controls).await?,
        );

        let cache = ArtworkCache::new(Arc::new(HttpArtworkFetcher::default()));
        let adapter = Arc::new(SessionDescriptionAdapter::new(cache));
        let notifier = Notifier::connect(config.notification.clone(), adapter).await?;

        let service = Self::assemble(
            engine,
            session,
            Some(notifier),
            Arc::new(SessionMetadataProvider),
            config.track,
        );

        service.session.activate().await?;
        Ok(service)
    }

    /// Wire the service from its parts.
    ///
    /// Holders start at the explicit empty status and "nothing playing"
    /// metadata; the relay starts immediately.
    pub(crate) fn assemble(
        engine: Arc<dyn AudioEngine>,
        session: Arc<dyn MediaSession>,
        notifier: Option<Notifier>,
        provider: Arc<dyn MetadataProvider>,
        track: TrackConfig,
    ) -> Self {
        let playback_status = Property::new(PlaybackStatus::empty());
        let metadata = Property::new(TrackMetadata::nothing_playing());

        let relay = StateRelay::start(
            Arc::clone(&engine),
            provider,
            Arc::clone(&session),
            notifier.clone(),
            playback_status.clone(),
            metadata.clone(),
        );

        Self {
            engine,
            session,
            notifier,
            track,
            playback_status,
            metadata,
            torn_down: AtomicBool::new(false),
            _relay: relay,
        }
    }

    /// The one-shot playback command.
    ///
    /// Constructs the fixed item from configuration and instructs the
    /// engine to load and play it immediately, replacing whatever was
    /// loaded. Every call restarts the item from position zero; there is no
    /// resume-if-already-playing check.
    ///
    /// # Errors
    /// Returns error if the source cannot be fetched or the engine is gone.
    #[instrument(skip(self))]
    pub async fn begin(&self) -> Result<(), PlaybackError> {
        let item = MediaItem::from(&self.track);
        info!("Beginning playback of {}", item.url);

        self.engine.load(item).await?;
        self.engine.play().await
    }

    /// Current playback status.
    pub fn playback_status(&self) -> PlaybackStatus {
        self.playback_status.get()
    }

    /// Stream of playback status updates, current value first.
    pub fn watch_playback_status(&self) -> impl Stream<Item = PlaybackStatus> + Send {
        self.playback_status.watch()
    }

    /// Current track metadata.
    pub fn metadata(&self) -> TrackMetadata {
        self.metadata.get()
    }

    /// Stream of metadata updates, current value first.
    pub fn watch_metadata(&self) -> impl Stream<Item = TrackMetadata> + Send {
        self.metadata.watch()
    }

    /// Transport control handle for external binders.
    pub fn transport(&self) -> TransportControls {
        TransportControls::new(Arc::clone(&self.engine))
    }

    /// Watch channel that flips when the user dismisses the notification.
    ///
    /// Returns `None` when the service runs without a notifier.
    pub fn dismissed(&self) -> Option<watch::Receiver<bool>> {
        self.notifier.as_ref().map(Notifier::dismissed)
    }

    /// Tear the service down.
    ///
    /// Closes the notification, deactivates the session, and releases the
    /// engine. Idempotent: only the first call performs the teardown.
    ///
    /// # Errors
    /// Returns error if the session or engine refuses to shut down.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), PlaybackError> {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!("Shutting down playback service");
        if let Some(notifier) = &self.notifier {
            notifier.close().await;
        }
        self.session.deactivate().await?;
        self.engine.release().await?;
        Ok(())
    }
}
