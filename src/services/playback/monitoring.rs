use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{
    AudioEngine, EngineEvent, MediaSession, MetadataProvider, Notifier, PlaybackStatus,
};
use crate::services::common::Property;
use crate::services::playback::TrackMetadata;

/// Relays engine events into the observable holders and the desktop
/// surfaces.
///
/// Purely reactive and lossy-to-latest: the holders always reflect only the
/// most recent engine report. The relay task is aborted when the relay is
/// dropped; outstanding surface updates are abandoned with it.
pub(crate) struct StateRelay {
    handle: JoinHandle<()>,
}

impl StateRelay {
    /// Start relaying events from the engine.
    pub(crate) fn start(
        engine: Arc<dyn AudioEngine>,
        provider: Arc<dyn MetadataProvider>,
        session: Arc<dyn MediaSession>,
        notifier: Option<Notifier>,
        status_holder: Property<PlaybackStatus>,
        metadata_holder: Property<TrackMetadata>,
    ) -> Self {
        // Subscribe before spawning so no event emitted right after
        // construction is missed.
        let events = engine.subscribe();

        let handle = tokio::spawn(async move {
            Self::relay(
                events,
                engine,
                provider,
                session,
                notifier,
                status_holder,
                metadata_holder,
            )
            .await;
        });

        Self { handle }
    }

    #[allow(clippy::too_many_arguments)]
    async fn relay(
        mut events: broadcast::Receiver<EngineEvent>,
        engine: Arc<dyn AudioEngine>,
        provider: Arc<dyn MetadataProvider>,
        session: Arc<dyn MediaSession>,
        notifier: Option<Notifier>,
        status_holder: Property<PlaybackStatus>,
        metadata_holder: Property<TrackMetadata>,
    ) {
        loop {
            match events.recv().await {
                Ok(EngineEvent::StateChanged(state)) => {
                    let status = PlaybackStatus {
                        state,
                        position: engine.position(),
                        updated_at: Utc::now(),
                    };
                    status_holder.set(status.clone());

                    if let Err(e) = session.publish_status(&status).await {
                        warn!("Failed to publish playback status: {e}");
                    }
                    if let Some(notifier) = &notifier {
                        notifier.post(&metadata_holder.get(), &status).await;
                    }
                }
                Ok(EngineEvent::ItemChanged) => {
                    let metadata = provider.metadata(&engine.snapshot());
                    metadata_holder.set(metadata.clone());

                    if let Err(e) = session.publish_metadata(&metadata).await {
                        warn!("Failed to publish metadata: {e}");
                    }
                    if let Some(notifier) = &notifier {
                        notifier.post(&metadata, &status_holder.get()).await;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!("Relay lagged behind engine events, missed {missed}");
                }
                Err(RecvError::Closed) => {
                    debug!("Engine event stream closed, relay stopping");
                    break;
                }
            }
        }
    }
}

impl Drop for StateRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
