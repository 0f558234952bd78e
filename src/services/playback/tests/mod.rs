//! Unit tests for the playback service core.
//!
//! Exercises the metadata projection, the single-slot artwork cache, the
//! state relay, and service lifecycle against in-memory engine and session
//! doubles. No audio output or D-Bus connection is required.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, oneshot};

use crate::config::TrackConfig;
use crate::services::playback::{
    Artwork, ArtworkCache, ArtworkCallback, ArtworkFetcher, AudioEngine, EngineEvent, MediaItem,
    MediaSession, MetadataProvider, PlaybackError, PlaybackState, PlaybackStatus, PlayerSnapshot,
    SessionMetadataProvider, TrackMetadata, UNKNOWN_DURATION_MS,
    service::PlaybackService,
};

async fn wait_until(description: &str, condition: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for: {description}");
}

struct MockEngine {
    events: broadcast::Sender<EngineEvent>,
    state: Mutex<PlaybackState>,
    loads: Mutex<Vec<MediaItem>>,
    position: Mutex<Duration>,
    duration: Option<Duration>,
    releases: AtomicUsize,
}

impl MockEngine {
    fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            events,
            state: Mutex::new(PlaybackState::None),
            loads: Mutex::new(Vec::new()),
            position: Mutex::new(Duration::ZERO),
            duration: Some(Duration::from_secs(90)),
            releases: AtomicUsize::new(0),
        })
    }

    fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }

    fn set_position(&self, position: Duration) {
        *self.position.lock().unwrap() = position;
    }

    fn set_state(&self, state: PlaybackState) {
        *self.state.lock().unwrap() = state;
        let _ = self.events.send(EngineEvent::StateChanged(state));
    }
}

#[async_trait]
impl AudioEngine for MockEngine {
    async fn load(&self, item: MediaItem) -> Result<(), PlaybackError> {
        self.set_state(PlaybackState::Buffering);
        self.loads.lock().unwrap().push(item);
        *self.position.lock().unwrap() = Duration::ZERO;
        let _ = self.events.send(EngineEvent::ItemChanged);
        Ok(())
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        self.set_state(PlaybackState::Paused);
        Ok(())
    }

    async fn stop(&self) -> Result<(), PlaybackError> {
        self.set_state(PlaybackState::Stopped);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<(), PlaybackError> {
        *self.position.lock().unwrap() = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        *self.position.lock().unwrap()
    }

    fn state(&self) -> PlaybackState {
        *self.state.lock().unwrap()
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            item: self.loads.lock().unwrap().last().cloned(),
            duration: self.duration,
            is_dynamic: false,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    async fn release(&self) -> Result<(), PlaybackError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct MockSession {
    activations: AtomicUsize,
    deactivations: AtomicUsize,
    statuses: Mutex<Vec<PlaybackStatus>>,
    metadata: Mutex<Vec<TrackMetadata>>,
}

#[async_trait]
impl MediaSession for MockSession {
    async fn activate(&self) -> Result<(), PlaybackError> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), PlaybackError> {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn publish_status(&self, status: &PlaybackStatus) -> Result<(), PlaybackError> {
        self.statuses.lock().unwrap().push(status.clone());
        Ok(())
    }

    async fn publish_metadata(&self, metadata: &TrackMetadata) -> Result<(), PlaybackError> {
        self.metadata.lock().unwrap().push(metadata.clone());
        Ok(())
    }
}

fn assemble(engine: Arc<MockEngine>, session: Arc<MockSession>) -> PlaybackService {
    PlaybackService::assemble(
        engine,
        session,
        None,
        Arc::new(SessionMetadataProvider),
        TrackConfig::default(),
    )
}

mod projection {
    use super::*;

    fn snapshot_for(track: &TrackConfig) -> PlayerSnapshot {
        PlayerSnapshot {
            item: Some(MediaItem::from(track)),
            duration: Some(Duration::from_secs(90)),
            is_dynamic: false,
        }
    }

    #[test]
    fn maps_item_fields_into_flat_record() {
        let track = TrackConfig::default();
        let metadata = SessionMetadataProvider.metadata(&snapshot_for(&track));

        assert_eq!(metadata.title, "Title of Audio");
        assert_eq!(metadata.subtitle, "Subtitle");
        assert_eq!(metadata.album, "Album Title");
        assert_eq!(metadata.artist, "Meeps");
        assert_eq!(metadata.media_url, track.media_url);
        assert_eq!(metadata.art_url, track.art_url);
        assert_eq!(metadata.duration_ms, 90_000);
    }

    #[test]
    fn dynamic_item_reports_unknown_duration() {
        let mut snapshot = snapshot_for(&TrackConfig::default());
        snapshot.is_dynamic = true;

        let metadata = SessionMetadataProvider.metadata(&snapshot);
        assert_eq!(metadata.duration_ms, UNKNOWN_DURATION_MS);
    }

    #[test]
    fn unset_duration_reports_unknown_duration() {
        let mut snapshot = snapshot_for(&TrackConfig::default());
        snapshot.duration = None;

        let metadata = SessionMetadataProvider.metadata(&snapshot);
        assert_eq!(metadata.duration_ms, UNKNOWN_DURATION_MS);
    }

    #[test]
    fn absent_item_degrades_to_placeholders() {
        let snapshot = PlayerSnapshot::default();
        let metadata = SessionMetadataProvider.metadata(&snapshot);

        assert_eq!(metadata.title, "");
        assert_eq!(metadata.artist, "");
        assert_eq!(metadata.media_url, "");
        assert_eq!(metadata.duration_ms, UNKNOWN_DURATION_MS);
    }

    #[test]
    fn projection_is_pure() {
        let snapshot = snapshot_for(&TrackConfig::default());

        let first = SessionMetadataProvider.metadata(&snapshot);
        let second = SessionMetadataProvider.metadata(&snapshot);
        assert_eq!(first, second);
    }
}

mod artwork_cache {
    use super::*;

    type Gate = oneshot::Sender<Option<Artwork>>;

    #[derive(Default)]
    struct MockFetcher {
        calls: Mutex<Vec<String>>,
        gates: Mutex<HashMap<String, Vec<Gate>>>,
    }

    impl MockFetcher {
        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn complete(&self, url: &str, artwork: Option<Artwork>) {
            let gates = self.gates.lock().unwrap().remove(url).unwrap_or_default();
            for gate in gates {
                let _ = gate.send(artwork.clone());
            }
        }
    }

    #[async_trait]
    impl ArtworkFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<Artwork, PlaybackError> {
            let (tx, rx) = oneshot::channel();
            self.calls.lock().unwrap().push(url.to_string());
            self.gates
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push(tx);

            match rx.await {
                Ok(Some(artwork)) => Ok(artwork),
                _ => Err(PlaybackError::FetchFailed {
                    url: url.to_string(),
                    details: "mock failure".to_string(),
                }),
            }
        }
    }

    fn recording_callback() -> (ArtworkCallback, Arc<Mutex<Vec<Artwork>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let callback: ArtworkCallback = Arc::new(move |artwork| {
            sink.lock().unwrap().push(artwork);
        });
        (callback, received)
    }

    #[tokio::test]
    async fn pending_fetch_is_not_duplicated_for_same_url() {
        let fetcher = Arc::new(MockFetcher::default());
        let cache = ArtworkCache::new(Arc::clone(&fetcher) as Arc<dyn ArtworkFetcher>);
        let (callback, received) = recording_callback();

        assert!(cache.resolve(Some("https://art/a"), Arc::clone(&callback)).is_none());
        wait_until("first fetch to start", || fetcher.call_count() == 1).await;

        assert!(cache.resolve(Some("https://art/a"), Arc::clone(&callback)).is_none());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.call_count(), 1);

        fetcher.complete("https://art/a", Some(Artwork::new(vec![1])));
        wait_until("callback to fire", || !received.lock().unwrap().is_empty()).await;

        let cached = cache.resolve(Some("https://art/a"), callback);
        assert_eq!(cached, Some(Artwork::new(vec![1])));
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn same_url_request_replaces_pending_callback() {
        let fetcher = Arc::new(MockFetcher::default());
        let cache = ArtworkCache::new(Arc::clone(&fetcher) as Arc<dyn ArtworkFetcher>);
        let (first_callback, first_received) = recording_callback();
        let (second_callback, second_received) = recording_callback();

        assert!(cache.resolve(Some("https://art/a"), first_callback).is_none());
        wait_until("fetch to start", || fetcher.call_count() == 1).await;

        // Re-requesting the pending URL swaps in the newest callback; the
        // earlier one is forgotten.
        assert!(cache.resolve(Some("https://art/a"), second_callback).is_none());
        fetcher.complete("https://art/a", Some(Artwork::new(vec![1])));
        wait_until("replacement callback to fire", || {
            !second_received.lock().unwrap().is_empty()
        })
        .await;

        assert_eq!(
            second_received.lock().unwrap().as_slice(),
            &[Artwork::new(vec![1])]
        );
        assert!(first_received.lock().unwrap().is_empty());
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn stale_result_is_discarded_after_url_change() {
        let fetcher = Arc::new(MockFetcher::default());
        let cache = ArtworkCache::new(Arc::clone(&fetcher) as Arc<dyn ArtworkFetcher>);
        let (callback, received) = recording_callback();

        assert!(cache.resolve(Some("https://art/a"), Arc::clone(&callback)).is_none());
        wait_until("first fetch to start", || fetcher.call_count() == 1).await;

        assert!(cache.resolve(Some("https://art/b"), Arc::clone(&callback)).is_none());
        wait_until("second fetch to start", || fetcher.call_count() == 2).await;

        // The fetch for the old target completes late; its result must not
        // overwrite the slot or reach the callback.
        fetcher.complete("https://art/a", Some(Artwork::new(vec![1])));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(received.lock().unwrap().is_empty());
        assert!(cache.resolve(Some("https://art/b"), Arc::clone(&callback)).is_none());

        fetcher.complete("https://art/b", Some(Artwork::new(vec![2])));
        wait_until("callback to fire", || !received.lock().unwrap().is_empty()).await;
        assert_eq!(received.lock().unwrap().as_slice(), &[Artwork::new(vec![2])]);

        let cached = cache.resolve(Some("https://art/b"), callback);
        assert_eq!(cached, Some(Artwork::new(vec![2])));
    }

    #[tokio::test]
    async fn failed_fetch_yields_no_artwork_and_no_callback() {
        let fetcher = Arc::new(MockFetcher::default());
        let cache = ArtworkCache::new(Arc::clone(&fetcher) as Arc<dyn ArtworkFetcher>);
        let (callback, received) = recording_callback();

        assert!(cache.resolve(Some("https://art/a"), Arc::clone(&callback)).is_none());
        wait_until("fetch to start", || fetcher.call_count() == 1).await;

        fetcher.complete("https://art/a", None);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(received.lock().unwrap().is_empty());
        assert_eq!(fetcher.call_count(), 1);
    }
}

mod surfaces {
    use super::*;

    use crate::services::playback::notification::notification_body;
    use crate::services::playback::session::position_jumped;

    #[test]
    fn steady_forward_progress_is_not_a_jump() {
        assert!(!position_jumped(0, 250_000));
        assert!(!position_jumped(5_000_000, 5_250_000));
        assert!(!position_jumped(0, 0));
    }

    #[test]
    fn backward_and_large_forward_moves_are_jumps() {
        assert!(position_jumped(42_000_000, 0));
        assert!(position_jumped(5_000_000, 4_000_000));
        assert!(position_jumped(0, 10_000_000));
    }

    #[test]
    fn paused_state_is_reflected_in_notification_body() {
        assert_eq!(
            notification_body(Some("Subtitle".to_string()), PlaybackState::Paused),
            "Subtitle (paused)"
        );
        assert_eq!(notification_body(None, PlaybackState::Paused), "Paused");
    }

    #[test]
    fn other_states_show_adapter_text_unchanged() {
        assert_eq!(
            notification_body(Some("Subtitle".to_string()), PlaybackState::Playing),
            "Subtitle"
        );
        assert_eq!(notification_body(None, PlaybackState::Stopped), "");
    }
}

mod relay_and_service {
    use super::*;

    #[tokio::test]
    async fn holders_start_at_explicit_defaults() {
        let engine = MockEngine::new();
        let session = Arc::new(MockSession::default());
        let service = assemble(engine, session);

        assert_eq!(service.playback_status(), PlaybackStatus::empty());
        assert_eq!(service.metadata(), TrackMetadata::nothing_playing());
    }

    #[tokio::test]
    async fn begin_reaches_playing_with_configured_title() {
        let engine = MockEngine::new();
        let session = Arc::new(MockSession::default());
        let service = assemble(Arc::clone(&engine), Arc::clone(&session));

        service.begin().await.unwrap();

        wait_until("relay to report playing", || {
            service.playback_status().state == PlaybackState::Playing
        })
        .await;
        wait_until("relay to project metadata", || {
            service.metadata().title == "Title of Audio"
        })
        .await;

        let statuses = session.statuses.lock().unwrap();
        assert_eq!(statuses.last().map(|s| s.state), Some(PlaybackState::Playing));
        drop(statuses);

        let published = session.metadata.lock().unwrap();
        assert_eq!(published.last().map(|m| m.title.as_str()), Some("Title of Audio"));
    }

    #[tokio::test]
    async fn begin_twice_restarts_from_zero() {
        let engine = MockEngine::new();
        let session = Arc::new(MockSession::default());
        let service = assemble(Arc::clone(&engine), session);

        service.begin().await.unwrap();
        engine.set_position(Duration::from_secs(42));

        service.begin().await.unwrap();

        assert_eq!(engine.load_count(), 2);
        assert_eq!(engine.position(), Duration::ZERO);
        let loads = engine.loads.lock().unwrap();
        assert_eq!(loads[0], loads[1]);
        assert_eq!(loads[1].url, TrackConfig::default().media_url);
    }

    #[tokio::test]
    async fn shutdown_releases_exactly_once() {
        let engine = MockEngine::new();
        let session = Arc::new(MockSession::default());
        let service = assemble(Arc::clone(&engine), Arc::clone(&session));

        service.shutdown().await.unwrap();
        service.shutdown().await.unwrap();

        assert_eq!(engine.releases.load(Ordering::SeqCst), 1);
        assert_eq!(session.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pause_is_relayed_with_position() {
        let engine = MockEngine::new();
        let session = Arc::new(MockSession::default());
        let service = assemble(Arc::clone(&engine), session);

        service.begin().await.unwrap();
        engine.set_position(Duration::from_secs(7));
        service.transport().pause().await.unwrap();

        wait_until("relay to report paused", || {
            service.playback_status().state == PlaybackState::Paused
        })
        .await;
        assert_eq!(service.playback_status().position, Duration::from_secs(7));
    }
}
