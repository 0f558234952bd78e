/// Rodio-backed audio engine
pub mod rodio;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{MediaItem, PlaybackError, PlaybackState, PlayerSnapshot};

/// Events emitted by an audio engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine's playback state changed
    StateChanged(PlaybackState),

    /// The currently loaded item changed (or its reported duration did)
    ItemChanged,
}

/// The platform playback engine seam.
///
/// Implementations own the actual audio pipeline; the service and its
/// surfaces only talk to this trait. Loading always replaces the current
/// item and restarts from position zero.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Load an item, replacing whatever was loaded, and start playing it
    /// from the beginning.
    ///
    /// # Errors
    /// Returns error if the source cannot be fetched or decoded.
    async fn load(&self, item: MediaItem) -> Result<(), PlaybackError>;

    /// Resume or start playback of the current item.
    ///
    /// # Errors
    /// Returns error if the engine is not available.
    async fn play(&self) -> Result<(), PlaybackError>;

    /// Pause playback.
    ///
    /// # Errors
    /// Returns error if the engine is not available.
    async fn pause(&self) -> Result<(), PlaybackError>;

    /// Stop playback and discard the playback position.
    ///
    /// # Errors
    /// Returns error if the engine is not available.
    async fn stop(&self) -> Result<(), PlaybackError>;

    /// Seek to an absolute position within the current item.
    ///
    /// # Errors
    /// Returns error if the engine is not available or the source does not
    /// support seeking.
    async fn seek(&self, position: Duration) -> Result<(), PlaybackError>;

    /// Current playback position.
    fn position(&self) -> Duration;

    /// Current playback state.
    fn state(&self) -> PlaybackState;

    /// Snapshot of the currently loaded item for metadata projection.
    fn snapshot(&self) -> PlayerSnapshot;

    /// Subscribe to engine events.
    ///
    /// The channel is lossy: a slow subscriber may miss intermediate
    /// events and should re-read current state from the holders.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;

    /// Release the engine and its audio resources.
    ///
    /// After release all control operations fail. Safe to call once;
    /// callers are responsible for not double-releasing.
    ///
    /// # Errors
    /// Returns error if the engine was already released.
    async fn release(&self) -> Result<(), PlaybackError>;
}
