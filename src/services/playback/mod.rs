/// Single-slot artwork cache and fetchers
pub mod artwork;
/// Transport control handle
pub mod control;
/// Audio engine seam and backends
pub mod engine;
/// Playback error types
pub mod error;
/// Metadata projection
pub mod metadata;
/// Engine event relay
pub(crate) mod monitoring;
/// Playback notification surface
pub mod notification;
/// Playback service
pub mod service;
/// Media session surface
pub mod session;
/// Playback types
pub mod types;

#[cfg(test)]
mod tests;

pub use artwork::{Artwork, ArtworkCache, ArtworkCallback, ArtworkFetcher, HttpArtworkFetcher};
pub use control::TransportControls;
pub use engine::{AudioEngine, EngineEvent};
pub use error::PlaybackError;
pub use metadata::{MetadataProvider, SessionMetadataProvider};
pub use notification::{DescriptionAdapter, Notifier, SessionDescriptionAdapter};
pub use service::PlaybackService;
pub use session::{MediaSession, MprisSession};
pub use types::{
    ItemMetadata, MediaItem, PlaybackState, PlaybackStatus, PlayerSnapshot, TrackMetadata,
    UNKNOWN_DURATION_MS,
};
