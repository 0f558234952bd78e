use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::TrackConfig;

/// Duration value reported when the current item is dynamic or its
/// duration is unknown.
pub const UNKNOWN_DURATION_MS: i64 = -1;

/// Current playback state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing has been loaded yet
    #[default]
    None,

    /// The current item is being fetched or prepared
    Buffering,

    /// The engine is currently playing
    Playing,

    /// Playback is paused
    Paused,

    /// Playback finished or was stopped
    Stopped,

    /// The engine reported a playback error
    Error,
}

impl From<PlaybackState> for &'static str {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::None => "None",
            PlaybackState::Buffering => "Buffering",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Error => "Error",
        }
    }
}

/// Last engine-reported playback state with its position and timestamp.
///
/// Always reflects the most recent engine report. Defaults to an explicit
/// empty value before any media is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackStatus {
    /// Playback state at the time of the report
    pub state: PlaybackState,

    /// Playback position at the time of the report
    pub position: Duration,

    /// When the engine produced this report
    pub updated_at: DateTime<Utc>,
}

impl PlaybackStatus {
    /// The explicit empty status held before any media is loaded.
    pub fn empty() -> Self {
        Self {
            state: PlaybackState::None,
            position: Duration::ZERO,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self::empty()
    }
}

/// Flat metadata record for the current track, consumed by the session and
/// notification layers.
///
/// Never mutated after construction; replaced wholesale on each item change.
/// Absent fields degrade to empty strings rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackMetadata {
    /// Track title
    pub title: String,

    /// Track subtitle
    pub subtitle: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Artwork URL, empty when absent
    pub art_url: String,

    /// Media source URL, empty when absent
    pub media_url: String,

    /// Duration in milliseconds, [`UNKNOWN_DURATION_MS`] when the item is
    /// dynamic or its duration is unknown
    pub duration_ms: i64,
}

impl TrackMetadata {
    /// The "nothing playing" placeholder held before any item is loaded.
    pub fn nothing_playing() -> Self {
        Self::default()
    }
}

/// Display metadata carried by a [`MediaItem`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemMetadata {
    /// Track title
    pub title: String,

    /// Track subtitle
    pub subtitle: String,

    /// Album name
    pub album: String,

    /// Artist name
    pub artist: String,

    /// Artwork URL
    pub art_url: String,
}

/// A single playable item: one source URL plus its display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Remote URL of the audio source
    pub url: String,

    /// Display metadata for the item
    pub metadata: ItemMetadata,
}

impl From<&TrackConfig> for MediaItem {
    fn from(track: &TrackConfig) -> Self {
        Self {
            url: track.media_url.clone(),
            metadata: ItemMetadata {
                title: track.title.clone(),
                subtitle: track.subtitle.clone(),
                album: track.album.clone(),
                artist: track.artist.clone(),
                art_url: track.art_url.clone(),
            },
        }
    }
}

/// Snapshot of the engine's currently loaded item, consumed by the
/// metadata projection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerSnapshot {
    /// Currently loaded item, if any
    pub item: Option<MediaItem>,

    /// Reported duration of the current item, `None` when unknown
    pub duration: Option<Duration>,

    /// Whether the current item is a live/dynamic stream
    pub is_dynamic: bool,
}
