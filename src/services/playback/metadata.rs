use super::{PlayerSnapshot, TrackMetadata, UNKNOWN_DURATION_MS};

/// Maps the engine's currently loaded item into the flat [`TrackMetadata`]
/// record consumed by the session and notification layers.
///
/// Implementations must be pure: no side effects, no error conditions.
/// Absent fields degrade to stable placeholders rather than failing.
pub trait MetadataProvider: Send + Sync {
    /// Project a snapshot of the engine into a metadata record.
    fn metadata(&self, snapshot: &PlayerSnapshot) -> TrackMetadata;
}

/// The one metadata provider wired into the session layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionMetadataProvider;

impl MetadataProvider for SessionMetadataProvider {
    fn metadata(&self, snapshot: &PlayerSnapshot) -> TrackMetadata {
        let duration_ms = match snapshot.duration {
            Some(duration) if !snapshot.is_dynamic => i64::try_from(duration.as_millis())
                .unwrap_or(UNKNOWN_DURATION_MS),
            _ => UNKNOWN_DURATION_MS,
        };

        match &snapshot.item {
            Some(item) => TrackMetadata {
                title: item.metadata.title.clone(),
                subtitle: item.metadata.subtitle.clone(),
                artist: item.metadata.artist.clone(),
                album: item.metadata.album.clone(),
                art_url: item.metadata.art_url.clone(),
                media_url: item.url.clone(),
                duration_ms,
            },
            None => TrackMetadata {
                duration_ms,
                ..TrackMetadata::default()
            },
        }
    }
}
