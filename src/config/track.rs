use serde::{Deserialize, Serialize};

/// The single playback item: one remote audio source plus its display
/// metadata. Every field has a literal default so the daemon plays
/// something meaningful out of the box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrackConfig {
    /// Remote URL of the audio source.
    pub media_url: String,

    /// Track title.
    pub title: String,

    /// Track subtitle.
    pub subtitle: String,

    /// Album name.
    pub album: String,

    /// Artist name.
    pub artist: String,

    /// Remote URL of the artwork image.
    pub art_url: String,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            media_url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3"
                .to_string(),
            title: "Title of Audio".to_string(),
            subtitle: "Subtitle".to_string(),
            album: "Album Title".to_string(),
            artist: "Meeps".to_string(),
            art_url: "https://cdn.britannica.com/84/206384-050-00698723/Javan-gliding-tree-frog.jpg"
                .to_string(),
        }
    }
}
