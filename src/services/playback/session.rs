use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};
use zbus::interface;
use zbus::object_server::{InterfaceRef, SignalEmitter};
use zbus::zvariant::{ObjectPath, OwnedValue, Value};

use super::{PlaybackError, PlaybackState, PlaybackStatus, TrackMetadata, TransportControls};

/// Object path shared by both MPRIS interfaces.
const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";

/// Well-known bus name claimed while the session is active.
const MPRIS_BUS_NAME: &str = "org.mpris.MediaPlayer2.chime";

/// The system media-session surface.
///
/// Mirrors the relay's status and metadata outward and routes transport
/// requests back into the engine. Activation registers the surface with the
/// desktop; deactivation must unregister it so no session handle leaks.
#[async_trait]
pub trait MediaSession: Send + Sync {
    /// Register the session with the desktop.
    ///
    /// # Errors
    /// Returns error if registration fails.
    async fn activate(&self) -> Result<(), PlaybackError>;

    /// Unregister the session.
    ///
    /// # Errors
    /// Returns error if unregistration fails.
    async fn deactivate(&self) -> Result<(), PlaybackError>;

    /// Publish a playback status update.
    ///
    /// # Errors
    /// Returns error if the update cannot be announced.
    async fn publish_status(&self, status: &PlaybackStatus) -> Result<(), PlaybackError>;

    /// Publish a metadata update.
    ///
    /// # Errors
    /// Returns error if the update cannot be announced.
    async fn publish_metadata(&self, metadata: &TrackMetadata) -> Result<(), PlaybackError>;
}

/// MPRIS media session exported on the D-Bus session bus.
pub struct MprisSession {
    connection: zbus::Connection,
    player_ref: InterfaceRef<PlayerInterface>,
}

impl MprisSession {
    /// Connect to the session bus and export both MPRIS interfaces.
    ///
    /// The well-known name is not claimed until [`MediaSession::activate`].
    ///
    /// # Errors
    /// Returns error if the bus connection or interface export fails.
    #[instrument(skip(controls))]
    pub async fn connect(
        identity: String,
        controls: TransportControls,
    ) -> Result<Self, PlaybackError> {
        let root = RootInterface { identity };
        let player = PlayerInterface::new(controls);

        let connection = zbus::connection::Builder::session()?
            .serve_at(MPRIS_PATH, root)?
            .serve_at(MPRIS_PATH, player)?
            .build()
            .await?;

        let player_ref = connection
            .object_server()
            .interface::<_, PlayerInterface>(MPRIS_PATH)
            .await?;

        Ok(Self {
            connection,
            player_ref,
        })
    }
}

#[async_trait]
impl MediaSession for MprisSession {
    async fn activate(&self) -> Result<(), PlaybackError> {
        debug!("Claiming {MPRIS_BUS_NAME}");
        self.connection.request_name(MPRIS_BUS_NAME).await?;
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), PlaybackError> {
        debug!("Releasing {MPRIS_BUS_NAME}");
        self.connection.release_name(MPRIS_BUS_NAME).await?;
        Ok(())
    }

    async fn publish_status(&self, status: &PlaybackStatus) -> Result<(), PlaybackError> {
        let mut player = self.player_ref.get_mut().await;
        let previous_us = player.position_us;
        player.playback_status = mpris_status(status.state).to_string();
        player.position_us = i64::try_from(status.position.as_micros()).unwrap_or(0);

        let emitter = self.player_ref.signal_emitter();
        player.playback_status_changed(emitter).await?;
        if position_jumped(previous_us, player.position_us) {
            PlayerInterface::seeked(emitter, player.position_us).await?;
        }
        Ok(())
    }

    async fn publish_metadata(&self, metadata: &TrackMetadata) -> Result<(), PlaybackError> {
        let mut player = self.player_ref.get_mut().await;
        player.track = metadata.clone();

        let emitter = self.player_ref.signal_emitter();
        player.metadata_changed(emitter).await?;
        Ok(())
    }
}

/// MPRIS playback status string for an engine state.
fn mpris_status(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Playing | PlaybackState::Buffering => "Playing",
        PlaybackState::Paused => "Paused",
        PlaybackState::None | PlaybackState::Stopped | PlaybackState::Error => "Stopped",
    }
}

/// Largest forward move, in microseconds, still explained by normal
/// playback drift between two engine reports.
const POSITION_DRIFT_TOLERANCE_US: i64 = 1_000_000;

/// Whether a position report is a discontinuous jump rather than ordinary
/// playback progress. Any backward move is a jump; forward moves count once
/// they exceed the drift tolerance.
pub(crate) fn position_jumped(previous_us: i64, next_us: i64) -> bool {
    next_us < previous_us || next_us - previous_us > POSITION_DRIFT_TOLERANCE_US
}

/// MPRIS metadata dictionary for a track record.
fn mpris_metadata(metadata: &TrackMetadata) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();

    let mut insert = |key: &str, value: Value<'_>| {
        if let Ok(owned) = value.try_to_owned() {
            map.insert(key.to_string(), owned);
        }
    };

    if let Ok(track_id) = ObjectPath::try_from("/org/chime/track/0") {
        insert("mpris:trackid", Value::from(track_id));
    }
    insert("xesam:title", Value::from(metadata.title.as_str()));
    insert("xesam:album", Value::from(metadata.album.as_str()));
    insert(
        "xesam:artist",
        Value::from(zbus::zvariant::Array::from(vec![metadata.artist.clone()])),
    );
    if !metadata.media_url.is_empty() {
        insert("xesam:url", Value::from(metadata.media_url.as_str()));
    }
    if !metadata.art_url.is_empty() {
        insert("mpris:artUrl", Value::from(metadata.art_url.as_str()));
    }
    if metadata.duration_ms >= 0 {
        insert("mpris:length", Value::from(metadata.duration_ms * 1000));
    }

    map
}

fn to_fdo(error: PlaybackError) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(error.to_string())
}

struct RootInterface {
    identity: String,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootInterface {
    fn raise(&self) {}

    fn quit(&self) {}

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        self.identity.clone()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["http".to_string(), "https".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec!["audio/mpeg".to_string()]
    }
}

struct PlayerInterface {
    controls: TransportControls,
    playback_status: String,
    track: TrackMetadata,
    position_us: i64,
}

impl PlayerInterface {
    fn new(controls: TransportControls) -> Self {
        Self {
            controls,
            playback_status: "Stopped".to_string(),
            track: TrackMetadata::nothing_playing(),
            position_us: 0,
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerInterface {
    async fn play(&self) -> zbus::fdo::Result<()> {
        self.controls.play().await.map_err(to_fdo)
    }

    async fn pause(&self) -> zbus::fdo::Result<()> {
        self.controls.pause().await.map_err(to_fdo)
    }

    async fn play_pause(&self) -> zbus::fdo::Result<()> {
        self.controls.play_pause().await.map_err(to_fdo)
    }

    async fn stop(&self) -> zbus::fdo::Result<()> {
        self.controls.stop().await.map_err(to_fdo)
    }

    async fn seek(&self, offset_us: i64) -> zbus::fdo::Result<()> {
        let current = self.controls.position();
        let target = if offset_us >= 0 {
            current.saturating_add(Duration::from_micros(offset_us.unsigned_abs()))
        } else {
            current.saturating_sub(Duration::from_micros(offset_us.unsigned_abs()))
        };
        self.controls.seek(target).await.map_err(to_fdo)
    }

    async fn set_position(&self, _track_id: ObjectPath<'_>, position_us: i64) -> zbus::fdo::Result<()> {
        let position = Duration::from_micros(position_us.max(0).unsigned_abs());
        self.controls.seek(position).await.map_err(to_fdo)
    }

    // Single fixed item; there is nothing to navigate to.
    fn next(&self) {}

    fn previous(&self) {}

    /// Emitted when the playback position changes discontinuously.
    #[zbus(signal)]
    async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> String {
        self.playback_status.clone()
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        mpris_metadata(&self.track)
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.position_us
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        false
    }
}
