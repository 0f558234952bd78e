use std::{
    io::Cursor,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::{AudioEngine, EngineEvent};
use crate::services::playback::{MediaItem, PlaybackError, PlaybackState, PlayerSnapshot};

/// How often the audio thread refreshes the playback position.
const POSITION_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Event channel capacity; subscribers that lag simply miss events.
const EVENT_CAPACITY: usize = 32;

enum AudioCommand {
    Load(Vec<u8>),
    Play,
    Pause,
    Stop,
    Seek(Duration),
    Shutdown,
}

#[derive(Default)]
struct EngineState {
    item: Option<MediaItem>,
    duration: Option<Duration>,
    position: Duration,
    playback: PlaybackState,
}

/// Audio engine backed by a dedicated `rodio` output thread.
///
/// The thread owns the output stream and sink; the async side talks to it
/// through a command channel. Sources are fetched fully into memory before
/// decoding, so items are never dynamic.
pub struct RodioEngine {
    cmd_tx: mpsc::Sender<AudioCommand>,
    events: broadcast::Sender<EngineEvent>,
    shared: Arc<Mutex<EngineState>>,
    http: reqwest::Client,
    released: AtomicBool,
}

impl RodioEngine {
    /// Spawn the audio thread and return the engine handle.
    ///
    /// # Errors
    /// Returns `PlaybackError::InitializationFailed` if the audio output
    /// device cannot be opened.
    pub fn spawn() -> Result<Self, PlaybackError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (init_tx, init_rx) = mpsc::channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let shared = Arc::new(Mutex::new(EngineState::default()));

        let thread_shared = Arc::clone(&shared);
        let thread_events = events.clone();
        thread::Builder::new()
            .name("chime-audio".to_string())
            .spawn(move || {
                audio_thread(cmd_rx, init_tx, thread_shared, thread_events);
            })
            .map_err(|e| {
                PlaybackError::InitializationFailed(format!("audio thread spawn failed: {e}"))
            })?;

        match init_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(details)) => return Err(PlaybackError::InitializationFailed(details)),
            Err(_) => {
                return Err(PlaybackError::InitializationFailed(
                    "audio thread exited during startup".to_string(),
                ));
            }
        }

        Ok(Self {
            cmd_tx,
            events,
            shared,
            http: reqwest::Client::new(),
            released: AtomicBool::new(false),
        })
    }

    fn send(&self, command: AudioCommand) -> Result<(), PlaybackError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(PlaybackError::ControlFailed("engine released".to_string()));
        }

        self.cmd_tx
            .send(command)
            .map_err(|_| PlaybackError::ControlFailed("audio thread is dead".to_string()))
    }

    fn set_state(&self, state: PlaybackState) {
        if let Ok(mut engine_state) = self.shared.lock() {
            engine_state.playback = state;
        }
        let _ = self.events.send(EngineEvent::StateChanged(state));
    }

    async fn fetch_source(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PlaybackError::FetchFailed {
                url: url.to_string(),
                details: e.to_string(),
            })?;

        let bytes = response.bytes().await.map_err(|e| PlaybackError::FetchFailed {
            url: url.to_string(),
            details: e.to_string(),
        })?;

        debug!("Fetched audio source ({} bytes) from {url}", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl AudioEngine for RodioEngine {
    async fn load(&self, item: MediaItem) -> Result<(), PlaybackError> {
        self.set_state(PlaybackState::Buffering);

        let data = match self.fetch_source(&item.url).await {
            Ok(data) => data,
            Err(e) => {
                self.set_state(PlaybackState::Error);
                return Err(e);
            }
        };

        if let Ok(mut engine_state) = self.shared.lock() {
            engine_state.item = Some(item);
            engine_state.duration = None;
            engine_state.position = Duration::ZERO;
        }
        let _ = self.events.send(EngineEvent::ItemChanged);

        self.send(AudioCommand::Load(data))
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        self.send(AudioCommand::Play)
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        self.send(AudioCommand::Pause)
    }

    async fn stop(&self) -> Result<(), PlaybackError> {
        self.send(AudioCommand::Stop)
    }

    async fn seek(&self, position: Duration) -> Result<(), PlaybackError> {
        self.send(AudioCommand::Seek(position))
    }

    fn position(&self) -> Duration {
        self.shared
            .lock()
            .map(|engine_state| engine_state.position)
            .unwrap_or_default()
    }

    fn state(&self) -> PlaybackState {
        self.shared
            .lock()
            .map(|engine_state| engine_state.playback)
            .unwrap_or_default()
    }

    fn snapshot(&self) -> PlayerSnapshot {
        self.shared
            .lock()
            .map(|engine_state| PlayerSnapshot {
                item: engine_state.item.clone(),
                duration: engine_state.duration,
                is_dynamic: false,
            })
            .unwrap_or_default()
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    async fn release(&self) -> Result<(), PlaybackError> {
        self.send(AudioCommand::Shutdown)?;
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
    }
}

fn audio_thread(
    cmd_rx: mpsc::Receiver<AudioCommand>,
    init_tx: mpsc::Sender<Result<(), String>>,
    shared: Arc<Mutex<EngineState>>,
    events: broadcast::Sender<EngineEvent>,
) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(e) => {
            let _ = init_tx.send(Err(format!("audio output unavailable: {e}")));
            return;
        }
    };
    let _ = init_tx.send(Ok(()));

    let mut sink: Option<Sink> = None;

    loop {
        match cmd_rx.recv_timeout(POSITION_POLL_INTERVAL) {
            Ok(AudioCommand::Load(data)) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }

                let new_sink = match Sink::try_new(&stream_handle) {
                    Ok(new_sink) => new_sink,
                    Err(e) => {
                        warn!("Failed to open sink: {e}");
                        publish_state(&shared, &events, PlaybackState::Error);
                        continue;
                    }
                };

                let source = match Decoder::new(Cursor::new(data)) {
                    Ok(source) => source,
                    Err(e) => {
                        warn!("Failed to decode source: {e}");
                        publish_state(&shared, &events, PlaybackState::Error);
                        continue;
                    }
                };

                let duration = source.total_duration();
                new_sink.append(source);
                new_sink.play();
                sink = Some(new_sink);

                if let Ok(mut engine_state) = shared.lock() {
                    engine_state.duration = duration;
                    engine_state.position = Duration::ZERO;
                    engine_state.playback = PlaybackState::Playing;
                }
                // Duration becomes known only after decode; re-announce the
                // item so projected metadata picks it up.
                let _ = events.send(EngineEvent::ItemChanged);
                let _ = events.send(EngineEvent::StateChanged(PlaybackState::Playing));
            }
            Ok(AudioCommand::Play) => {
                if let Some(sink) = &sink {
                    sink.play();
                    publish_state(&shared, &events, PlaybackState::Playing);
                }
            }
            Ok(AudioCommand::Pause) => {
                if let Some(sink) = &sink {
                    sink.pause();
                    publish_state(&shared, &events, PlaybackState::Paused);
                }
            }
            Ok(AudioCommand::Stop) => {
                if let Some(sink) = sink.take() {
                    sink.stop();
                }
                if let Ok(mut engine_state) = shared.lock() {
                    engine_state.position = Duration::ZERO;
                }
                publish_state(&shared, &events, PlaybackState::Stopped);
            }
            Ok(AudioCommand::Seek(position)) => {
                if let Some(sink) = &sink {
                    if let Err(e) = sink.try_seek(position) {
                        warn!("Seek failed: {e}");
                    } else if let Ok(mut engine_state) = shared.lock() {
                        engine_state.position = position;
                    }
                }
            }
            Ok(AudioCommand::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                if let Some(sink) = sink.take() {
                    sink.stop();
                }
                debug!("Audio thread shutting down");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let Some(current) = &sink else { continue };

                let finished = current.empty();
                if let Ok(mut engine_state) = shared.lock() {
                    if !finished {
                        engine_state.position = current.get_pos();
                    }
                }

                if finished {
                    sink = None;
                    publish_state(&shared, &events, PlaybackState::Stopped);
                }
            }
        }
    }
}

fn publish_state(
    shared: &Arc<Mutex<EngineState>>,
    events: &broadcast::Sender<EngineEvent>,
    state: PlaybackState,
) {
    if let Ok(mut engine_state) = shared.lock() {
        engine_state.playback = state;
    }
    let _ = events.send(EngineEvent::StateChanged(state));
}
