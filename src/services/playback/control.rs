use std::{sync::Arc, time::Duration};

use super::{AudioEngine, PlaybackError, PlaybackState};

/// Seek step used by the forward/backward convenience operations.
const SEEK_STEP: Duration = Duration::from_secs(10);

/// Transport control handle for the playback engine.
///
/// Cloneable; handed to the media session surface and to any external
/// binder that wants to drive playback.
#[derive(Clone)]
pub struct TransportControls {
    engine: Arc<dyn AudioEngine>,
}

impl TransportControls {
    pub(crate) fn new(engine: Arc<dyn AudioEngine>) -> Self {
        Self { engine }
    }

    /// Resume or start playback.
    ///
    /// # Errors
    /// Returns `PlaybackError::ControlFailed` if the engine is unavailable.
    pub async fn play(&self) -> Result<(), PlaybackError> {
        self.engine.play().await
    }

    /// Pause playback.
    ///
    /// # Errors
    /// Returns `PlaybackError::ControlFailed` if the engine is unavailable.
    pub async fn pause(&self) -> Result<(), PlaybackError> {
        self.engine.pause().await
    }

    /// Toggle between playing and paused.
    ///
    /// # Errors
    /// Returns `PlaybackError::ControlFailed` if the engine is unavailable.
    pub async fn play_pause(&self) -> Result<(), PlaybackError> {
        match self.engine.state() {
            PlaybackState::Playing => self.engine.pause().await,
            _ => self.engine.play().await,
        }
    }

    /// Stop playback.
    ///
    /// # Errors
    /// Returns `PlaybackError::ControlFailed` if the engine is unavailable.
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        self.engine.stop().await
    }

    /// Seek to an absolute position.
    ///
    /// # Errors
    /// Returns `PlaybackError::ControlFailed` if the engine is unavailable.
    pub async fn seek(&self, position: Duration) -> Result<(), PlaybackError> {
        self.engine.seek(position).await
    }

    /// Seek forward by the fixed step.
    ///
    /// # Errors
    /// Returns `PlaybackError::ControlFailed` if the engine is unavailable.
    pub async fn seek_forward(&self) -> Result<(), PlaybackError> {
        let target = self.engine.position().saturating_add(SEEK_STEP);
        self.engine.seek(target).await
    }

    /// Seek backward by the fixed step.
    ///
    /// # Errors
    /// Returns `PlaybackError::ControlFailed` if the engine is unavailable.
    pub async fn seek_backward(&self) -> Result<(), PlaybackError> {
        let target = self.engine.position().saturating_sub(SEEK_STEP);
        self.engine.seek(target).await
    }

    /// Current playback position.
    pub fn position(&self) -> Duration {
        self.engine.position()
    }
}
