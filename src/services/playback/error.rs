/// Errors that can occur during playback operations
#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    /// Failed to initialize the playback service or one of its surfaces
    #[error("failed to initialize playback: {0}")]
    InitializationFailed(String),

    /// Failed to fetch a remote resource (audio bytes or artwork)
    #[error("failed to fetch '{url}': {details}")]
    FetchFailed {
        /// URL that failed to resolve
        url: String,
        /// Underlying error details
        details: String,
    },

    /// The audio source could not be decoded
    #[error("failed to decode audio source: {0}")]
    DecodeFailed(String),

    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    DbusError(#[from] zbus::Error),

    /// Failed to control the engine
    #[error("failed to control playback: {0}")]
    ControlFailed(String),
}
