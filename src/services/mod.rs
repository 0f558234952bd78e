/// Common utilities and abstractions for services
pub mod common;
/// Audio playback service
pub mod playback;

pub use playback::{PlaybackService, PlaybackState, PlaybackStatus, TrackMetadata};
