//! Chime - Single-track audio playback daemon.
//!
//! Chime plays one configured remote audio track through the system audio
//! output and mirrors playback into the desktop's media surfaces:
//!
//! - Reactive playback service with observable state holders
//! - MPRIS media session exposing transport controls over D-Bus
//! - Desktop notification with cached track artwork
//! - TOML configuration with full defaults
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chime::config::Config;
//! use chime::services::playback::PlaybackService;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let service = PlaybackService::start(config).await?;
//! service.begin().await?;
//! # Ok(())
//! # }
//! ```

/// Configuration schema, defaults and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Reactive services for playback and desktop integration.
pub mod services;

/// Tracing initialization helpers.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{ChimeError, Result};
