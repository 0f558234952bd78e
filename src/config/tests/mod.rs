//! Unit tests for configuration parsing.
//!
//! Covers defaults, partial overrides, and parse failures. No filesystem
//! access; file-based loading is covered by the integration suite.

#![allow(clippy::unwrap_used)]

use crate::config::Config;

#[test]
fn defaults_carry_the_fixed_track() {
    let config = Config::default();

    assert_eq!(config.track.title, "Title of Audio");
    assert_eq!(config.track.subtitle, "Subtitle");
    assert_eq!(config.track.album, "Album Title");
    assert_eq!(config.track.artist, "Meeps");
    assert!(config.track.media_url.ends_with("SoundHelix-Song-1.mp3"));
    assert!(config.track.art_url.starts_with("https://"));
}

#[test]
fn defaults_carry_the_notification_channel() {
    let config = Config::default();

    assert_eq!(config.notification.channel, "media_playback_channel");
    assert_eq!(config.notification.id, 100);
    assert_eq!(config.notification.app_name, "Chime");
}

#[test]
fn empty_toml_parses_to_defaults() {
    let config = Config::from_toml_str("", None).unwrap();

    assert_eq!(config.track, Config::default().track);
    assert_eq!(config.notification, Config::default().notification);
}

#[test]
fn partial_override_keeps_remaining_defaults() {
    let toml = r#"
        [track]
        title = "Other Title"

        [notification]
        id = 7
    "#;
    let config = Config::from_toml_str(toml, None).unwrap();

    assert_eq!(config.track.title, "Other Title");
    assert_eq!(config.track.artist, "Meeps");
    assert_eq!(config.notification.id, 7);
    assert_eq!(config.notification.channel, "media_playback_channel");
}

#[test]
fn invalid_toml_reports_parse_error() {
    let result = Config::from_toml_str("[track\ntitle = ", None);

    assert!(result.is_err());
}

#[test]
fn unknown_log_level_is_kept_verbatim() {
    let toml = r#"
        [general]
        log_level = "trace"
    "#;
    let config = Config::from_toml_str(toml, None).unwrap();

    assert_eq!(config.general.log_level, "trace");
}
