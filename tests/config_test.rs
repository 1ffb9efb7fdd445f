//! Tests for configuration files

use circle_search::{
    config::{Config, EXAMPLE_CONFIG},
    session::CaptureSession,
    Error,
};

#[test]
fn test_config_round_trip() {
    let mut config = Config::default();
    config.tracker.speed_filter = "median".to_string();
    config.pipeline.resample_count = 256;
    config.pipeline.legacy_display_flip = false;
    config.crop.short_side_px = 720;
    config.panel.world_up = [0.0, 0.0, 1.0];

    let file = tempfile::NamedTempFile::new().unwrap();
    config.to_file(file.path()).unwrap();
    let loaded = Config::from_file(file.path()).unwrap();

    assert_eq!(loaded, config);
    loaded.validate().unwrap();
}

#[test]
fn test_example_config_loads() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), EXAMPLE_CONFIG).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.tracker.speed_filter, "truncated_mean:2");
    assert_eq!(config.crop.short_side_px, 1080);
}

#[test]
fn test_empty_file_gives_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "{}").unwrap();
    assert_eq!(Config::from_file(file.path()).unwrap(), Config::default());
}

#[test]
fn test_invalid_values_are_reported() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "panel:\n  width: -0.3\n").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    match config.validate() {
        Err(Error::ConfigError(msg)) => assert!(msg.contains("Panel size")),
        other => panic!("Expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_session_rejects_unknown_filter() {
    let mut config = Config::default();
    config.tracker.speed_filter = "kalman".to_string();
    assert!(matches!(CaptureSession::inline(&config), Err(Error::FilterError(_))));
}
