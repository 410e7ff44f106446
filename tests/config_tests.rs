// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use qr_scanner::Config;
use qr_scanner::constants::SnapshotQuality;
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.decoder.max_dimension, 640);
    assert!(config.decoder.try_harder);
    assert_eq!(config.focus.tick(), Duration::from_millis(1000));
    assert_eq!(config.focus.detection_window(), Duration::from_millis(1000));
    assert_eq!(config.snapshot.file_stem, "QrCodeSnap");
    assert_eq!(config.snapshot.quality, SnapshotQuality::High);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.decoder.max_dimension = 1024;
    config.focus.tick_ms = 500;
    config.snapshot.quality = SnapshotQuality::Maximum;
    config.snapshot.directory = Some(dir.path().to_path_buf());

    config.save(&path).unwrap();
    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "focus": { "tick_ms": 250 } }"#).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.focus.tick_ms, 250);
    assert_eq!(config.focus.detection_window_ms, 1000);
    assert_eq!(config.decoder, Config::default().decoder);
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(Config::load(&path).is_err());
}

#[test]
fn test_snapshot_quality_stored_as_preset_name() {
    let json = serde_json::to_value(Config::default()).unwrap();
    assert_eq!(json["snapshot"]["quality"], "High");
    assert_eq!(SnapshotQuality::High.jpeg_quality(), 92);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "snapshot": { "quality": "Low" } }"#).unwrap();
    assert_eq!(Config::load(&path).unwrap().snapshot.quality, SnapshotQuality::Low);
}
