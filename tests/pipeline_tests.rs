// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests for frame analysis, detection state and autofocus

mod common;

use common::{blank_image, qr_image};
use qr_scanner::app::{
    AutoFocusController, AutoFocusState, ChannelPresenter, Clock, DetectionState, DisplayScale,
    FrameAnalysisPipeline, FrameDecoder, ManualClock, PresentationUpdate, ScannerSession,
};
use qr_scanner::backends::virtual_camera::{FileFrameSource, SimulatedFocusActuator, frame_from_rgba};
use qr_scanner::config::{Config, FocusTimingSettings};
use qr_scanner::constants::SnapshotQuality;
use qr_scanner::pipelines::photo::JpegSnapshotWriter;
use qr_scanner::PixelFormat;
use std::sync::Arc;
use std::time::Duration;

const WINDOW: Duration = Duration::from_millis(1000);

#[test]
fn test_detection_window_over_five_frames() {
    let clock = Arc::new(ManualClock::new());
    let start = clock.now();
    let detection = Arc::new(DetectionState::new());
    let (presenter, mut updates) = ChannelPresenter::new();
    let mut pipeline =
        FrameAnalysisPipeline::new(FrameDecoder::default(), detection.clone(), Arc::new(presenter))
            .with_clock(clock.clone());

    let empty = frame_from_rgba(&blank_image(200, 200), PixelFormat::Bgra, 0).unwrap();
    let hello = frame_from_rgba(&qr_image("HELLO", 4), PixelFormat::Bgra, 0).unwrap();

    // Frames at 200, 400, 600, 800 and 1000 ms; only the first is empty
    for index in 0..5u64 {
        clock.advance(Duration::from_millis(200));
        let frame = if index == 0 { &empty } else { &hello };
        let found = pipeline.analyze(&frame.view(), Duration::from_millis(200 * (index + 1)));

        assert_eq!(found, index > 0);
        assert_eq!(detection.is_barcode_found(), index > 0);
    }

    assert_eq!(
        updates.try_recv().unwrap(),
        PresentationUpdate::NoResult {
            text: "[ 200ms] No barcode".into()
        }
    );
    match updates.try_recv().unwrap() {
        PresentationUpdate::Result { text, outline } => {
            assert_eq!(text, "[ 200ms] HELLO");
            assert_eq!(outline.len(), 4);
        }
        other => panic!("expected a result, got {:?}", other),
    }

    assert!(!detection.should_sweep(start + Duration::from_millis(1200), WINDOW));

    clock.advance(Duration::from_millis(200 + 1100));
    assert!(detection.should_sweep(clock.now(), WINDOW));
}

#[test]
fn test_outline_is_scaled_to_display() {
    let (presenter, mut updates) = ChannelPresenter::new();
    let mut pipeline = FrameAnalysisPipeline::new(
        FrameDecoder::default(),
        Arc::new(DetectionState::new()),
        Arc::new(presenter),
    );

    let frame = frame_from_rgba(&qr_image("SCALE", 4), PixelFormat::Nv12, 0).unwrap();
    pipeline.analyze(&frame.view(), Duration::ZERO);
    let unscaled = match updates.try_recv().unwrap() {
        PresentationUpdate::Result { outline, .. } => outline,
        other => panic!("expected a result, got {:?}", other),
    };

    pipeline.set_display_scale(DisplayScale::new(
        frame.width as f64 * 2.0,
        frame.height as f64 * 3.0,
        frame.width,
        frame.height,
    ));
    pipeline.analyze(&frame.view(), Duration::ZERO);
    let scaled = match updates.try_recv().unwrap() {
        PresentationUpdate::Result { outline, .. } => outline,
        other => panic!("expected a result, got {:?}", other),
    };

    for ((x, y), (sx, sy)) in unscaled.iter().zip(&scaled) {
        assert!((x * 2.0 - sx).abs() < 1e-9);
        assert!((y * 3.0 - sy).abs() < 1e-9);
    }
}

#[test]
fn test_fixed_focus_lens_still_scans() {
    let detection = Arc::new(DetectionState::new());
    let controller = AutoFocusController::new(detection.clone(), FocusTimingSettings::default());
    let actuator = SimulatedFocusActuator::fixed();
    let stats = actuator.stats();

    assert_eq!(controller.start(Box::new(actuator)), Ok(AutoFocusState::Disabled));
    assert!(!controller.is_loop_running());

    let (presenter, _updates) = ChannelPresenter::new();
    let mut pipeline =
        FrameAnalysisPipeline::new(FrameDecoder::default(), detection.clone(), Arc::new(presenter));
    let frame = frame_from_rgba(&qr_image("FIXED", 4), PixelFormat::Gray8, 0).unwrap();

    assert!(pipeline.analyze(&frame.view(), Duration::ZERO));
    assert!(detection.is_barcode_found());

    controller.stop();
    assert_eq!(stats.focus_commands(), 0);
    assert_eq!(stats.releases(), 1);
}

#[test]
fn test_session_streams_file_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("code.png");
    qr_image("STREAM", 4).save(&path).unwrap();

    let mut config = Config::default();
    config.focus.tick_ms = 20;
    config.snapshot.directory = Some(dir.path().join("snaps"));

    let actuator = SimulatedFocusActuator::single_shot().with_sweep_duration(Duration::ZERO);
    let stats = actuator.stats();
    let (presenter, mut updates) = ChannelPresenter::new();

    let mut session = ScannerSession::start(&config, Some(Box::new(actuator)), Arc::new(presenter));
    assert_eq!(session.autofocus_state(), AutoFocusState::SimulatedLoop);
    session.snapshot_trigger().request();

    let source = FileFrameSource::new(&path, PixelFormat::Nv12)
        .with_row_padding(12)
        .with_interval(Duration::from_millis(20))
        .with_frame_limit(3);
    session.attach_source(source, DisplayScale::IDENTITY).unwrap();
    session.wait();

    let mut texts = Vec::new();
    while let Ok(update) = updates.try_recv() {
        texts.push(update.text().to_string());
    }
    assert_eq!(texts.len(), 3);
    assert!(texts.iter().all(|text| text.ends_with("] STREAM")));
    assert!(session.detection().is_barcode_found());

    let snapshots = std::fs::read_dir(dir.path().join("snaps")).unwrap().count();
    assert_eq!(snapshots, 1);

    session.stop();
    assert_eq!(stats.releases(), 1);
}

#[test]
fn test_snapshot_of_odd_width_nv12_frame() {
    let dir = tempfile::tempdir().unwrap();
    let (presenter, _updates) = ChannelPresenter::new();
    let mut pipeline = FrameAnalysisPipeline::new(
        FrameDecoder::default(),
        Arc::new(DetectionState::new()),
        Arc::new(presenter),
    )
    .with_snapshot_sink(Box::new(JpegSnapshotWriter::new(
        dir.path().to_path_buf(),
        "odd",
        SnapshotQuality::Medium,
    )));

    let image = qr_image("HELLO", 5);
    assert_eq!(image.width() % 2, 1);
    let frame = frame_from_rgba(&image, PixelFormat::Nv12, 0).unwrap();
    assert_eq!(frame.stride, frame.width);

    pipeline.snapshot_trigger().request();
    assert!(pipeline.analyze(&frame.view(), Duration::ZERO));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
