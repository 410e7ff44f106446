// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame analysis
//!
//! [`FrameAnalysisPipeline::analyze`] is called by the capture source once
//! per delivered frame, serially, on the capture thread:
//!
//! ```text
//! snapshot? → decode_start → decode → decode_stop → DetectionState → Presenter
//! ```
//!
//! Nothing that goes wrong for one frame escapes this call: decode contract
//! violations and snapshot failures are logged and the frame is reported as
//! having no barcode.

use crate::app::detection::DetectionState;
use crate::app::frame_processor::{DecodeResult, DisplayScale, FrameDecoder};
use crate::app::presentation::{
    DecodeObserver, Presenter, TracingDecodeObserver, no_result_line, result_line,
};
use crate::app::timing::{Clock, Stopwatch, SystemClock};
use crate::backends::camera::types::FrameView;
use crate::pipelines::photo::{SnapshotSink, SnapshotTrigger};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Decodes frames and publishes the results
pub struct FrameAnalysisPipeline {
    decoder: FrameDecoder,
    detection: Arc<DetectionState>,
    presenter: Arc<dyn Presenter>,
    observer: Arc<dyn DecodeObserver>,
    clock: Arc<dyn Clock>,
    stopwatch: Stopwatch,
    display_scale: DisplayScale,
    snapshot_trigger: SnapshotTrigger,
    snapshot_sink: Option<Box<dyn SnapshotSink>>,
    frames: u64,
}

impl FrameAnalysisPipeline {
    pub fn new(
        decoder: FrameDecoder,
        detection: Arc<DetectionState>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            decoder,
            detection,
            presenter,
            observer: Arc::new(TracingDecodeObserver::new()),
            stopwatch: Stopwatch::start(Arc::clone(&clock)),
            clock,
            display_scale: DisplayScale::IDENTITY,
            snapshot_trigger: SnapshotTrigger::new(),
            snapshot_sink: None,
            frames: 0,
        }
    }

    /// Read detection and latency time from `clock`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.stopwatch = Stopwatch::start(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn DecodeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_display_scale(mut self, scale: DisplayScale) -> Self {
        self.display_scale = scale;
        self
    }

    /// Save triggered snapshots to `sink`
    pub fn with_snapshot_sink(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.snapshot_sink = Some(sink);
        self
    }

    /// Use an externally owned trigger instead of the pipeline's own
    pub fn with_snapshot_trigger(mut self, trigger: SnapshotTrigger) -> Self {
        self.snapshot_trigger = trigger;
        self
    }

    /// Update the overlay scale, e.g. after the preview was resized
    pub fn set_display_scale(&mut self, scale: DisplayScale) {
        self.display_scale = scale;
    }

    pub fn snapshot_trigger(&self) -> SnapshotTrigger {
        self.snapshot_trigger.clone()
    }

    pub fn detection(&self) -> &Arc<DetectionState> {
        &self.detection
    }

    /// Frames analyzed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Analyze one frame
    ///
    /// `timestamp` is the capture time of the frame relative to the start of
    /// the stream and is only used for logging. Returns whether a barcode was
    /// found.
    pub fn analyze(&mut self, frame: &FrameView<'_>, timestamp: Duration) -> bool {
        self.frames += 1;

        if self.snapshot_trigger.take() {
            self.save_snapshot(frame);
        }

        let elapsed = self.stopwatch.restart();

        self.observer.decode_start();
        let result = match self.decoder.decode_frame(frame) {
            Ok(result) => result,
            Err(e) => {
                warn!(frame = self.frames, error = %e, "Frame rejected by decoder");
                None
            }
        };
        let found = result.is_some();
        self.observer.decode_stop(found);

        self.detection.record_result(found, self.clock.now());

        trace!(
            frame = self.frames,
            timestamp_ms = timestamp.as_millis(),
            elapsed_ms = elapsed.as_millis(),
            found,
            "Frame analyzed"
        );

        self.present(result, elapsed);
        found
    }

    fn save_snapshot(&mut self, frame: &FrameView<'_>) {
        let Some(sink) = self.snapshot_sink.as_mut() else {
            debug!("Snapshot requested but no sink configured");
            return;
        };
        match sink.save(frame) {
            Ok(path) => info!(path = %path.display(), "Snapshot captured"),
            Err(e) => warn!(error = %e, "Snapshot failed, continuing with decode"),
        }
    }

    fn present(&self, result: Option<DecodeResult>, elapsed: Duration) {
        match result {
            Some(result) => {
                let outline = result
                    .points
                    .iter()
                    .map(|&point| self.display_scale.apply(point))
                    .collect();
                self.presenter
                    .show_result(result_line(elapsed, &result.text), outline);
            }
            None => self.presenter.show_no_result(no_result_line(elapsed)),
        }
    }
}
