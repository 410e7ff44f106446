// SPDX-License-Identifier: GPL-3.0-only

//! One barcode scanning session
//!
//! Binds the analysis pipeline and autofocus to a single capture stream.
//! Autofocus problems are shown to the user but never stop the session:
//! decoding carries on with whatever focus the lens has.

use crate::app::autofocus::{AutoFocusController, AutoFocusState};
use crate::app::detection::DetectionState;
use crate::app::frame_processor::{DecodeOptions, DisplayScale, FrameDecoder};
use crate::app::pipeline::FrameAnalysisPipeline;
use crate::app::presentation::Presenter;
use crate::app::timing::{Clock, SystemClock};
use crate::backends::camera::focus::FocusActuator;
use crate::backends::camera::frame_loop::FrameLoopController;
use crate::backends::virtual_camera::FileFrameSource;
use crate::config::Config;
use crate::constants::presentation::FOCUS_START_FAILED_PREFIX;
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::{JpegSnapshotWriter, SnapshotTrigger};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ScannerSession {
    detection: Arc<DetectionState>,
    autofocus: Arc<AutoFocusController>,
    trigger: SnapshotTrigger,
    pipeline: Option<FrameAnalysisPipeline>,
    frame_loop: Option<FrameLoopController>,
    stopped: bool,
}

impl ScannerSession {
    /// Start a session on the system clock
    pub fn start(
        config: &Config,
        actuator: Option<Box<dyn FocusActuator>>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self::start_with_clock(config, actuator, presenter, Arc::new(SystemClock))
    }

    /// Start a session
    ///
    /// Blocks while autofocus negotiates and, for single-shot lenses, runs
    /// its first sweep. Without an actuator autofocus stays uninitialized.
    pub fn start_with_clock(
        config: &Config,
        actuator: Option<Box<dyn FocusActuator>>,
        presenter: Arc<dyn Presenter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let detection = Arc::new(DetectionState::new());
        let trigger = SnapshotTrigger::new();

        let decoder = FrameDecoder::new(DecodeOptions::from(&config.decoder));
        let pipeline =
            FrameAnalysisPipeline::new(decoder, Arc::clone(&detection), Arc::clone(&presenter))
                .with_clock(Arc::clone(&clock))
                .with_snapshot_trigger(trigger.clone())
                .with_snapshot_sink(Box::new(JpegSnapshotWriter::from_settings(
                    &config.snapshot,
                )));

        let autofocus = Arc::new(AutoFocusController::with_clock(
            Arc::clone(&detection),
            config.focus.clone(),
            clock,
        ));

        if let Some(actuator) = actuator {
            match autofocus.start(actuator) {
                Ok(state) => info!(autofocus = %state, "Scanner session autofocus ready"),
                Err(e) => {
                    warn!(error = %e, "Autofocus unavailable, scanning without it");
                    presenter.show_no_result(format!("{}: {}", FOCUS_START_FAILED_PREFIX, e));
                }
            }
        }

        Self {
            detection,
            autofocus,
            trigger,
            pipeline: Some(pipeline),
            frame_loop: None,
            stopped: false,
        }
    }

    pub fn detection(&self) -> &Arc<DetectionState> {
        &self.detection
    }

    pub fn autofocus(&self) -> &Arc<AutoFocusController> {
        &self.autofocus
    }

    pub fn autofocus_state(&self) -> AutoFocusState {
        self.autofocus.state()
    }

    /// Flag to request a snapshot of the next analyzed frame
    pub fn snapshot_trigger(&self) -> SnapshotTrigger {
        self.trigger.clone()
    }

    /// The pipeline, while it has not been handed to a frame source
    pub fn pipeline_mut(&mut self) -> Option<&mut FrameAnalysisPipeline> {
        self.pipeline.as_mut()
    }

    /// Take the pipeline to drive it from an external capture callback
    pub fn take_pipeline(&mut self) -> Option<FrameAnalysisPipeline> {
        self.pipeline.take()
    }

    /// Stream frames from `source` into the pipeline on its own thread
    pub fn attach_source(&mut self, source: FileFrameSource, scale: DisplayScale) -> AppResult<()> {
        if self.stopped {
            return Err(AppError::Other("Scanner session already stopped".into()));
        }
        let mut pipeline = self
            .pipeline
            .take()
            .ok_or_else(|| AppError::Other("Pipeline already attached".into()))?;
        pipeline.set_display_scale(scale);

        self.frame_loop = Some(source.start(move |frame, timestamp| {
            pipeline.analyze(&frame.view(), timestamp);
        }));
        Ok(())
    }

    /// Whether an attached source is still delivering frames
    pub fn is_streaming(&self) -> bool {
        self.frame_loop.as_ref().is_some_and(FrameLoopController::is_running)
    }

    /// Wait for an attached source to run out of frames
    pub fn wait(&mut self) {
        if let Some(frame_loop) = self.frame_loop.as_mut() {
            frame_loop.join();
        }
    }

    /// Stop frame delivery, then autofocus
    ///
    /// Idempotent. Once this returns no frame is analyzed and no focus
    /// command is newly issued.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        if let Some(mut frame_loop) = self.frame_loop.take() {
            frame_loop.stop();
        }
        self.autofocus.stop();
        info!("Scanner session stopped");
    }
}

impl Drop for ScannerSession {
    fn drop(&mut self) {
        self.stop();
    }
}
