// SPDX-License-Identifier: GPL-3.0-only

//! Still snapshots of analyzed frames
//!
//! ```text
//! SnapshotTrigger (any thread) → FrameAnalysisPipeline → render → JPEG → disk
//! ```
//!
//! A snapshot is requested by setting a one-shot flag from any thread. The
//! analysis pipeline consumes the flag on the next frame and hands that frame
//! to a [`SnapshotSink`] before decoding it.

pub mod encoding;
pub mod processing;

pub use encoding::{encode_jpeg, save_unique, snapshot_file_name};
pub use processing::render_rgb;

use crate::backends::camera::types::FrameView;
use crate::config::SnapshotSettings;
use crate::constants::SnapshotQuality;
use crate::errors::SnapshotError;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// One-shot "capture the next frame" request flag
#[derive(Debug, Clone, Default)]
pub struct SnapshotTrigger {
    pending: Arc<AtomicBool>,
}

impl SnapshotTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for the next analyzed frame to be saved
    pub fn request(&self) {
        debug!("Snapshot requested");
        self.pending.store(true, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Consume the request, returning whether one was pending
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}

/// Destination for snapshot frames
pub trait SnapshotSink: Send {
    /// Render and persist one frame, returning where it went
    fn save(&mut self, frame: &FrameView<'_>) -> Result<PathBuf, SnapshotError>;
}

/// Saves snapshots as timestamped JPEG files
#[derive(Debug, Clone)]
pub struct JpegSnapshotWriter {
    output_dir: PathBuf,
    file_stem: String,
    quality: SnapshotQuality,
}

impl JpegSnapshotWriter {
    pub fn new(output_dir: PathBuf, file_stem: &str, quality: SnapshotQuality) -> Self {
        Self {
            output_dir,
            file_stem: file_stem.to_string(),
            quality,
        }
    }

    pub fn from_settings(settings: &SnapshotSettings) -> Self {
        Self::new(settings.output_dir(), &settings.file_stem, settings.quality)
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }
}

impl SnapshotSink for JpegSnapshotWriter {
    fn save(&mut self, frame: &FrameView<'_>) -> Result<PathBuf, SnapshotError> {
        let image = render_rgb(frame)?;
        let data = encode_jpeg(&image, self.quality)?;
        save_unique(&self.output_dir, &self.file_stem, &data)
    }
}
