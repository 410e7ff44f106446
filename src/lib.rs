// SPDX-License-Identifier: GPL-3.0-only

//! QR Scanner - live QR code detection for camera streams
//!
//! This library decodes QR codes from camera preview frames and keeps the
//! lens focused while it does, pausing focus sweeps whenever a code was just
//! seen.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Frame analysis pipeline, detection state, autofocus control
//! - [`backends`]: Frame model, focus actuators, frame sources
//! - [`pipelines`]: Snapshot encoding and saving
//! - [`config`]: User configuration handling
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```ignore
//! let (presenter, mut updates) = ChannelPresenter::new();
//! let mut session = ScannerSession::start(&Config::default(), Some(actuator), Arc::new(presenter));
//! session.attach_source(FileFrameSource::new(path, PixelFormat::Nv12), DisplayScale::IDENTITY)?;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;

// Re-export commonly used types
pub use app::{
    AutoFocusController, AutoFocusState, DecodeResult, DetectionState, FrameAnalysisPipeline,
    FrameDecoder, ScannerSession,
};
pub use backends::camera::types::{CameraFrame, FrameView, PixelFormat};
pub use config::Config;
pub use errors::{AppError, AppResult, DecodeError, FocusError, SnapshotError};
