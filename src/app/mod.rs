// SPDX-License-Identifier: GPL-3.0-only

//! Barcode scanning core
//!
//! # Architecture
//!
//! - `frame_processor`: QR decoding of individual frames
//! - `detection`: shared "barcode seen recently" state
//! - `autofocus`: focus negotiation and the simulated continuous focus loop
//! - `pipeline`: per-frame entry point tying decoding to presentation
//! - `presentation`: presenter and decode observer collaborators
//! - `session`: one capture session's pipeline plus autofocus
//! - `timing`: clock abstraction and stopwatch
//!
//! # Main Types
//!
//! - `FrameAnalysisPipeline`: called once per captured frame
//! - `AutoFocusController`: keeps the lens focused between detections
//! - `ScannerSession`: owns both for the lifetime of a stream

pub mod autofocus;
pub mod detection;
pub mod frame_processor;
pub mod pipeline;
pub mod presentation;
pub mod session;
pub mod timing;

pub use autofocus::{AutoFocusController, AutoFocusState, FocusPlan};
pub use detection::{DetectionSnapshot, DetectionState};
pub use frame_processor::{BarcodeFormat, DecodeOptions, DecodeResult, DisplayScale, FrameDecoder};
pub use pipeline::FrameAnalysisPipeline;
pub use presentation::{
    ChannelPresenter, DecodeObserver, LogPresenter, PresentationUpdate, Presenter,
    TracingDecodeObserver,
};
pub use session::ScannerSession;
pub use timing::{Clock, ManualClock, Stopwatch, SystemClock};
