// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! This module contains the analysis tasks run against individual frames.

pub mod qr_detector;

pub use qr_detector::{DecodeOptions, FrameDecoder};
