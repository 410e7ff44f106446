// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module for barcode analysis
//!
//! Turns raw camera frames into decode results. Currently implements QR
//! code detection.

pub mod tasks;
pub mod types;

pub use tasks::qr_detector;
pub use tasks::{DecodeOptions, FrameDecoder};
pub use types::{BarcodeFormat, DecodeResult, DisplayScale};
