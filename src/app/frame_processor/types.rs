// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results
//!
//! These types represent the output of the frame decoder and the geometry
//! needed to draw it on top of the preview.

/// Symbology of a decoded barcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarcodeFormat {
    /// QR code (ISO/IEC 18004)
    QrCode,
}

impl BarcodeFormat {
    /// Get display name for the format
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::QrCode => "QR_CODE",
        }
    }
}

impl std::fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A barcode decoded from one frame
///
/// `points` are the symbol's corner points in frame pixel coordinates, in
/// the order top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeResult {
    /// Decoded payload
    pub text: String,
    /// Corner points in frame pixel space
    pub points: Vec<(f64, f64)>,
    /// Symbology
    pub format: BarcodeFormat,
}

/// Scale from frame pixel space to display space
///
/// The overlay is laid out at its own size; a detected point `(x, y)` in the
/// analyzed frame lands at `(x * x_scale, y * y_scale)` on the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale {
    pub x_scale: f64,
    pub y_scale: f64,
}

impl DisplayScale {
    /// No scaling, overlay is laid out in frame pixels
    pub const IDENTITY: DisplayScale = DisplayScale {
        x_scale: 1.0,
        y_scale: 1.0,
    };

    /// Scale mapping a `frame_width`x`frame_height` frame onto a
    /// `display_width`x`display_height` overlay
    pub fn new(display_width: f64, display_height: f64, frame_width: u32, frame_height: u32) -> Self {
        if frame_width == 0 || frame_height == 0 {
            return Self::IDENTITY;
        }
        Self {
            x_scale: display_width / frame_width as f64,
            y_scale: display_height / frame_height as f64,
        }
    }

    /// Uniform scale that fits a frame inside a viewport, preserving aspect
    pub fn fit(viewport_width: f64, viewport_height: f64, frame_width: u32, frame_height: u32) -> Self {
        if frame_width == 0 || frame_height == 0 {
            return Self::IDENTITY;
        }
        let scale = (viewport_width / frame_width as f64).min(viewport_height / frame_height as f64);
        Self {
            x_scale: scale,
            y_scale: scale,
        }
    }

    /// Map a frame pixel point to display space
    pub fn apply(&self, point: (f64, f64)) -> (f64, f64) {
        (point.0 * self.x_scale, point.1 * self.y_scale)
    }
}

impl Default for DisplayScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}
