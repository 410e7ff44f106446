// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera frames
//!
//! Capture backends hand frames to the analysis pipeline as a borrowed
//! [`FrameView`]. Stride is always carried separately from width: hardware
//! buffers are frequently padded past the last pixel of each row.

use std::sync::Arc;
use std::time::Instant;

/// Pixel format of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// BGRA - 32-bit, B G R A byte order (BGR32 with padding byte)
    Bgra,
    /// RGBA - 32-bit, R G B A byte order
    Rgba,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    Nv12,
    /// NV21 - Semi-planar 4:2:0 (Y plane + interleaved VU plane)
    Nv21,
    /// I420 - Planar 4:2:0 (separate Y, U, V planes)
    I420,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    Yuyv,
}

impl PixelFormat {
    /// Check if this format carries a full resolution Y plane first
    pub fn is_planar_yuv(&self) -> bool {
        matches!(self, Self::Nv12 | Self::Nv21 | Self::I420)
    }

    /// Bytes per pixel in the first (or only) plane
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::Bgra | Self::Rgba => 4,
            Self::Yuyv => 2,
            Self::Gray8 | Self::Nv12 | Self::Nv21 | Self::I420 => 1,
        }
    }

    /// Smallest legal stride for a row of `width` pixels
    pub fn min_stride(&self, width: u32) -> u32 {
        width.saturating_mul(self.bytes_per_pixel())
    }

    /// Row stride of the chroma plane(s) following the first plane
    ///
    /// Interleaved UV rows of an odd-width frame are one byte longer than
    /// the luma row, so they never share a stride narrower than that.
    /// Planar U and V rows use half the luma stride, rounded up. Zero for
    /// formats without a separate chroma plane.
    pub fn chroma_stride(&self, width: u32, stride: u32) -> u32 {
        let chroma_width = width.div_ceil(2);
        match self {
            Self::Nv12 | Self::Nv21 => stride.max(chroma_width.saturating_mul(2)),
            Self::I420 => stride.div_ceil(2).max(chroma_width),
            _ => 0,
        }
    }

    /// Parse a format name as used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bgra" | "bgr32" | "bgrx" => Some(Self::Bgra),
            "rgba" | "rgbx" => Some(Self::Rgba),
            "gray8" | "grey" | "y8" => Some(Self::Gray8),
            "nv12" => Some(Self::Nv12),
            "nv21" => Some(Self::Nv21),
            "i420" | "iyuv" => Some(Self::I420),
            "yuyv" | "yuy2" => Some(Self::Yuyv),
            _ => None,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bgra => "BGRA",
            Self::Rgba => "RGBA",
            Self::Gray8 => "GRAY8",
            Self::Nv12 => "NV12",
            Self::Nv21 => "NV21",
            Self::I420 => "I420",
            Self::Yuyv => "YUYV",
        };
        write!(f, "{}", name)
    }
}

/// Borrowed view of one frame's pixel buffer
///
/// `data` starts with the first (luma or packed) plane; chroma planes, if
/// any, follow it and are never read by the decoder.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Bytes per row of the first plane, including padding
    pub stride: u32,
    pub format: PixelFormat,
}

impl<'a> FrameView<'a> {
    pub fn new(data: &'a [u8], width: u32, height: u32, stride: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            stride,
            format,
        }
    }

    /// Bytes the first plane occupies (`height * stride`)
    pub fn plane_len(&self) -> usize {
        self.height as usize * self.stride as usize
    }

    /// See [`PixelFormat::chroma_stride`]
    pub fn chroma_stride(&self) -> usize {
        self.format.chroma_stride(self.width, self.stride) as usize
    }
}

/// A single owned frame from a capture source
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Frame data: packed pixels, or the Y plane followed by chroma planes
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride for the main data (bytes per row, may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Borrow the frame as a view for analysis
    pub fn view(&self) -> FrameView<'_> {
        FrameView::new(
            &self.data,
            self.width,
            self.height,
            self.stride,
            self.format,
        )
    }
}
