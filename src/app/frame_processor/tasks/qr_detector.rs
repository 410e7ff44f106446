// SPDX-License-Identifier: GPL-3.0-only

//! QR code decoding task
//!
//! This module implements frame decoding using the rqrr crate. Frames are
//! reduced to their luma plane (honoring stride), optionally downscaled for
//! speed, and searched for QR symbols. Detected corner points are returned in
//! the original frame's pixel coordinates.

use crate::app::frame_processor::types::{BarcodeFormat, DecodeResult};
use crate::backends::camera::types::{FrameView, PixelFormat};
use crate::config::DecoderSettings;
use crate::constants::decoder::{DEFAULT_MAX_DIMENSION, LUMA_WEIGHTS};
use crate::errors::DecodeError;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace};

/// Fixed options applied to every decode call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Symbologies to look for
    pub possible_formats: Vec<BarcodeFormat>,
    /// Retry at full resolution when the downscaled pass finds nothing
    pub try_harder: bool,
    /// Longest edge analyzed without downscaling (0 = never downscale)
    pub max_dimension: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            possible_formats: vec![BarcodeFormat::QrCode],
            try_harder: true,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl From<&DecoderSettings> for DecodeOptions {
    fn from(settings: &DecoderSettings) -> Self {
        Self {
            possible_formats: vec![BarcodeFormat::QrCode],
            try_harder: settings.try_harder,
            max_dimension: settings.max_dimension,
        }
    }
}

/// Barcode decoder for camera frames
///
/// Holds only immutable configuration, so one decoder can serve several
/// threads as long as each call uses its own buffer.
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    options: DecodeOptions,
}

impl FrameDecoder {
    /// Create a decoder with the given options
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode a barcode from a frame buffer
    ///
    /// `stride` is the byte length of one row of the first plane and may
    /// exceed `width * bytes_per_pixel`. Returns `Ok(None)` when the frame
    /// holds no readable symbol; `Err` only when the buffer does not match
    /// the declared geometry.
    pub fn decode(
        &self,
        buffer: &[u8],
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
    ) -> Result<Option<DecodeResult>, DecodeError> {
        self.decode_frame(&FrameView::new(buffer, width, height, stride, format))
    }

    /// Decode a barcode from a frame view
    pub fn decode_frame(&self, frame: &FrameView<'_>) -> Result<Option<DecodeResult>, DecodeError> {
        validate(frame)?;

        if !self.options.possible_formats.contains(&BarcodeFormat::QrCode) {
            return Ok(None);
        }

        let start = std::time::Instant::now();
        let width = frame.width as usize;
        let height = frame.height as usize;
        let luma = extract_luma(frame);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.decode_luma(&luma, width, height)
        }))
        .map_err(|payload| DecodeError::DecoderPanicked(panic_message(payload.as_ref())))?;

        trace!(
            width,
            height,
            format = %frame.format,
            found = outcome.is_some(),
            decode_ms = start.elapsed().as_millis(),
            "Frame decode complete"
        );

        Ok(outcome.map(|(text, points)| DecodeResult {
            text,
            points,
            format: BarcodeFormat::QrCode,
        }))
    }

    fn decode_luma(&self, luma: &[u8], width: usize, height: usize) -> Option<(String, Vec<(f64, f64)>)> {
        let max_dimension = self.options.max_dimension as usize;

        if max_dimension > 0 && (width > max_dimension || height > max_dimension) {
            let scale = (width as f64 / max_dimension as f64).max(height as f64 / max_dimension as f64);
            let dst_width = ((width as f64 / scale) as usize).max(1);
            let dst_height = ((height as f64 / scale) as usize).max(1);
            let downscaled = downscale_luma(luma, width, height, dst_width, dst_height);

            trace!(dst_width, dst_height, scale, "Downscaled frame for detection");

            if let Some((text, points)) = detect_qr(&downscaled, dst_width, dst_height) {
                let sx = width as f64 / dst_width as f64;
                let sy = height as f64 / dst_height as f64;
                let points = points.into_iter().map(|(x, y)| (x * sx, y * sy)).collect();
                return Some((text, points));
            }

            if !self.options.try_harder {
                return None;
            }
            debug!("Nothing found on downscaled frame, retrying at full resolution");
        }

        detect_qr(luma, width, height)
    }
}

/// Check the frame geometry against its buffer
fn validate(frame: &FrameView<'_>) -> Result<(), DecodeError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: frame.width,
            height: frame.height,
        });
    }

    let min_stride = frame.format.min_stride(frame.width);
    if frame.stride < min_stride {
        return Err(DecodeError::InvalidStride {
            stride: frame.stride,
            min_stride,
        });
    }

    let required = frame.plane_len();
    if frame.data.len() < required {
        return Err(DecodeError::BufferTooSmall {
            required,
            actual: frame.data.len(),
        });
    }

    Ok(())
}

/// Copy the luma of a frame into a tightly packed `width * height` buffer
fn extract_luma(frame: &FrameView<'_>) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let (wr, wg, wb) = LUMA_WEIGHTS;

    let mut luma = Vec::with_capacity(width * height);

    for y in 0..height {
        let row = &frame.data[y * stride..y * stride + stride];
        match frame.format {
            PixelFormat::Gray8 | PixelFormat::Nv12 | PixelFormat::Nv21 | PixelFormat::I420 => {
                luma.extend_from_slice(&row[..width]);
            }
            PixelFormat::Bgra => {
                luma.extend(row[..width * 4].chunks_exact(4).map(|px| {
                    ((px[2] as u32 * wr + px[1] as u32 * wg + px[0] as u32 * wb) >> 8) as u8
                }));
            }
            PixelFormat::Rgba => {
                luma.extend(row[..width * 4].chunks_exact(4).map(|px| {
                    ((px[0] as u32 * wr + px[1] as u32 * wg + px[2] as u32 * wb) >> 8) as u8
                }));
            }
            PixelFormat::Yuyv => {
                luma.extend(row[..width * 2].iter().step_by(2).copied());
            }
        }
    }

    luma
}

/// Downscale a luma buffer using bilinear interpolation
fn downscale_luma(
    src: &[u8],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Vec<u8> {
    let mut result = Vec::with_capacity(dst_width * dst_height);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = (src_x as usize).min(src_width - 1);
            let y0 = (src_y as usize).min(src_height - 1);
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let p = |px: usize, py: usize| src[py * src_width + px] as f32;

            let value = p(x0, y0) * (1.0 - x_frac) * (1.0 - y_frac)
                + p(x1, y0) * x_frac * (1.0 - y_frac)
                + p(x0, y1) * (1.0 - x_frac) * y_frac
                + p(x1, y1) * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}

/// Search a packed luma buffer for the first decodable QR symbol
fn detect_qr(luma: &[u8], width: usize, height: usize) -> Option<(String, Vec<(f64, f64)>)> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        luma[y * width + x]
    });
    let grids = prepared.detect_grids();

    trace!(count = grids.len(), "QR grids located");

    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) => {
                let points = grid
                    .bounds
                    .iter()
                    .map(|p| (p.x as f64, p.y as f64))
                    .collect();
                debug!(content = %content, "Decoded QR code");
                return Some((content, points));
            }
            Err(e) => {
                debug!(error = ?e, "Failed to decode QR grid");
            }
        }
    }

    None
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
