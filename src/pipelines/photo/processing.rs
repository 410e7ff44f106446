// SPDX-License-Identifier: GPL-3.0-only

//! Frame rendering for snapshots
//!
//! Converts a captured frame of any supported pixel format into an RGB image
//! ready for encoding. Stride padding is dropped.

use crate::backends::camera::types::{FrameView, PixelFormat};
use crate::errors::SnapshotError;
use image::{Rgb, RgbImage};
use tracing::debug;

/// BT.601 limited range YUV to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = (y as i32 - 16).max(0);
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let r = (298 * c + 409 * e + 128) >> 8;
    let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
    let b = (298 * c + 516 * d + 128) >> 8;
    [
        r.clamp(0, 255) as u8,
        g.clamp(0, 255) as u8,
        b.clamp(0, 255) as u8,
    ]
}

/// Render a frame as an RGB image
///
/// YUV frames are rendered in color when their chroma planes fit the
/// buffer, and from luma only when they are cut short.
pub fn render_rgb(frame: &FrameView<'_>) -> Result<RgbImage, SnapshotError> {
    let (w, h, s) = (
        frame.width as usize,
        frame.height as usize,
        frame.stride as usize,
    );
    if w == 0 || h == 0 {
        return Err(SnapshotError::EncodingFailed("frame has no pixels".into()));
    }
    if s < frame.format.min_stride(frame.width) as usize || frame.data.len() < s * h {
        return Err(SnapshotError::EncodingFailed(format!(
            "{}x{} {} frame does not fit its {} byte buffer",
            w,
            h,
            frame.format,
            frame.data.len()
        )));
    }

    let data = frame.data;
    let chroma_rows = h.div_ceil(2);
    let chroma_width = w.div_ceil(2);
    let cs = frame.chroma_stride();
    let uv_base = s * h;
    // Last chroma row only needs to reach its last sample, not a full stride
    let chroma_plane = (chroma_rows - 1) * cs;

    let image = match frame.format {
        PixelFormat::Bgra => RgbImage::from_fn(frame.width, frame.height, |x, y| {
            let i = y as usize * s + x as usize * 4;
            Rgb([data[i + 2], data[i + 1], data[i]])
        }),
        PixelFormat::Rgba => RgbImage::from_fn(frame.width, frame.height, |x, y| {
            let i = y as usize * s + x as usize * 4;
            Rgb([data[i], data[i + 1], data[i + 2]])
        }),
        PixelFormat::Nv12 | PixelFormat::Nv21
            if data.len() >= uv_base + chroma_plane + 2 * chroma_width =>
        {
            let swap = frame.format == PixelFormat::Nv21;
            RgbImage::from_fn(frame.width, frame.height, |x, y| {
                let (x, y) = (x as usize, y as usize);
                let luma = data[y * s + x];
                let i = uv_base + (y / 2) * cs + (x / 2) * 2;
                let (u, v) = if swap {
                    (data[i + 1], data[i])
                } else {
                    (data[i], data[i + 1])
                };
                Rgb(yuv_to_rgb(luma, u, v))
            })
        }
        PixelFormat::I420
            if data.len() >= uv_base + chroma_rows * cs + chroma_plane + chroma_width =>
        {
            let v_base = uv_base + chroma_rows * cs;
            RgbImage::from_fn(frame.width, frame.height, |x, y| {
                let (x, y) = (x as usize, y as usize);
                let luma = data[y * s + x];
                let i = (y / 2) * cs + x / 2;
                Rgb(yuv_to_rgb(luma, data[uv_base + i], data[v_base + i]))
            })
        }
        PixelFormat::Yuyv => RgbImage::from_fn(frame.width, frame.height, |x, y| {
            let (x, y) = (x as usize, y as usize);
            let pair = y * s + (x / 2) * 4;
            let luma = data[y * s + x * 2];
            if pair + 3 < data.len() {
                Rgb(yuv_to_rgb(luma, data[pair + 1], data[pair + 3]))
            } else {
                Rgb([luma; 3])
            }
        }),
        _ => RgbImage::from_fn(frame.width, frame.height, |x, y| {
            Rgb([data[y as usize * s + x as usize]; 3])
        }),
    };

    debug!(width = w, height = h, format = %frame.format, "Rendered frame for snapshot");
    Ok(image)
}
