// SPDX-License-Identifier: GPL-3.0-only

//! File source streaming for the virtual camera
//!
//! Loads a still image and replays it as a stream of camera frames in the
//! pixel layout a real capture device would produce (BGRA or YUV, with
//! optional row padding), delivering them serially on a frame loop thread.

use crate::backends::camera::frame_loop::{FrameLoopController, LoopAction};
use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::constants::file_formats;
use crate::errors::{AppError, AppResult};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// BT.601 limited range RGB to YUV
fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    (
        y.clamp(0, 255) as u8,
        u.clamp(0, 255) as u8,
        v.clamp(0, 255) as u8,
    )
}

/// Convert an RGBA image into a camera frame of the given format
///
/// `row_padding` extra bytes are appended to every row of every plane, the
/// way hardware buffers are aligned.
pub fn frame_from_rgba(
    image: &RgbaImage,
    format: PixelFormat,
    row_padding: u32,
) -> AppResult<CameraFrame> {
    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 {
        return Err(AppError::Source("Image has no pixels".into()));
    }

    let stride = format.min_stride(width) + row_padding;
    let (w, h, s) = (width as usize, height as usize, stride as usize);
    let chroma_h = h.div_ceil(2);

    let data: Vec<u8> = match format {
        PixelFormat::Bgra | PixelFormat::Rgba => {
            let mut data = vec![0u8; s * h];
            for (x, y, px) in image.enumerate_pixels() {
                let offset = y as usize * s + x as usize * 4;
                let [r, g, b, a] = px.0;
                let out = if format == PixelFormat::Bgra {
                    [b, g, r, a]
                } else {
                    [r, g, b, a]
                };
                data[offset..offset + 4].copy_from_slice(&out);
            }
            data
        }
        PixelFormat::Gray8 => {
            let mut data = vec![0u8; s * h];
            for (x, y, px) in image.enumerate_pixels() {
                let [r, g, b, _] = px.0;
                data[y as usize * s + x as usize] = rgb_to_yuv(r, g, b).0;
            }
            data
        }
        PixelFormat::Nv12 | PixelFormat::Nv21 => {
            // Y plane followed by an interleaved chroma plane
            let chroma_stride = format.chroma_stride(width, stride) as usize;
            let mut data = vec![0u8; s * h + chroma_stride * chroma_h];
            let uv_base = s * h;
            for (x, y, px) in image.enumerate_pixels() {
                let [r, g, b, _] = px.0;
                let (luma, u, v) = rgb_to_yuv(r, g, b);
                let (x, y) = (x as usize, y as usize);
                data[y * s + x] = luma;
                if x % 2 == 0 && y % 2 == 0 {
                    let offset = uv_base + (y / 2) * chroma_stride + x;
                    let (first, second) = if format == PixelFormat::Nv12 {
                        (u, v)
                    } else {
                        (v, u)
                    };
                    data[offset] = first;
                    data[offset + 1] = second;
                }
            }
            data
        }
        PixelFormat::I420 => {
            let chroma_stride = format.chroma_stride(width, stride) as usize;
            let plane = chroma_stride * chroma_h;
            let mut data = vec![0u8; s * h + 2 * plane];
            let u_base = s * h;
            let v_base = u_base + plane;
            for (x, y, px) in image.enumerate_pixels() {
                let [r, g, b, _] = px.0;
                let (luma, u, v) = rgb_to_yuv(r, g, b);
                let (x, y) = (x as usize, y as usize);
                data[y * s + x] = luma;
                if x % 2 == 0 && y % 2 == 0 {
                    let offset = (y / 2) * chroma_stride + x / 2;
                    data[u_base + offset] = u;
                    data[v_base + offset] = v;
                }
            }
            data
        }
        PixelFormat::Yuyv => {
            return Err(AppError::Source(format!(
                "File source cannot produce {} frames",
                format
            )));
        }
    };

    Ok(CameraFrame {
        width,
        height,
        data: Arc::from(data.into_boxed_slice()),
        format,
        stride,
        captured_at: Instant::now(),
    })
}

/// Load an image file as a camera frame
pub fn load_image_as_frame(
    path: &Path,
    format: PixelFormat,
    row_padding: u32,
) -> AppResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(AppError::Source(format!(
            "Unsupported file format: {}",
            extension
        )));
    }

    info!(path = %path.display(), %format, "Loading image file");

    let img = image::open(path).map_err(|e| {
        AppError::Source(format!("Failed to load image '{}': {}", path.display(), e))
    })?;
    let rgba = img.to_rgba8();

    let frame = frame_from_rgba(&rgba, format, row_padding)?;
    info!(
        width = frame.width,
        height = frame.height,
        stride = frame.stride,
        "Image loaded successfully"
    );
    Ok(frame)
}

/// Replays an image file as a live frame stream
pub struct FileFrameSource {
    path: PathBuf,
    format: PixelFormat,
    row_padding: u32,
    interval: Duration,
    frame_limit: Option<usize>,
}

impl FileFrameSource {
    pub fn new(path: &Path, format: PixelFormat) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            row_padding: 0,
            interval: crate::constants::virtual_camera::IMAGE_STREAM_FRAME_DURATION,
            frame_limit: None,
        }
    }

    /// Pad every row by this many bytes
    pub fn with_row_padding(mut self, row_padding: u32) -> Self {
        self.row_padding = row_padding;
        self
    }

    /// Deliver one frame per `interval`
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop after this many frames
    pub fn with_frame_limit(mut self, frames: usize) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Start streaming frames to `on_frame`
    ///
    /// `on_frame` receives each frame and the time elapsed since streaming
    /// started. Calls are serial and never overlap. The stream ends when the
    /// frame limit is reached or the returned controller is stopped.
    pub fn start<F>(self, mut on_frame: F) -> FrameLoopController
    where
        F: FnMut(&CameraFrame, Duration) + Send + 'static,
    {
        let Self {
            path,
            format,
            row_padding,
            interval,
            frame_limit,
        } = self;

        FrameLoopController::start_with_init(
            "file-frame-source",
            interval,
            move || {
                let frame = load_image_as_frame(&path, format, row_padding)
                    .map_err(|e| e.to_string())?;
                Ok((frame, Instant::now(), 0usize))
            },
            move |state: &mut (CameraFrame, Instant, usize)| {
                let (frame, started, delivered) = state;
                if frame_limit.is_some_and(|limit| *delivered >= limit) {
                    debug!(delivered = *delivered, "Frame limit reached");
                    return LoopAction::Stop;
                }
                frame.captured_at = Instant::now();
                on_frame(frame, started.elapsed());
                *delivered += 1;
                LoopAction::Continue
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_bgra_swaps_channels_and_pads_rows() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let frame = frame_from_rgba(&img, PixelFormat::Bgra, 3).unwrap();

        assert_eq!(frame.stride, 11);
        assert_eq!(frame.data.len(), 22);
        assert_eq!(&frame.data[0..4], &[30, 20, 10, 255]);
        assert_eq!(&frame.data[11..15], &[30, 20, 10, 255]);
    }

    #[test]
    fn test_nv12_luma_plane() {
        let frame = frame_from_rgba(&checker(4, 4), PixelFormat::Nv12, 4).unwrap();

        assert_eq!(frame.stride, 8);
        // Y plane plus half-height chroma plane
        assert_eq!(frame.data.len(), 8 * 4 + 8 * 2);
        assert_eq!(frame.data[0], 235);
        assert_eq!(frame.data[1], 16);
        assert_eq!(frame.data[8], 16);
    }

    #[test]
    fn test_odd_width_nv12_widens_chroma_rows() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([200, 40, 40, 255]));
        let frame = frame_from_rgba(&img, PixelFormat::Nv12, 0).unwrap();

        assert_eq!(frame.stride, 3);
        // 3x3 luma, then two chroma rows of 4 bytes
        assert_eq!(frame.data.len(), 9 + 4 * 2);
        let (_, u, v) = rgb_to_yuv(200, 40, 40);
        assert_eq!(&frame.data[9 + 4 + 2..9 + 4 + 4], &[u, v]);
    }

    #[test]
    fn test_odd_width_i420_planes() {
        let frame = frame_from_rgba(&checker(5, 3), PixelFormat::I420, 0).unwrap();
        assert_eq!(frame.data.len(), 15 + 2 * 3 * 2);
    }

    #[test]
    fn test_rejects_empty_image() {
        let img = RgbaImage::new(0, 0);
        assert!(frame_from_rgba(&img, PixelFormat::Gray8, 0).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_image_as_frame(Path::new("clip.mp4"), PixelFormat::Bgra, 0);
        assert!(matches!(err, Err(AppError::Source(_))));
    }
}
