// SPDX-License-Identifier: GPL-3.0-only

//! Shared helpers for integration tests
#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use qrcode::{Color, QrCode};

/// Quiet zone around generated symbols, in modules
pub const QUIET_ZONE: u32 = 4;

/// Render `text` as a black-on-white QR code, `scale` pixels per module
pub fn qr_image(text: &str, scale: u32) -> RgbaImage {
    let code = QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let size = (modules + 2 * QUIET_ZONE) * scale;

    RgbaImage::from_fn(size, size, |x, y| {
        let mx = (x / scale) as i64 - QUIET_ZONE as i64;
        let my = (y / scale) as i64 - QUIET_ZONE as i64;
        let dark = mx >= 0
            && my >= 0
            && (mx as u32) < modules
            && (my as u32) < modules
            && colors[my as usize * modules as usize + mx as usize] == Color::Dark;
        if dark {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

/// Place `symbol` on a white canvas at (`left`, `top`)
pub fn on_canvas(symbol: &RgbaImage, width: u32, height: u32, left: u32, top: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut canvas, symbol, left as i64, top as i64);
    canvas
}

/// Plain white image of the given size
pub fn blank_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
}
