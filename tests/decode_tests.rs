// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for frame decoding across pixel formats

mod common;

use common::{blank_image, on_canvas, qr_image};
use qr_scanner::app::{DecodeOptions, FrameDecoder};
use qr_scanner::backends::virtual_camera::frame_from_rgba;
use qr_scanner::{DecodeError, PixelFormat};

fn decode_text(decoder: &FrameDecoder, image: &image::RgbaImage, format: PixelFormat, padding: u32) -> Option<String> {
    let frame = frame_from_rgba(image, format, padding).unwrap();
    decoder
        .decode(&frame.data, frame.width, frame.height, frame.stride, frame.format)
        .unwrap()
        .map(|result| result.text)
}

#[test]
fn test_bgra_and_nv12_decode_same_payload() {
    let decoder = FrameDecoder::default();
    let image = qr_image("https://example.com/qr?id=42", 4);

    let bgra = decode_text(&decoder, &image, PixelFormat::Bgra, 0);
    let nv12 = decode_text(&decoder, &image, PixelFormat::Nv12, 0);

    assert_eq!(bgra.as_deref(), Some("https://example.com/qr?id=42"));
    assert_eq!(bgra, nv12);
}

#[test]
fn test_padded_rows_decode() {
    let decoder = FrameDecoder::default();
    let image = qr_image("PADDED", 4);

    // Padding that is not a multiple of the pixel size
    for format in [PixelFormat::Bgra, PixelFormat::Nv12, PixelFormat::Gray8, PixelFormat::I420] {
        assert_eq!(
            decode_text(&decoder, &image, format, 60).as_deref(),
            Some("PADDED"),
            "failed for {}",
            format
        );
    }
}

#[test]
fn test_every_producible_format_decodes() {
    let decoder = FrameDecoder::default();
    let image = qr_image("HELLO", 5);

    for format in [
        PixelFormat::Bgra,
        PixelFormat::Rgba,
        PixelFormat::Gray8,
        PixelFormat::Nv12,
        PixelFormat::Nv21,
        PixelFormat::I420,
    ] {
        assert_eq!(
            decode_text(&decoder, &image, format, 0).as_deref(),
            Some("HELLO"),
            "failed for {}",
            format
        );
    }
}

#[test]
fn test_no_barcode_is_none() {
    let decoder = FrameDecoder::default();
    assert_eq!(decode_text(&decoder, &blank_image(320, 240), PixelFormat::Nv12, 0), None);
}

#[test]
fn test_large_frame_is_downscaled_and_points_mapped_back() {
    let decoder = FrameDecoder::default();
    let symbol = qr_image("DOWNSCALED", 16);
    let (left, top) = (700, 300);
    let image = on_canvas(&symbol, 1600, 1200, left, top);

    let frame = frame_from_rgba(&image, PixelFormat::Gray8, 0).unwrap();
    let result = decoder.decode_frame(&frame.view()).unwrap().unwrap();

    assert_eq!(result.text, "DOWNSCALED");
    assert_eq!(result.points.len(), 4);

    // Corners lie on the symbol in full-resolution coordinates
    let margin = 32.0;
    let (min, max_x, max_y) = (
        (left as f64 - margin, top as f64 - margin),
        (left + symbol.width()) as f64 + margin,
        (top + symbol.height()) as f64 + margin,
    );
    for (x, y) in &result.points {
        assert!(*x >= min.0 && *x <= max_x, "x {} outside symbol", x);
        assert!(*y >= min.1 && *y <= max_y, "y {} outside symbol", y);
    }
}

#[test]
fn test_small_symbol_found_with_try_harder() {
    let symbol = qr_image("TINY", 3);
    let image = on_canvas(&symbol, 1920, 1080, 100, 100);

    let thorough = FrameDecoder::default();
    assert_eq!(
        decode_text(&thorough, &image, PixelFormat::Gray8, 0).as_deref(),
        Some("TINY")
    );
}

#[test]
fn test_undersized_buffer_is_reported() {
    let decoder = FrameDecoder::new(DecodeOptions::default());
    let frame = frame_from_rgba(&qr_image("X", 2), PixelFormat::Bgra, 16).unwrap();

    // Drop the last row
    let short = &frame.data[..frame.data.len() - frame.stride as usize];
    let err = decoder
        .decode(short, frame.width, frame.height, frame.stride, frame.format)
        .unwrap_err();

    assert!(matches!(err, DecodeError::BufferTooSmall { .. }));
}
