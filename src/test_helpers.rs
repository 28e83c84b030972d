//! Shared test utilities for the akira test suite.
//!
//! Provides in-memory image fixtures and data-URI decoding so tests can check
//! real pixel dimensions of encoded output without touching the filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let raw = encode_png(10, 10);
//! // ... run a transform ...
//! let (mime, image) = decode_data_uri(&item.payload);
//! assert_eq!(mime, "image/jpeg");
//! assert_eq!(image.dimensions(), (5, 5));
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Fixtures
// =========================================================================

/// Encode a gradient RGB image of the given size as PNG bytes.
pub fn encode_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    encode(DynamicImage::ImageRgb8(img))
}

/// Encode a half-transparent RGBA image of the given size as PNG bytes.
pub fn encode_rgba_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 127])
    });
    encode(DynamicImage::ImageRgba8(img))
}

fn encode(img: DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

// =========================================================================
// Output inspection: panics with a clear message on malformed payloads
// =========================================================================

/// Split a `data:<mime>;base64,<data>` payload and decode the image inside.
pub fn decode_data_uri(payload: &str) -> (String, DynamicImage) {
    let rest = payload
        .strip_prefix("data:")
        .unwrap_or_else(|| panic!("payload is not a data URI: {payload:.40}"));
    let (mime, data) = rest
        .split_once(";base64,")
        .unwrap_or_else(|| panic!("data URI has no base64 marker: {payload:.40}"));
    let bytes = STANDARD.decode(data).unwrap();
    let image = image::load_from_memory(&bytes).unwrap();
    (mime.to_string(), image)
}
