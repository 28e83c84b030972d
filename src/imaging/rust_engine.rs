//! Pure Rust image engine built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::load_from_memory` (format sniffed from bytes) |
//! | Natural dimensions | `GenericImageView::dimensions` |
//! | Convert → JPEG | flatten to `Rgb8` (JPEG carries no alpha) |
//! | Convert → AVIF | `Rgba8` when the source has alpha, else `Rgb8` |
//! | Downscale | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Enlarge | `DynamicImage::resize_exact` with `CatmullRom` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |

use super::engine::{Dimensions, EngineError, ImageEngine};
use super::params::{OutputFormat, Quality};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageError};

/// Encoder speed for AVIF (1 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

/// Pure Rust engine using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustEngine;

impl RustEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Map 0–100 onto the encoder range. Both encoders treat 1 as their floor.
fn encoder_quality(quality: Quality) -> u8 {
    quality.value().max(1)
}

fn check_target(target: Dimensions) -> Result<(), EngineError> {
    if target.width == 0 || target.height == 0 {
        return Err(EngineError::Processing(format!(
            "cannot resample to an empty box ({target})"
        )));
    }
    Ok(())
}

fn encode_jpeg(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, EngineError> {
    let mut buf = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, encoder_quality(quality));
    image
        .write_with_encoder(encoder)
        .map_err(|e| EngineError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

fn encode_avif(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, EngineError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
        &mut buf,
        AVIF_SPEED,
        encoder_quality(quality),
    );
    image
        .write_with_encoder(encoder)
        .map_err(|e| EngineError::Encode(format!("AVIF encode failed: {e}")))?;
    Ok(buf)
}

impl ImageEngine for RustEngine {
    type Image = DynamicImage;

    fn decode(&self, raw: &[u8]) -> Result<DynamicImage, EngineError> {
        image::load_from_memory(raw).map_err(|e| match e {
            ImageError::Unsupported(inner) => EngineError::Unsupported(inner.to_string()),
            other => EngineError::Decode(other.to_string()),
        })
    }

    fn natural_dimensions(&self, image: &DynamicImage) -> Result<Dimensions, EngineError> {
        let (width, height) = image.dimensions();
        Ok(Dimensions { width, height })
    }

    fn convert_format(
        &self,
        image: DynamicImage,
        format: OutputFormat,
    ) -> Result<DynamicImage, EngineError> {
        let keep_alpha = format.supports_alpha() && image.color().has_alpha();
        let converted = match image {
            DynamicImage::ImageRgba8(_) if keep_alpha => image,
            DynamicImage::ImageRgb8(_) if !keep_alpha => image,
            other if keep_alpha => DynamicImage::ImageRgba8(other.to_rgba8()),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };
        Ok(converted)
    }

    fn resize(&self, image: DynamicImage, target: Dimensions) -> Result<DynamicImage, EngineError> {
        check_target(target)?;
        Ok(image.resize_exact(target.width, target.height, FilterType::Lanczos3))
    }

    fn enlarge(
        &self,
        image: DynamicImage,
        target: Dimensions,
    ) -> Result<DynamicImage, EngineError> {
        check_target(target)?;
        Ok(image.resize_exact(target.width, target.height, FilterType::CatmullRom))
    }

    fn encode_with_quality(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, EngineError> {
        match format {
            OutputFormat::Jpeg => encode_jpeg(image, quality),
            OutputFormat::Avif => encode_avif(image, quality),
        }
    }
}
