//! Per-size transform: parse, decide, convert, resample, encode.
//!
//! [`transform`] turns one uploaded image and one [`SizeToken`] into a
//! [`ResultItem`] whose payload is a data URI:
//!
//! ```text
//! blank token ──────────────────────────────────────────────► empty payload
//! "WxH" → decode → natural dims → convert → downscale|enlarge → encode → data URI
//! ```
//!
//! Every step after parsing goes through the [`ImageEngine`]; any failure
//! aborts this size only, with no retry. Once started, a transform always
//! runs to completion; cancellation is only honoured before a job starts.

use super::calculations::{Resample, choose_resample};
use super::engine::{EngineError, ImageEngine};
use super::params::{OutputFormat, Quality};
use crate::sizes::{SizeError, SizeToken};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("invalid size: {0}")]
    InvalidSize(#[from] SizeError),
    #[error("decode failed: {0}")]
    DecodeFailed(EngineError),
    #[error("could not read natural dimensions: {0}")]
    DimensionsUnavailable(EngineError),
    #[error("format conversion failed: {0}")]
    ConvertFailed(EngineError),
    #[error("downscale failed: {0}")]
    ResizeFailed(EngineError),
    #[error("enlarge failed: {0}")]
    EnlargeFailed(EngineError),
    #[error("encode failed: {0}")]
    EncodeFailed(EngineError),
    #[error("engine panicked: {0}")]
    Panicked(String),
}

/// Why an item does or does not carry a payload. Not serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ItemStatus {
    #[default]
    Encoded,
    Blank,
    Failed(String),
    Cancelled,
}

impl ItemStatus {
    pub fn describe(&self) -> &str {
        match self {
            Self::Encoded => "encoded",
            Self::Blank => "blank",
            Self::Failed(reason) => reason,
            Self::Cancelled => "cancelled",
        }
    }
}

/// One output entry, labelled with the size token it answers.
///
/// An empty `payload` means there is no usable image for this label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    #[serde(rename = "size")]
    pub label: String,
    #[serde(rename = "base64")]
    pub payload: String,
    #[serde(skip)]
    pub status: ItemStatus,
}

impl ResultItem {
    pub fn encoded(label: impl Into<String>, payload: String) -> Self {
        Self {
            label: label.into(),
            payload,
            status: ItemStatus::Encoded,
        }
    }

    pub fn blank() -> Self {
        Self {
            label: String::new(),
            payload: String::new(),
            status: ItemStatus::Blank,
        }
    }

    pub fn failed(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: String::new(),
            status: ItemStatus::Failed(reason.into()),
        }
    }

    pub fn cancelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: String::new(),
            status: ItemStatus::Cancelled,
        }
    }

    pub fn is_usable(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Failed or cancelled, as opposed to deliberately blank.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ItemStatus::Failed(_) | ItemStatus::Cancelled)
    }
}

/// Settings shared by every transform of a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub format: OutputFormat,
    /// Largest accepted width or height of a requested size.
    pub max_dimension: u32,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            max_dimension: 8192,
        }
    }
}

/// Wrap encoded bytes as `data:<mime>;base64,<data>`.
pub fn to_data_uri(bytes: &[u8], format: OutputFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes))
}

/// Produce the result item for one size token.
///
/// Blank tokens short-circuit to an empty item without calling the engine.
pub fn transform<E: ImageEngine + ?Sized>(
    engine: &E,
    raw: &[u8],
    token: &SizeToken,
    quality: Quality,
    options: &TransformOptions,
) -> Result<ResultItem, TransformError> {
    if token.is_blank() {
        return Ok(ResultItem::blank());
    }
    let target = token.dimensions(options.max_dimension)?;

    let image = engine.decode(raw).map_err(TransformError::DecodeFailed)?;
    let natural = engine
        .natural_dimensions(&image)
        .map_err(TransformError::DimensionsUnavailable)?;

    let image = engine
        .convert_format(image, options.format)
        .map_err(TransformError::ConvertFailed)?;

    let resample = choose_resample(natural, target);
    debug!(size = %token, %natural, ?resample, "resampling");
    let image = match resample {
        Resample::Downscale => engine
            .resize(image, target)
            .map_err(TransformError::ResizeFailed)?,
        Resample::Enlarge => engine
            .enlarge(image, target)
            .map_err(TransformError::EnlargeFailed)?,
    };

    let bytes = engine
        .encode_with_quality(&image, options.format, quality)
        .map_err(TransformError::EncodeFailed)?;

    Ok(ResultItem::encoded(
        token.as_str(),
        to_data_uri(&bytes, options.format),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustEngine;
    use crate::imaging::engine::tests::{MockEngine, RecordedOp, mock_image_bytes};
    use crate::test_helpers::{decode_data_uri, encode_png};
    use image::GenericImageView;

    fn run(engine: &MockEngine, raw: &[u8], token: &str) -> Result<ResultItem, TransformError> {
        transform(
            engine,
            raw,
            &SizeToken::from(token),
            Quality::new(80).unwrap(),
            &TransformOptions::default(),
        )
    }

    #[test]
    fn blank_token_skips_engine() {
        let engine = MockEngine::new();
        let item = run(&engine, &mock_image_bytes(100, 100), "").unwrap();

        assert_eq!(item, ResultItem::blank());
        assert!(!item.is_usable());
        assert!(engine.get_operations().is_empty());
    }

    #[test]
    fn smaller_target_takes_downscale_path() {
        let engine = MockEngine::new();
        let item = run(&engine, &mock_image_bytes(100, 100), "50x50").unwrap();

        assert_eq!(item.label, "50x50");
        assert_eq!(item.payload, to_data_uri(b"jpeg:50x50@80", OutputFormat::Jpeg));
        assert_eq!(
            engine.get_operations(),
            vec![
                RecordedOp::Decode,
                RecordedOp::NaturalDimensions,
                RecordedOp::Convert(OutputFormat::Jpeg),
                RecordedOp::Resize {
                    width: 50,
                    height: 50
                },
                RecordedOp::Encode {
                    format: OutputFormat::Jpeg,
                    quality: 80
                },
            ]
        );
    }

    #[test]
    fn larger_target_takes_enlarge_path() {
        let engine = MockEngine::new();
        run(&engine, &mock_image_bytes(100, 100), "200x200").unwrap();

        let ops = engine.get_operations();
        assert!(ops.contains(&RecordedOp::Enlarge {
            width: 200,
            height: 200
        }));
        assert!(!ops.iter().any(|op| matches!(op, RecordedOp::Resize { .. })));
    }

    #[test]
    fn mixed_axes_take_downscale_path() {
        let engine = MockEngine::new();
        run(&engine, &mock_image_bytes(1000, 50), "100x400").unwrap();

        assert!(engine.get_operations().contains(&RecordedOp::Resize {
            width: 100,
            height: 400
        }));
    }

    #[test]
    fn malformed_token_fails_before_decode() {
        let engine = MockEngine::new();
        let err = run(&engine, &mock_image_bytes(100, 100), "abcxdef").unwrap_err();

        assert!(matches!(err, TransformError::InvalidSize(_)));
        assert!(engine.get_operations().is_empty());
    }

    #[test]
    fn corrupt_image_is_decode_failure() {
        let engine = MockEngine::new();
        let err = run(&engine, b"corrupt", "10x10").unwrap_err();
        assert!(matches!(err, TransformError::DecodeFailed(_)));
    }

    #[test]
    fn avif_output_uses_avif_mime() {
        let engine = MockEngine::new();
        let options = TransformOptions {
            format: OutputFormat::Avif,
            ..TransformOptions::default()
        };
        let item = transform(
            &engine,
            &mock_image_bytes(10, 10),
            &SizeToken::from("5x5"),
            Quality::default(),
            &options,
        )
        .unwrap();
        assert!(item.payload.starts_with("data:image/avif;base64,"));
    }

    #[test]
    fn real_engine_downscale_has_exact_dimensions() {
        let item = transform(
            &RustEngine::new(),
            &encode_png(100, 100),
            &SizeToken::from("50x50"),
            Quality::new(90).unwrap(),
            &TransformOptions::default(),
        )
        .unwrap();

        let (mime, image) = decode_data_uri(&item.payload);
        assert_eq!(mime, "image/jpeg");
        assert_eq!(image.dimensions(), (50, 50));
    }

    #[test]
    fn real_engine_enlarge_has_exact_dimensions() {
        let item = transform(
            &RustEngine::new(),
            &encode_png(100, 100),
            &SizeToken::from("200x200"),
            Quality::new(90).unwrap(),
            &TransformOptions::default(),
        )
        .unwrap();

        let (_, image) = decode_data_uri(&item.payload);
        assert_eq!(image.dimensions(), (200, 200));
    }

    #[test]
    fn result_item_serializes_with_wire_names() {
        let item = ResultItem::encoded("5x5", "data:image/jpeg;base64,AA==".to_string());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"size": "5x5", "base64": "data:image/jpeg;base64,AA=="})
        );
    }
}
