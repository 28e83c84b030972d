//! Image engine trait and shared types.
//!
//! The [`ImageEngine`] trait is the full set of capabilities the resize
//! pipeline needs from a pixel library: decode, natural dimensions, format
//! conversion, exact downscale, exact enlarge, and quality-controlled encode.
//! Nothing above this module knows which library does the work.
//!
//! The production implementation is
//! [`RustEngine`](super::rust_engine::RustEngine), built on the `image` crate.

use super::params::{OutputFormat, Quality};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Processing failed: {0}")]
    Processing(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image or of a requested output box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image processing engines.
///
/// Operations consume and return the engine's own decoded handle so an
/// implementation is free to work in place. Implementations must be
/// shareable across worker threads.
pub trait ImageEngine: Send + Sync {
    /// Decoded image handle.
    type Image: Send;

    /// Decode raw uploaded bytes.
    fn decode(&self, raw: &[u8]) -> Result<Self::Image, EngineError>;

    /// Natural (pre-resize) dimensions of a decoded image.
    fn natural_dimensions(&self, image: &Self::Image) -> Result<Dimensions, EngineError>;

    /// Prepare the image for the target container (color model, alpha).
    fn convert_format(
        &self,
        image: Self::Image,
        format: OutputFormat,
    ) -> Result<Self::Image, EngineError>;

    /// Downscale to exactly `target`.
    fn resize(&self, image: Self::Image, target: Dimensions) -> Result<Self::Image, EngineError>;

    /// Enlarge to exactly `target`.
    fn enlarge(&self, image: Self::Image, target: Dimensions) -> Result<Self::Image, EngineError>;

    /// Encode into `format` at the given quality.
    fn encode_with_quality(
        &self,
        image: &Self::Image,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, EngineError>;
}
