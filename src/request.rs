//! Request-level validation for `POST /resize`.
//!
//! The HTTP layer collects the multipart fields into a [`ResizeForm`];
//! [`ResizeForm::validate`] then applies the boundary rules in order:
//!
//! 1. The body must have been read to the end → otherwise 500, or 413 when
//!    it exceeded the upload limit. Fields after the failure were never seen,
//!    so this is reported before any missing field.
//! 2. `size` must be present (it may be empty) → otherwise 400.
//! 3. `quality`, when present, must be an integer in 0–100 → otherwise 400.
//! 4. The `image` part must be present → otherwise 500.
//!
//! Nothing is dispatched unless all four pass.

use crate::imaging::{Quality, QualityError};
use crate::sizes::{SizeToken, split_size_list};
use axum::http::StatusCode;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("You need to provide an image and a size.")]
    MissingSize,
    #[error(transparent)]
    Quality(#[from] QualityError),
    /// The reason is logged, never sent to the client.
    #[error("Something went wrong while trying to read the image.")]
    ImageRead(String),
    #[error("The upload is larger than the server accepts.")]
    UploadTooLarge(String),
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingSize | Self::Quality(_) => StatusCode::BAD_REQUEST,
            Self::ImageRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

/// Raw multipart fields as received. The first occurrence of a field wins.
#[derive(Debug, Default)]
pub struct ResizeForm {
    image: Option<Vec<u8>>,
    size: Option<String>,
    quality: Option<String>,
    body_error: Option<RequestError>,
}

impl ResizeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_image(&mut self, bytes: Vec<u8>) {
        self.image.get_or_insert(bytes);
    }

    /// Note that the body stopped being readable. Only the first failure is kept.
    pub fn record_body_error(&mut self, reason: impl Into<String>, too_large: bool) {
        let reason = reason.into();
        self.body_error.get_or_insert(if too_large {
            RequestError::UploadTooLarge(reason)
        } else {
            RequestError::ImageRead(reason)
        });
    }

    pub fn set_size(&mut self, value: impl Into<String>) {
        self.size.get_or_insert(value.into());
    }

    pub fn set_quality(&mut self, value: impl Into<String>) {
        self.quality.get_or_insert(value.into());
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Check the form and produce the inputs of one dispatch.
    pub fn validate(self, default_quality: Quality) -> Result<ResizeRequest, RequestError> {
        if let Some(err) = self.body_error {
            return Err(err);
        }
        let size = self.size.ok_or(RequestError::MissingSize)?;
        let quality = match self.quality {
            Some(raw) => Quality::parse(&raw)?,
            None => default_quality,
        };
        let image = self
            .image
            .ok_or_else(|| RequestError::ImageRead("no image part in form".into()))?;

        Ok(ResizeRequest {
            image: Arc::from(image),
            tokens: split_size_list(&size),
            raw_sizes: size,
            quality,
        })
    }
}

/// A validated resize request, ready for the dispatcher.
#[derive(Debug, Clone)]
pub struct ResizeRequest {
    pub image: Arc<[u8]>,
    pub tokens: Vec<SizeToken>,
    /// The `size` field exactly as sent, for logging.
    pub raw_sizes: String,
    pub quality: Quality,
}
