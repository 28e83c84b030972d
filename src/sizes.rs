//! Size list parsing.
//!
//! A request carries its target sizes as one `;`-delimited string:
//!
//! ```text
//! 64x64;128x128;;512x512
//! ```
//!
//! Parsing happens in two phases. [`split_size_list`] only splits the string
//! into [`SizeToken`]s and never fails, so a single bad entry cannot reject the
//! whole request. Each token is turned into [`Dimensions`] later, inside its
//! own job, by [`SizeToken::dimensions`]. Empty tokens (produced by doubled or
//! trailing delimiters) are the blank sentinel and yield no output.

use crate::imaging::Dimensions;
use std::fmt;
use thiserror::Error;

/// Delimiter between tokens in the raw size list.
pub const LIST_DELIMITER: char = ';';

/// Separator between width and height inside a token.
pub const AXIS_SEPARATOR: char = 'x';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("size '{0}' is not of the form <width>x<height>")]
    MissingSeparator(String),
    #[error("size part '{part}' is not a number")]
    InvalidNumber { part: String },
    #[error("size '{0}' has a zero dimension")]
    ZeroDimension(String),
    #[error("size '{token}' exceeds the maximum of {max} pixels per axis")]
    TooLarge { token: String, max: u32 },
}

/// One entry of the size list, kept verbatim.
///
/// The original text is the label echoed back in the response, including for
/// malformed tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SizeToken(String);

impl SizeToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty sentinel left behind by extra delimiters.
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `"<width>x<height>"` into target dimensions.
    ///
    /// Exactly one separator is accepted and both sides must be positive
    /// integers no larger than `max_dimension`.
    pub fn dimensions(&self, max_dimension: u32) -> Result<Dimensions, SizeError> {
        let (width, height) = self
            .0
            .split_once(AXIS_SEPARATOR)
            .ok_or_else(|| SizeError::MissingSeparator(self.0.clone()))?;
        let width = parse_axis(width)?;
        let height = parse_axis(height)?;

        if width == 0 || height == 0 {
            return Err(SizeError::ZeroDimension(self.0.clone()));
        }
        if width > max_dimension || height > max_dimension {
            return Err(SizeError::TooLarge {
                token: self.0.clone(),
                max: max_dimension,
            });
        }
        Ok(Dimensions { width, height })
    }
}

impl fmt::Display for SizeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SizeToken {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

fn parse_axis(part: &str) -> Result<u32, SizeError> {
    part.parse::<u32>().map_err(|_| SizeError::InvalidNumber {
        part: part.to_string(),
    })
}

/// Split the raw size list into tokens, preserving order and blanks.
///
/// `"5x5;20x20;"` yields three tokens, the last one blank. An empty input
/// yields a single blank token.
pub fn split_size_list(raw: &str) -> Vec<SizeToken> {
    raw.split(LIST_DELIMITER).map(SizeToken::from).collect()
}
