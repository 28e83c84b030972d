//! Parameter types for image operations.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (0–100, default 100). Validated, never clamped.
//! - [`OutputFormat`]: The lossy web container every size is re-encoded into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityError {
    #[error("Quality must be a number.")]
    NotNumeric,
    #[error("Quality must be between 0 and 100.")]
    OutOfRange,
}

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self, QualityError> {
        if !(0..=i64::from(Self::MAX)).contains(&value) {
            return Err(QualityError::OutOfRange);
        }
        Ok(Self(value as u8))
    }

    /// Parse a form value such as `"80"`.
    ///
    /// A sign is accepted, surrounding whitespace is not. Anything that does not
    /// parse as an integer is [`QualityError::NotNumeric`]; integers outside
    /// 0–100 are [`QualityError::OutOfRange`].
    pub fn parse(raw: &str) -> Result<Self, QualityError> {
        let value = raw.parse::<i64>().map_err(|_| QualityError::NotNumeric)?;
        Self::new(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<i64> for Quality {
    type Error = QualityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output container for re-encoded sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Avif,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Avif => "image/avif",
        }
    }

    /// Whether the container can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Avif)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "avif" => Ok(Self::Avif),
            other => Err(format!("unsupported output format '{other}' (expected jpeg or avif)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("jpeg"),
            Self::Avif => f.write_str("avif"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_accepts_full_range() {
        assert_eq!(Quality::new(0).unwrap().value(), 0);
        assert_eq!(Quality::new(50).unwrap().value(), 50);
        assert_eq!(Quality::new(100).unwrap().value(), 100);
    }

    #[test]
    fn quality_rejects_out_of_range() {
        assert_eq!(Quality::new(-1), Err(QualityError::OutOfRange));
        assert_eq!(Quality::new(101), Err(QualityError::OutOfRange));
        assert_eq!(Quality::parse("150"), Err(QualityError::OutOfRange));
    }

    #[test]
    fn quality_parse_rejects_non_numeric() {
        assert_eq!(Quality::parse("abc"), Err(QualityError::NotNumeric));
        assert_eq!(Quality::parse(""), Err(QualityError::NotNumeric));
        assert_eq!(Quality::parse(" 80"), Err(QualityError::NotNumeric));
        assert_eq!(Quality::parse("80.5"), Err(QualityError::NotNumeric));
    }

    #[test]
    fn quality_parse_accepts_signed_integers() {
        assert_eq!(Quality::parse("+80").unwrap().value(), 80);
        assert_eq!(Quality::parse("-3"), Err(QualityError::OutOfRange));
    }

    #[test]
    fn quality_default_is_100() {
        assert_eq!(Quality::default().value(), 100);
    }

    #[test]
    fn quality_error_messages() {
        assert_eq!(
            QualityError::NotNumeric.to_string(),
            "Quality must be a number."
        );
        assert_eq!(
            QualityError::OutOfRange.to_string(),
            "Quality must be between 0 and 100."
        );
    }

    #[test]
    fn output_format_mime_types() {
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Avif.mime_type(), "image/avif");
        assert_eq!(OutputFormat::default(), OutputFormat::Jpeg);
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("JPG".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("avif".parse::<OutputFormat>(), Ok(OutputFormat::Avif));
        assert!("webp".parse::<OutputFormat>().is_err());
    }
}
