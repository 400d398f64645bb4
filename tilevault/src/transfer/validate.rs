//! Pre-submission upload validation.
//!
//! All checks run before an [`UploadTask`](super::UploadTask) is constructed,
//! so the queue never sees an invalid coordinate or a non-image payload.
//! Rejections are user errors, reported per item; they never abort the rest
//! of a batch.
//!
//! Two source layouts are accepted when deriving the target coordinate from
//! a relative path:
//!
//! - nested: `{z}/{x}/{y}.png`
//! - flat: `{z}-{x}-{y}.png`
//!
//! Coordinate segments must match `^\d+$` exactly; the payload must sniff as
//! PNG, JPEG, or WebP.

use std::path::Path;
use std::sync::OnceLock;

use bytes::Bytes;
use image::ImageFormat;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::coord::TileCoord;

/// Coordinate segment contract: decimal digits only.
fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+$").expect("static pattern compiles"))
}

/// Image formats accepted for tile payloads.
const ACCEPTED_FORMATS: [ImageFormat; 3] =
    [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

/// A user-supplied upload item failed the coordinate or content contract.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A derived coordinate segment is not a plain decimal integer.
    #[error("coordinate segment '{segment}' does not match ^\\d+$")]
    InvalidSegment {
        /// The offending segment text.
        segment: String,
    },

    /// The source name does not yield three coordinate segments.
    #[error("cannot derive a (z, x, y) coordinate from '{name}'")]
    UnrecognizedName {
        /// The offending source name.
        name: String,
    },

    /// The payload is not an accepted raster image format.
    #[error("payload is not an accepted image format (png, jpeg, webp)")]
    UnsupportedFormat,
}

/// A validated upload: target coordinate plus payload, ready to queue.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target tile coordinate.
    pub target: TileCoord,
    /// Tile image bytes.
    pub payload: Bytes,
}

impl UploadRequest {
    /// Validate a payload destined for an explicit coordinate.
    pub fn new(target: TileCoord, payload: Bytes) -> Result<Self, ValidationError> {
        validate_payload(&payload)?;
        Ok(Self { target, payload })
    }

    /// Derive the target coordinate from a relative source path, then
    /// validate the payload.
    pub fn from_relative_path(path: &Path, payload: Bytes) -> Result<Self, ValidationError> {
        let target = coordinate_from_path(path)?;
        Self::new(target, payload)
    }
}

/// Check that the payload sniffs as an accepted image format.
pub fn validate_payload(payload: &[u8]) -> Result<(), ValidationError> {
    match image::guess_format(payload) {
        Ok(format) if ACCEPTED_FORMATS.contains(&format) => Ok(()),
        Ok(format) => {
            debug!(?format, "rejected payload with unaccepted image format");
            Err(ValidationError::UnsupportedFormat)
        }
        Err(_) => Err(ValidationError::UnsupportedFormat),
    }
}

/// Parse three raw segments into a coordinate, enforcing the `^\d+$` contract.
pub fn parse_segments(z: &str, x: &str, y: &str) -> Result<TileCoord, ValidationError> {
    let parse = |segment: &str| -> Result<u32, ValidationError> {
        if !segment_pattern().is_match(segment) {
            return Err(ValidationError::InvalidSegment {
                segment: segment.to_string(),
            });
        }
        segment
            .parse()
            .map_err(|_| ValidationError::InvalidSegment {
                segment: segment.to_string(),
            })
    };
    Ok(TileCoord::new(parse(z)?, parse(x)?, parse(y)?))
}

/// Derive a coordinate from `{z}/{x}/{y}.ext` or `{z}-{x}-{y}.ext`.
fn coordinate_from_path(path: &Path) -> Result<TileCoord, ValidationError> {
    let unrecognized = || ValidationError::UnrecognizedName {
        name: path.display().to_string(),
    };

    let components: Vec<&str> = path
        .iter()
        .map(|c| c.to_str().unwrap_or_default())
        .collect();

    match components[..] {
        [stem] => {
            // Flat layout: the stem itself is "z-x-y"
            let stem = Path::new(stem)
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(unrecognized)?;
            let segments: Vec<&str> = stem.split('-').collect();
            let [z, x, y] = segments[..] else {
                return Err(unrecognized());
            };
            parse_segments(z, x, y)
        }
        [z, x, y_file] => {
            let y = Path::new(y_file)
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(unrecognized)?;
            parse_segments(z, x, y)
        }
        _ => Err(unrecognized()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// PNG magic bytes are enough for format sniffing.
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];
    const GIF_MAGIC: &[u8] = b"GIF89a";

    fn png() -> Bytes {
        Bytes::from_static(PNG_MAGIC)
    }

    #[test]
    fn test_accepts_png_and_jpeg() {
        assert!(validate_payload(PNG_MAGIC).is_ok());
        assert!(validate_payload(JPEG_MAGIC).is_ok());
    }

    #[test]
    fn test_rejects_non_image_and_unaccepted_formats() {
        assert!(matches!(
            validate_payload(b"plain text"),
            Err(ValidationError::UnsupportedFormat)
        ));
        assert!(matches!(
            validate_payload(GIF_MAGIC),
            Err(ValidationError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_parse_segments_enforces_digit_contract() {
        assert_eq!(
            parse_segments("1", "22", "333").unwrap(),
            TileCoord::new(1, 22, 333)
        );
        for bad in ["-1", "+1", "1.0", "x", "", " 1"] {
            assert!(
                parse_segments(bad, "0", "0").is_err(),
                "segment '{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_nested_path_layout() {
        let request =
            UploadRequest::from_relative_path(Path::new("12/2048/1365.png"), png()).unwrap();
        assert_eq!(request.target, TileCoord::new(12, 2048, 1365));
    }

    #[test]
    fn test_flat_path_layout() {
        let request =
            UploadRequest::from_relative_path(Path::new("12-2048-1365.png"), png()).unwrap();
        assert_eq!(request.target, TileCoord::new(12, 2048, 1365));
    }

    #[test]
    fn test_unrecognized_names_rejected() {
        for name in ["tile.png", "1/2.png", "1/2/3/4.png", "a-b-c.png", "1-2.png"] {
            let err = UploadRequest::from_relative_path(Path::new(name), png());
            assert!(err.is_err(), "name '{}' should be rejected", name);
        }
    }

    #[test]
    fn test_invalid_payload_rejected_even_with_valid_name() {
        let result =
            UploadRequest::from_relative_path(Path::new("1/2/3.png"), Bytes::from_static(b"nope"));
        assert!(matches!(result, Err(ValidationError::UnsupportedFormat)));
    }
}
