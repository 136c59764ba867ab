//! Error types.
//!
//! [`RecognitionError`] is the recoverable failure of one detection step on
//! one page image. The orchestrator catches it, logs it and records the page
//! as failed; it never aborts a sheet. [`ConfigError`] is fatal and aborts the
//! whole run.

use std::path::PathBuf;

// ── Recognition errors ───────────────────────────────────────────────────

/// Recoverable failure of a single detection step.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecognitionError {
    /// Fewer than three of the four corner markers were found.
    MatrixNotFound { corners_found: usize },
    /// A matrix was built but fails the sanity bounds.
    DegenerateMatrix { reason: String },
    /// The page has no usable mm→px matrix for this measurement.
    MissingMatrix,
    /// The corner-box pattern matches no table entry, upright or reversed.
    UnknownCornerPattern { pattern: [u8; 4] },
    /// The page still reads as rotated where an upright page is required.
    PageRotated,
    /// A barcode was expected but could not be decoded.
    BarcodeUnreadable { symbology: String },
    /// The page image could not be loaded.
    ImageLoad { path: PathBuf, message: String },
}

impl RecognitionError {
    /// Stable snake_case identifier.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MatrixNotFound { .. } => "matrix_not_found",
            Self::DegenerateMatrix { .. } => "degenerate_matrix",
            Self::MissingMatrix => "missing_matrix",
            Self::UnknownCornerPattern { .. } => "unknown_corner_pattern",
            Self::PageRotated => "page_rotated",
            Self::BarcodeUnreadable { .. } => "barcode_unreadable",
            Self::ImageLoad { .. } => "image_load",
        }
    }
}

impl std::fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatrixNotFound { corners_found } => {
                write!(f, "matrix not recognized: {} of 4 corner markers found", corners_found)
            }
            Self::DegenerateMatrix { reason } => write!(f, "implausible page matrix: {}", reason),
            Self::MissingMatrix => f.write_str("no page matrix available"),
            Self::UnknownCornerPattern { pattern } => write!(
                f,
                "corner box pattern {:?} does not encode a page number",
                pattern
            ),
            Self::PageRotated => f.write_str("page is still rotated"),
            Self::BarcodeUnreadable { symbology } => {
                write!(f, "{} barcode could not be read", symbology)
            }
            Self::ImageLoad { path, message } => {
                write!(f, "could not load {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for RecognitionError {}

// ── Fatal configuration errors ───────────────────────────────────────────

/// Fatal error raised while loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    UnsupportedSchema { found: String, expected: &'static str },
    InvalidSettings(String),
    MissingCustomStyle,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {}", e),
            Self::Json(e) => write!(f, "invalid json: {}", e),
            Self::UnsupportedSchema { found, expected } => write!(
                f,
                "unsupported schema '{}' (expected '{}')",
                found, expected
            ),
            Self::InvalidSettings(msg) => write!(f, "invalid survey settings: {}", msg),
            Self::MissingCustomStyle => {
                f.write_str("survey uses the custom style but no implementation was supplied")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
