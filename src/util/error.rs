//! Error types for the b3dm library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for b3dm operations.
///
/// Only fatal read failures live here. Structural defects in an otherwise
/// readable file are reported as [`ValidationIssue`](crate::tile::ValidationIssue)
/// values instead.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// First four bytes are not `b3dm`
    #[error("Invalid b3dm file: expected magic bytes 'b3dm', found {0:?}")]
    BadMagic([u8; 4]),

    /// Fewer than 28 bytes available for the header
    #[error("Truncated header: expected 28 bytes, got {available}")]
    TruncatedHeader { available: usize },

    /// Header is fine but the body is shorter than the declared lengths
    #[error("Truncated body: {segment} needs {needed} bytes, got {available}")]
    TruncatedBody {
        segment: &'static str,
        needed: usize,
        available: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON segment is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Content does not fit the u32 length fields of the header
    #[error("Container too large: {total} bytes exceeds the 4 GiB format limit")]
    TooLarge { total: u64 },
}

impl Error {
    /// Stable short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FileNotFound",
            Self::BadMagic(_) => "BadMagic",
            Self::TruncatedHeader { .. } => "TruncatedHeader",
            Self::TruncatedBody { .. } => "TruncatedBody",
            Self::Io(_) => "Io",
            Self::Utf8(_) => "Utf8",
            Self::TooLarge { .. } => "TooLarge",
        }
    }
}

/// Result type alias for b3dm operations.
pub type Result<T> = std::result::Result<T, Error>;
