//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur while sniffing, transforming or encoding images.
#[derive(Debug, Error)]
pub enum ImageError {
    /// No known magic signature matched
    #[error("Unknown image format")]
    UnknownFormat,

    /// Input too short or otherwise malformed
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// Source or target dimensions are not positive
    #[error("Invalid dimensions: source {source_width}x{source_height}, target {target_width}x{target_height}")]
    InvalidDimensions {
        /// Original width in pixels
        source_width: u64,
        /// Original height in pixels
        source_height: u64,
        /// Requested width
        target_width: i64,
        /// Requested height
        target_height: i64,
    },

    /// Requested output is larger than the configured pixel budget
    #[error("Requested output {width}x{height} exceeds the limit of {limit} pixels")]
    TooLarge {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Maximum number of output pixels
        limit: u64,
    },

    /// The encoder does not know this format identifier
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The encoder rejected the image (e.g. alpha channel into JPEG)
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Decoding failed
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),
}

impl ImageError {
    /// Build an `InvalidDimensions` error from source size and requested target.
    pub fn invalid_dimensions(source: (u32, u32), target: (i64, i64)) -> Self {
        Self::InvalidDimensions {
            source_width: u64::from(source.0),
            source_height: u64::from(source.1),
            target_width: target.0,
            target_height: target.1,
        }
    }
}
