//! Declared extensions and encoder format selection.
//!
//! The extension in a request path decides the output encoder and the
//! reported media type of a transformed image. It is resolved independently
//! of the byte signature (see [`crate::detect`]); the two may disagree.

use crate::detect::UNKNOWN;
use crate::{ImageError, Result};

/// Extract the lower-cased extension of the last path segment.
///
/// Returns `"unknown"` when the segment has no extension. Query strings and
/// fragments are ignored, and a leading dot (`.hidden`) does not start an
/// extension.
///
/// ```
/// use pixfront_image::declared_extension;
///
/// assert_eq!(declared_extension("test/nm_blue.WEBP"), "webp");
/// assert_eq!(declared_extension("bucket/README"), "unknown");
/// ```
pub fn declared_extension(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default();
    let stem_start = name.len() - name.trim_start_matches('.').len();

    match name[stem_start..].rfind('.') {
        Some(dot) => {
            let ext = &name[stem_start + dot + 1..];
            if ext.is_empty() {
                UNKNOWN.to_string()
            } else {
                ext.to_lowercase()
            }
        }
        None => UNKNOWN.to_string(),
    }
}

/// Map a declared extension to the identifier the encoder understands.
///
/// Only `jpg` needs rewriting; every other extension is already canonical.
pub fn canonical_extension(ext: &str) -> &str {
    match ext {
        "jpg" => "jpeg",
        other => other,
    }
}

/// Formats the transform engine can encode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Baseline JPEG
    Jpeg,
    /// PNG
    Png,
    /// GIF
    Gif,
    /// Lossless WebP
    WebP,
    /// Windows bitmap
    Bmp,
    /// TIFF
    Tiff,
}

impl OutputFormat {
    /// Resolve a canonical identifier. `jpg` is deliberately not accepted;
    /// run it through [`canonical_extension`] first.
    pub fn from_canonical(name: &str) -> Result<Self> {
        match name {
            "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::WebP),
            "bmp" => Ok(Self::Bmp),
            "tiff" => Ok(Self::Tiff),
            other => Err(ImageError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Whether the encoder can store an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Gif => image::ImageFormat::Gif,
            Self::WebP => image::ImageFormat::WebP,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}
