//! Image side of the pixfront proxy.
//!
//! This crate provides:
//! - Format detection from magic bytes ([`sniff_signature`])
//! - Declared extension parsing and encoder selection ([`declared_extension`], [`OutputFormat`])
//! - Fit and center-crop transforms ([`Transform`])
//! - Integer-exact geometry behind both transforms

#![warn(missing_docs)]

mod color;
mod detect;
mod error;
mod extension;
pub mod geometry;
mod transform;

pub use color::has_alpha_channel;
pub use detect::{ImageFormat, UNKNOWN, detect_format, sniff_signature};
pub use error::{ImageError, Result};
pub use extension::{OutputFormat, canonical_extension, declared_extension};
pub use geometry::{
    CropRect, DEFAULT_MAX_OUTPUT_PIXELS, Dimensions, center_crop_rect, fit_dimensions,
};
pub use transform::{EncodeOptions, Transform, center_crop, decode, encode, fit};

/// Re-exported so callers can hold decoded images without depending on `image` directly.
pub use image::DynamicImage;
