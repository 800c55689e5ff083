//! Fit and center-crop transforms built on the image crate.
//!
//! Both transforms resample with Lanczos3 and hand the final pixels to
//! [`encode`]. The crop transform always produces exactly the requested
//! size; fit only guarantees the result lies within it.

use crate::color::prepare_for;
use crate::extension::OutputFormat;
use crate::geometry::{Dimensions, center_crop_rect, fit_dimensions};
use crate::{ImageError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;

/// Resampling filter shared by both transforms.
const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Spend more CPU for smaller PNG output
    pub optimize: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 75,
            optimize: true,
        }
    }
}

/// Geometric transform applied before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Aspect-preserving resize that fits inside the target box
    Fit,
    /// Crop to the target aspect from the center, then resize to exactly the target
    CenterCrop,
}

impl Transform {
    /// Resample `img` for `target` without encoding.
    pub fn render(self, img: &DynamicImage, target: Dimensions) -> Result<DynamicImage> {
        match self {
            Transform::Fit => fit(img, target),
            Transform::CenterCrop => center_crop(img, target),
        }
    }

    /// Size of the image `render` produces from `original` for `target`.
    pub fn output_size(self, original: Dimensions, target: Dimensions) -> Dimensions {
        match self {
            Transform::Fit if original.is_positive() => fit_dimensions(original, target),
            _ => target,
        }
    }

    /// Resample `img` for `target` and encode the result as `format`.
    pub fn apply(
        self,
        img: &DynamicImage,
        target: Dimensions,
        format: OutputFormat,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>> {
        let rendered = self.render(img, target)?;
        encode(&rendered, format, options)
    }
}

/// Decode image bytes, guessing the container from the content.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(image::ImageError::IoError(e)))?;
    Ok(reader.decode()?)
}

/// Resize `img` to fit within `target`, preserving its aspect ratio.
pub fn fit(img: &DynamicImage, target: Dimensions) -> Result<DynamicImage> {
    let original = checked_source(img, target)?;
    let size = fit_dimensions(original, target);
    Ok(img.resize_exact(size.width, size.height, RESAMPLE_FILTER))
}

/// Cut the centered region with the target aspect and resize it to exactly `target`.
pub fn center_crop(img: &DynamicImage, target: Dimensions) -> Result<DynamicImage> {
    let original = checked_source(img, target)?;
    let rect = center_crop_rect(original, target);
    let cropped = img.crop_imm(rect.x, rect.y, rect.width, rect.height);
    Ok(cropped.resize_exact(target.width, target.height, RESAMPLE_FILTER))
}

/// Encode `img` into `format`.
pub fn encode(img: &DynamicImage, format: OutputFormat, options: &EncodeOptions) -> Result<Vec<u8>> {
    let prepared = prepare_for(img, format)?;
    let mut buffer = Cursor::new(Vec::new());

    let written = match format {
        OutputFormat::Jpeg => {
            let quality = options.jpeg_quality.clamp(1, 100);
            prepared.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))
        }
        OutputFormat::Png if options.optimize => prepared.write_with_encoder(
            PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive),
        ),
        other => prepared.write_to(&mut buffer, other.image_format()),
    };

    written.map_err(|e| ImageError::EncodingError(e.to_string()))?;
    Ok(buffer.into_inner())
}

fn checked_source(img: &DynamicImage, target: Dimensions) -> Result<Dimensions> {
    let original = Dimensions::from(img.dimensions());
    if !original.is_positive() || !target.is_positive() {
        return Err(ImageError::invalid_dimensions(
            (original.width, original.height),
            (i64::from(target.width), i64::from(target.height)),
        ));
    }
    Ok(original)
}
