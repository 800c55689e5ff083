//! Color mode checks before encoding.

use crate::error::{ImageError, Result};
use crate::extension::OutputFormat;
use image::DynamicImage;
use std::borrow::Cow;

/// Check if an image has an alpha channel
pub fn has_alpha_channel(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}

/// Convert `img` into a pixel layout the encoder for `format` accepts.
///
/// Alpha is never dropped silently: an image with transparency headed for a
/// format without alpha fails with [`ImageError::EncodingError`].
pub fn prepare_for(img: &DynamicImage, format: OutputFormat) -> Result<Cow<'_, DynamicImage>> {
    let alpha = has_alpha_channel(img);
    if alpha && !format.supports_alpha() {
        return Err(ImageError::EncodingError(format!(
            "cannot write mode {:?} as {:?}",
            img.color(),
            format
        )));
    }

    let eight_bit = img.color().bytes_per_pixel() == img.color().channel_count();
    let luma = img.color().channel_count() <= 2;

    let prepared = match format {
        OutputFormat::Jpeg if luma => convert(img, DynamicImage::ImageLuma8(img.to_luma8())),
        OutputFormat::Jpeg => convert(img, DynamicImage::ImageRgb8(img.to_rgb8())),
        OutputFormat::Gif => convert(img, DynamicImage::ImageRgba8(img.to_rgba8())),
        OutputFormat::Png if !is_float(img) => Cow::Borrowed(img),
        _ if eight_bit && !is_float(img) => Cow::Borrowed(img),
        _ if alpha => Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8())),
        _ => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
    };

    Ok(prepared)
}

fn convert(original: &DynamicImage, converted: DynamicImage) -> Cow<'_, DynamicImage> {
    if original.color() == converted.color() {
        Cow::Borrowed(original)
    } else {
        Cow::Owned(converted)
    }
}

fn is_float(img: &DynamicImage) -> bool {
    matches!(
        img,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)
    )
}
