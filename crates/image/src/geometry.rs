//! Pixel geometry for the fit and center-crop transforms.
//!
//! All calculations are pure and integer-exact, so the limiting side of a
//! fit always lands on its target without floating point drift.

use crate::{ImageError, Result};
use serde::{Deserialize, Serialize};

/// Default ceiling on the pixel count of a single transform result (4096x4096).
pub const DEFAULT_MAX_OUTPUT_PIXELS: u64 = 16_777_216;

/// A positive `(width, height)` pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Dimensions {
    /// Create a new pair.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both sides are non-zero.
    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Total pixel count.
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Pass `self` through unless it holds more than `max_pixels` pixels.
    pub fn ensure_within(self, max_pixels: u64) -> Result<Self> {
        if self.pixels() > max_pixels {
            return Err(ImageError::TooLarge {
                width: self.width,
                height: self.height,
                limit: max_pixels,
            });
        }
        Ok(self)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Rectangle cut out of the source before resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width of the strip
    pub width: u32,
    /// Height of the strip
    pub height: u32,
}

/// Largest size with the source aspect ratio that fits inside `target`.
///
/// Uses `ratio = min(tw/ow, th/oh)` and floors both sides, never going
/// below 1x1. Both inputs must be positive.
///
/// # Example
/// ```
/// use pixfront_image::{Dimensions, fit_dimensions};
///
/// let out = fit_dimensions(Dimensions::new(400, 300), Dimensions::new(200, 200));
/// assert_eq!(out, Dimensions::new(200, 150));
/// ```
pub fn fit_dimensions(original: Dimensions, target: Dimensions) -> Dimensions {
    let (ow, oh) = (u64::from(original.width), u64::from(original.height));
    let (tw, th) = (u64::from(target.width), u64::from(target.height));

    // tw/ow <= th/oh  <=>  tw*oh <= th*ow
    let (width, height) = if tw * oh <= th * ow {
        (tw, oh * tw / ow)
    } else {
        (ow * th / oh, th)
    };

    Dimensions {
        width: clamp_side(width),
        height: clamp_side(height),
    }
}

/// Region of `original` with the aspect ratio of `target`, centered.
///
/// When the source is at least as wide as the target aspect, the full
/// height is kept and a vertical strip is cut from the middle; otherwise
/// the full width is kept and a horizontal strip is cut. Both edges of the
/// strip sit on the half-pixel center rounded half to even, so an odd
/// margin splits toward the even offset.
///
/// # Example
/// ```
/// use pixfront_image::{CropRect, Dimensions, center_crop_rect};
///
/// let rect = center_crop_rect(Dimensions::new(400, 300), Dimensions::new(100, 100));
/// assert_eq!(rect, CropRect { x: 50, y: 0, width: 300, height: 300 });
/// ```
pub fn center_crop_rect(original: Dimensions, target: Dimensions) -> CropRect {
    let (ow, oh) = (u64::from(original.width), u64::from(original.height));
    let (tw, th) = (u64::from(target.width), u64::from(target.height));

    // ow/oh >= tw/th  <=>  ow*th >= tw*oh
    if ow * th >= tw * oh {
        let (x, width) = centered_span(ow, (oh * tw / th).clamp(1, ow));
        CropRect {
            x,
            y: 0,
            width,
            height: original.height,
        }
    } else {
        let (y, height) = centered_span(oh, (ow * th / tw).clamp(1, oh));
        CropRect {
            x: 0,
            y,
            width: original.width,
            height,
        }
    }
}

/// `(start, len)` of a `span`-long run centered in `full`.
fn centered_span(full: u64, span: u64) -> (u32, u32) {
    let start = half_to_even(full - span);
    let end = half_to_even(full + span);
    (start as u32, (end - start) as u32)
}

/// `twice / 2`, ties rounded to the even neighbour.
fn half_to_even(twice: u64) -> u64 {
    let half = twice / 2;
    if twice % 2 == 1 && half % 2 == 1 { half + 1 } else { half }
}

fn clamp_side(value: u64) -> u32 {
    u32::try_from(value.max(1)).unwrap_or(u32::MAX)
}
