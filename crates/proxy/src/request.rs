//! Request parsing and the passthrough/transform decision.

use crate::error::ProxyError;
use pixfront_image::{Dimensions, DynamicImage, ImageError, Transform, declared_extension};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Raw query string of an image request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransformQuery {
    /// `max` or `crop`
    pub mode: Option<String>,
    /// Target width in pixels
    pub width: Option<i64>,
    /// Target height in pixels
    pub height: Option<i64>,
}

/// Supported transform modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `max`: fit inside the box
    Fit,
    /// `crop`: exact size from the center
    CenterCrop,
}

impl Mode {
    /// Query value for this mode
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Fit => "max",
            Mode::CenterCrop => "crop",
        }
    }

    /// Engine transform backing this mode
    pub fn transform(self) -> Transform {
        match self {
            Mode::Fit => Transform::Fit,
            Mode::CenterCrop => Transform::CenterCrop,
        }
    }
}

impl FromStr for Mode {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Mode::Fit),
            "crop" => Ok(Mode::CenterCrop),
            _ => Err(ProxyError::client("Unsupported mode")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One incoming request: the object path plus its optional query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Object key relative to the storage base
    pub path: String,
    /// Requested mode, unvalidated
    pub mode: Option<String>,
    /// Requested width, unvalidated
    pub width: Option<i64>,
    /// Requested height, unvalidated
    pub height: Option<i64>,
}

impl RequestDescriptor {
    /// Build a descriptor from a path and its parsed query.
    pub fn new(path: impl Into<String>, query: TransformQuery) -> Self {
        Self {
            path: path.into(),
            mode: query.mode,
            width: query.width,
            height: query.height,
        }
    }

    /// Descriptor with no query at all.
    pub fn passthrough(path: impl Into<String>) -> Self {
        Self::new(path, TransformQuery::default())
    }

    /// Lower-cased extension of the requested path.
    pub fn declared_extension(&self) -> String {
        declared_extension(&self.path)
    }

    /// Decide what to do with the fetched bytes.
    ///
    /// `None` means passthrough. An absent or empty mode always passes
    /// through, whatever dimensions were sent along.
    pub fn plan(&self) -> Result<Option<TransformPlan>, ProxyError> {
        let mode = match self.mode.as_deref() {
            None | Some("") => return Ok(None),
            Some(mode) => mode,
        };

        let (Some(width), Some(height)) = (self.width, self.height) else {
            return Err(ProxyError::client("Width and height are required with mode"));
        };

        Ok(Some(TransformPlan {
            mode: mode.parse()?,
            width,
            height,
        }))
    }
}

/// A validated transform request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformPlan {
    /// Transform to run
    pub mode: Mode,
    /// Requested width
    pub width: i64,
    /// Requested height
    pub height: i64,
}

impl TransformPlan {
    /// Target size for `img`.
    ///
    /// Fails with `InvalidDimensions` when a side is not a positive `u32`,
    /// and with `TooLarge` when the image this plan would produce holds
    /// more than `max_pixels` pixels.
    pub fn target_for(
        &self,
        img: &DynamicImage,
        max_pixels: u64,
    ) -> Result<Dimensions, ImageError> {
        let target = match (u32::try_from(self.width), u32::try_from(self.height)) {
            (Ok(width), Ok(height)) if width > 0 && height > 0 => Dimensions::new(width, height),
            _ => {
                return Err(ImageError::invalid_dimensions(
                    (img.width(), img.height()),
                    (self.width, self.height),
                ));
            }
        };

        let source = Dimensions::new(img.width(), img.height());
        self.mode.transform().output_size(source, target).ensure_within(max_pixels)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = pixfront_image::DEFAULT_MAX_OUTPUT_PIXELS;

    fn descriptor(mode: Option<&str>, width: Option<i64>, height: Option<i64>) -> RequestDescriptor {
        RequestDescriptor::new(
            "bucket/photo.jpg",
            TransformQuery {
                mode: mode.map(str::to_string),
                width,
                height,
            },
        )
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("max".parse::<Mode>().unwrap(), Mode::Fit);
        assert_eq!("crop".parse::<Mode>().unwrap(), Mode::CenterCrop);
        assert!("MAX".parse::<Mode>().is_err());
        assert_eq!(Mode::CenterCrop.to_string(), "crop");
        assert_eq!(Mode::Fit.transform(), Transform::Fit);
    }

    #[test]
    fn test_no_query_is_passthrough() {
        let req = RequestDescriptor::passthrough("bucket/photo.jpg");
        assert_eq!(req.plan().unwrap(), None);
        assert_eq!(req.declared_extension(), "jpg");
    }

    #[test]
    fn test_dimensions_without_mode_pass_through() {
        assert_eq!(descriptor(None, Some(10), Some(10)).plan().unwrap(), None);
        assert_eq!(descriptor(Some(""), Some(10), None).plan().unwrap(), None);
    }

    #[test]
    fn test_mode_without_both_dimensions() {
        for req in [
            descriptor(Some("max"), Some(10), None),
            descriptor(Some("crop"), None, Some(10)),
            descriptor(Some("max"), None, None),
        ] {
            let err = req.plan().unwrap_err();
            assert!(matches!(err, ProxyError::Client(ref msg) if msg.contains("required")));
        }
    }

    #[test]
    fn test_unsupported_mode() {
        let err = descriptor(Some("unknown_mode"), Some(10), Some(10)).plan().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported mode");
    }

    #[test]
    fn test_missing_dimensions_checked_before_mode() {
        let err = descriptor(Some("unknown_mode"), Some(10), None).plan().unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_valid_plan() {
        let plan = descriptor(Some("crop"), Some(100), Some(50)).plan().unwrap().unwrap();
        assert_eq!(
            plan,
            TransformPlan {
                mode: Mode::CenterCrop,
                width: 100,
                height: 50
            }
        );
    }

    #[test]
    fn test_target_for_rejects_non_positive() {
        let img = DynamicImage::new_rgb8(4, 4);
        let plan = |width, height| TransformPlan {
            mode: Mode::Fit,
            width,
            height,
        };

        assert_eq!(plan(3, 2).target_for(&img, LIMIT).unwrap(), Dimensions::new(3, 2));
        for (w, h) in [(0, 2), (2, -1), (i64::from(u32::MAX) + 1, 2)] {
            let err = plan(w, h).target_for(&img, LIMIT).unwrap_err();
            assert!(matches!(
                err,
                ImageError::InvalidDimensions { target_width, target_height, .. }
                    if target_width == w && target_height == h
            ));
        }
    }

    #[test]
    fn test_target_for_enforces_pixel_budget() {
        let img = DynamicImage::new_rgb8(2, 2);
        let huge = i64::from(u32::MAX);

        let err = TransformPlan { mode: Mode::CenterCrop, width: huge, height: huge }
            .target_for(&img, LIMIT)
            .unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { limit: LIMIT, .. }));

        let crop = TransformPlan { mode: Mode::CenterCrop, width: 4000, height: 10 };
        assert!(crop.target_for(&img, 40_000).is_ok());
        assert!(crop.target_for(&img, 39_999).is_err());
    }

    #[test]
    fn test_fit_budget_uses_fitted_size() {
        // A 2x2 source fitted into 4000x10 comes out 10x10.
        let img = DynamicImage::new_rgb8(2, 2);
        let plan = TransformPlan { mode: Mode::Fit, width: 4000, height: 10 };
        assert_eq!(plan.target_for(&img, 100).unwrap(), Dimensions::new(4000, 10));
        assert!(matches!(
            plan.target_for(&img, 99),
            Err(ImageError::TooLarge { width: 10, height: 10, limit: 99 })
        ));
    }
}
