//! Per-request pipeline: fetch, decide, transform, respond.

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::fetch::{Fetcher, upstream_url};
use crate::request::{RequestDescriptor, TransformPlan};
use bytes::Bytes;
use pixfront_image::{
    EncodeOptions, ImageError, OutputFormat, canonical_extension, decode, sniff_signature,
};
use std::sync::Arc;
use tracing::debug;

/// How a successful response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream bytes returned unchanged
    Passthrough,
    /// Image was resampled and re-encoded
    Transformed,
}

impl Outcome {
    /// Label used in request logs
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Passthrough => "passthrough",
            Outcome::Transformed => "transformed",
        }
    }
}

/// Response body and its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Encoded image
    pub bytes: Bytes,
    /// Value of the `Content-Type` header
    pub content_type: String,
    /// Which path produced the bytes
    pub outcome: Outcome,
}

/// Stateless request pipeline shared by all connections.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    storage_base: String,
    encode: EncodeOptions,
    max_pixels: u64,
}

impl Pipeline {
    /// Build a pipeline from configuration and a fetcher.
    pub fn new(config: &ProxyConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            storage_base: config.storage.base_url.clone(),
            encode: config.transform.encode_options(),
            max_pixels: config.transform.max_output_pixels,
        }
    }

    /// Storage URL prefix requests are resolved against
    pub fn storage_base(&self) -> &str {
        &self.storage_base
    }

    /// Run one request to completion.
    pub async fn handle(&self, request: &RequestDescriptor) -> Result<TransformResult, ProxyError> {
        let url = upstream_url(&self.storage_base, &request.path);
        let upstream = self.fetcher.fetch(&url).await?;
        if !upstream.is_success() {
            debug!(%url, status = upstream.status, "Upstream returned non-200");
            return Err(ProxyError::Upstream {
                status: upstream.status,
            });
        }

        let Some(plan) = request.plan()? else {
            return Ok(TransformResult {
                content_type: format!("image/{}", sniff_signature(&upstream.body)),
                bytes: upstream.body,
                outcome: Outcome::Passthrough,
            });
        };

        let extension = request.declared_extension();
        let options = self.encode;
        let max_pixels = self.max_pixels;
        let body = upstream.body;
        let ext = extension.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            render(&body, &plan, &ext, &options, max_pixels)
        })
            .await
            .map_err(|e| ProxyError::Internal(e.to_string()))??;

        Ok(TransformResult {
            bytes: Bytes::from(encoded),
            content_type: format!("image/{extension}"),
            outcome: Outcome::Transformed,
        })
    }
}

/// Decode `data`, apply `plan` and encode for the declared `extension`.
///
/// Results larger than `max_pixels` are refused before any resampling.
/// CPU bound; callers on the async runtime should run it on a blocking thread.
pub fn render(
    data: &[u8],
    plan: &TransformPlan,
    extension: &str,
    options: &EncodeOptions,
    max_pixels: u64,
) -> Result<Vec<u8>, ImageError> {
    let img = decode(data)?;
    let target = plan.target_for(&img, max_pixels)?;
    let format = OutputFormat::from_canonical(canonical_extension(extension))?;
    plan.mode.transform().apply(&img, target, format, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::UpstreamResponse;
    use crate::request::{Mode, TransformQuery};
    use async_trait::async_trait;
    use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
    use pixfront_image::DEFAULT_MAX_OUTPUT_PIXELS;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Returns one canned response and records the requested URLs.
    struct OneShot {
        response: UpstreamResponse,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Fetcher for OneShot {
        async fn fetch(&self, url: &str) -> Result<UpstreamResponse, FetchError> {
            self.seen.lock().unwrap().push(url.to_string());
            Ok(self.response.clone())
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn pipeline(response: UpstreamResponse) -> (Pipeline, Arc<OneShot>) {
        let fetcher = Arc::new(OneShot {
            response,
            seen: Mutex::new(Vec::new()),
        });
        let config = ProxyConfig::default().with_storage_base("http://storage:9000/");
        (Pipeline::new(&config, fetcher.clone()), fetcher)
    }

    fn query(mode: &str, width: i64, height: i64) -> TransformQuery {
        TransformQuery {
            mode: Some(mode.to_string()),
            width: Some(width),
            height: Some(height),
        }
    }

    #[tokio::test]
    async fn test_passthrough_uses_sniffed_type() {
        let body = png(4, 4);
        let (pipeline, fetcher) = pipeline(UpstreamResponse::ok(body.clone()));

        let result = pipeline
            .handle(&RequestDescriptor::passthrough("b/photo.jpg"))
            .await
            .unwrap();

        assert_eq!(result.outcome, Outcome::Passthrough);
        assert_eq!(result.content_type, "image/png");
        assert_eq!(result.bytes.as_ref(), body.as_slice());
        assert_eq!(
            fetcher.seen.lock().unwrap().as_slice(),
            ["http://storage:9000/b/photo.jpg"]
        );
    }

    #[tokio::test]
    async fn test_upstream_status_wins_over_validation() {
        let (pipeline, _) = pipeline(UpstreamResponse::status(404));
        let request = RequestDescriptor::new("b/x.png", query("unknown_mode", 1, 1));
        let err = pipeline.handle(&request).await.unwrap_err();
        assert!(matches!(err, ProxyError::Upstream { status: 404 }));
    }

    #[tokio::test]
    async fn test_transform_reports_declared_extension() {
        let (pipeline, _) = pipeline(UpstreamResponse::ok(png(40, 20)));
        let request = RequestDescriptor::new("b/photo.JPG", query("max", 10, 10));

        let result = pipeline.handle(&request).await.unwrap();
        assert_eq!(result.outcome, Outcome::Transformed);
        assert_eq!(result.content_type, "image/jpg");
        assert_eq!(sniff_signature(&result.bytes), "jpeg");
    }

    #[test]
    fn test_render_crop_exact() {
        let plan = TransformPlan {
            mode: Mode::CenterCrop,
            width: 100,
            height: 100,
        };
        let options = EncodeOptions::default();
        let out = render(&png(400, 300), &plan, "png", &options, DEFAULT_MAX_OUTPUT_PIXELS).unwrap();
        assert_eq!(decode(&out).unwrap().dimensions(), (100, 100));
    }

    #[test]
    fn test_render_unknown_extension() {
        let plan = TransformPlan {
            mode: Mode::Fit,
            width: 10,
            height: 10,
        };
        let options = EncodeOptions::default();
        let err =
            render(&png(20, 20), &plan, "unknown", &options, DEFAULT_MAX_OUTPUT_PIXELS).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_render_zero_width() {
        let plan = TransformPlan {
            mode: Mode::Fit,
            width: 0,
            height: 10,
        };
        let options = EncodeOptions::default();
        let err = render(&png(20, 20), &plan, "png", &options, DEFAULT_MAX_OUTPUT_PIXELS).unwrap_err();
        assert!(matches!(err, ImageError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_render_over_budget() {
        let plan = TransformPlan {
            mode: Mode::CenterCrop,
            width: 64,
            height: 64,
        };
        let options = EncodeOptions::default();
        assert!(render(&png(8, 8), &plan, "png", &options, 4096).is_ok());

        let err = render(&png(8, 8), &plan, "png", &options, 4095).unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { width: 64, height: 64, limit: 4095 }));
    }

    #[tokio::test]
    async fn test_pipeline_uses_configured_budget() {
        let fetcher = Arc::new(OneShot {
            response: UpstreamResponse::ok(png(8, 8)),
            seen: Mutex::new(Vec::new()),
        });
        let mut config = ProxyConfig::default();
        config.transform.max_output_pixels = 100;
        let pipeline = Pipeline::new(&config, fetcher);

        let small = RequestDescriptor::new("b/x.png", query("crop", 10, 10));
        assert!(pipeline.handle(&small).await.is_ok());

        let large = RequestDescriptor::new("b/x.png", query("crop", 11, 10));
        let err = pipeline.handle(&large).await.unwrap_err();
        assert!(err.to_string().contains("exceeds the limit of 100 pixels"), "{err}");
    }
}
