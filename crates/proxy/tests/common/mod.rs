//! Shared fixtures for the HTTP tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use pixfront_proxy::{FetchError, Fetcher, Pipeline, ProxyConfig, UpstreamResponse, router};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

pub const STORAGE_BASE: &str = "http://storage.test:9000";

/// In-memory storage keyed by full upstream URL.
#[derive(Default)]
pub struct StubFetcher {
    objects: HashMap<String, UpstreamResponse>,
    unreachable: bool,
    requested: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that refuses every connection.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_object(mut self, path: &str, body: Vec<u8>) -> Self {
        self.objects
            .insert(format!("{STORAGE_BASE}/{path}"), UpstreamResponse::ok(body));
        self
    }

    pub fn with_status(mut self, path: &str, status: u16) -> Self {
        self.objects
            .insert(format!("{STORAGE_BASE}/{path}"), UpstreamResponse::status(status));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<UpstreamResponse, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.unreachable {
            return Err(FetchError::Unavailable("connection refused".into()));
        }
        Ok(self
            .objects
            .get(url)
            .cloned()
            .unwrap_or_else(|| UpstreamResponse::status(404)))
    }
}

pub fn app(fetcher: StubFetcher) -> (Router, Arc<StubFetcher>) {
    let fetcher = Arc::new(fetcher);
    let config = ProxyConfig::default().with_storage_base(STORAGE_BASE);
    let pipeline = Arc::new(Pipeline::new(&config, fetcher.clone()));
    (router(pipeline), fetcher)
}

/// Opaque RGB image with a left-to-right gradient.
pub fn rgb_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

/// Half transparent RGBA image.
pub fn rgba_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 128])))
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(&rgb_image(width, height), ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&rgb_image(width, height), ImageFormat::Jpeg)
}
