//! Upstream storage access

use crate::config::StorageConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, instrument};

/// Status and body of one upstream GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw body, only meaningful when [`is_success`](Self::is_success)
    pub body: Bytes,
}

impl UpstreamResponse {
    /// A 200 response carrying `body`
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// A body-less response with `status`
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }

    /// Only 200 counts; every other status, 2xx included, is an upstream error.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Something that can GET an object by URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` once. Non-200 statuses are returned, not raised.
    async fn fetch(&self, url: &str) -> Result<UpstreamResponse, FetchError>;
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    inner: Client,
}

impl HttpFetcher {
    /// Build a client with the configured timeout and user agent.
    pub fn new(config: &StorageConfig) -> Result<Self, reqwest::Error> {
        let mut default_headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&config.user_agent) {
            default_headers.insert(USER_AGENT, value);
        }

        let inner = Client::builder()
            .timeout(config.timeout())
            .default_headers(default_headers)
            .build()?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> Result<UpstreamResponse, FetchError> {
        let response = self.inner.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, bytes = body.len(), "Upstream responded");
        Ok(UpstreamResponse { status, body })
    }
}

/// Join the storage base and an object path with exactly one `/`.
pub fn upstream_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
