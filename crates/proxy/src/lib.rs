//! On-demand image transformation proxy.
//!
//! Sits in front of an object store and serves
//! `GET /{path}?mode={max|crop}&width=&height=`. Without a mode the stored
//! bytes are returned untouched; with one, the image is resized (`max`) or
//! center-cropped to an exact size (`crop`) and re-encoded in the format
//! named by the path extension.
//!
//! ```no_run
//! use pixfront_proxy::{ProxyConfig, serve, shutdown_signal};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProxyConfig::load(None)?;
//! serve(config, shutdown_signal()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod request;
pub mod server;

pub use config::{ProxyConfig, ServerConfig, StorageConfig, TransformConfig};
pub use error::{ConfigError, FetchError, ProxyError, ServeError};
pub use fetch::{Fetcher, HttpFetcher, UpstreamResponse, upstream_url};
pub use pipeline::{Outcome, Pipeline, TransformResult, render};
pub use request::{Mode, RequestDescriptor, TransformPlan, TransformQuery};
pub use server::{router, serve, serve_on, shutdown_signal};
