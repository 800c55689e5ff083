//! Error types for the proxy

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pixfront_image::ImageError;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Detail reported for any non-200 answer from storage.
pub const NOT_FOUND_DETAIL: &str = "Image not found";

/// Detail reported when storage could not be reached at all.
pub const FETCH_FAILED_DETAIL: &str = "Failed to fetch image from storage";

/// Terminal failure states of a single proxied request.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Storage answered with something other than 200
    #[error("Image not found")]
    Upstream {
        /// Status code returned by storage, propagated verbatim
        status: u16,
    },

    /// Invalid combination of query parameters
    #[error("{0}")]
    Client(String),

    /// Query parameter could not be parsed at all
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Decoding, resampling or encoding failed
    #[error("An error occurred while processing the image file: {0}")]
    Processing(#[from] ImageError),

    /// Storage could not be reached
    #[error("Failed to fetch image from storage")]
    Fetch(#[from] FetchError),

    /// The blocking transform task died
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Create a client error
    pub fn client(msg: impl Into<String>) -> Self {
        Self::Client(msg.into())
    }

    /// HTTP status the error is reported with.
    ///
    /// Client errors share 500 with processing errors; callers of the
    /// proxy rely on that.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Upstream { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::InvalidQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Fetch(_) => StatusCode::BAD_GATEWAY,
            Self::Client(_) | Self::Processing(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label used in request logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream { .. } => "upstream",
            Self::Client(_) => "client",
            Self::InvalidQuery(_) => "invalid_query",
            Self::Processing(_) => "processing",
            Self::Fetch(_) => "fetch",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// Transport failures talking to storage.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Storage is unreachable for some other reason
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Parser error
        source: toml::de::Error,
    },

    /// Environment override could not be parsed
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name
        var: String,
        /// Raw value
        value: String,
    },

    /// Values parsed but are not usable
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Startup failures of the HTTP server.
#[derive(Error, Debug)]
pub enum ServeError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The storage client could not be built
    #[error("Failed to build storage client: {0}")]
    Client(#[from] reqwest::Error),

    /// The listener could not bind
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The server loop stopped with an I/O error
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
