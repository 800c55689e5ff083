//! Configuration for the pixfront proxy
//!
//! Values are resolved once at startup, in this order (later wins):
//! built-in defaults, a TOML file, `PIXFRONT_*` environment variables, and
//! finally whatever the caller sets with the `with_*` builders (CLI flags).

use crate::error::ConfigError;
use pixfront_image::{DEFAULT_MAX_OUTPUT_PIXELS, EncodeOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config files probed when no explicit path is given.
const CONFIG_CANDIDATES: &[&str] = &["pixfront.toml", ".pixfront.toml", ".config/pixfront.toml"];

/// Complete proxy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Listener settings
    pub server: ServerConfig,
    /// Object storage settings
    pub storage: StorageConfig,
    /// Encoder settings for transformed images
    pub transform: TransformConfig,
}

/// Where the HTTP listener binds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Object storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// URL prefix every request path is appended to
    pub base_url: String,
    /// Whole-request timeout for a single upstream fetch
    pub timeout_secs: u64,
    /// User agent sent to the storage backend
    pub user_agent: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9000".to_string(),
            timeout_secs: 30,
            user_agent: format!("pixfront/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl StorageConfig {
    /// Upstream timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Best PNG compression instead of the default level
    pub optimize: bool,
    /// Largest result, in pixels, a single request may produce
    pub max_output_pixels: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        let defaults = EncodeOptions::default();
        Self {
            jpeg_quality: defaults.jpeg_quality,
            optimize: defaults.optimize,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }
}

impl TransformConfig {
    /// Options handed to the encoder.
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            jpeg_quality: self.jpeg_quality,
            optimize: self.optimize,
        }
    }
}

impl ProxyConfig {
    /// Load configuration from a file (explicit or discovered), apply
    /// environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(find_config_file);

        let config = match path {
            Some(ref p) => Self::from_file(p)?,
            None => Self::default(),
        };

        let config = config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without applying overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `PIXFRONT_*` overrides read through `lookup`.
    ///
    /// - `PIXFRONT_HOST`: bind host
    /// - `PIXFRONT_PORT`: bind port
    /// - `PIXFRONT_STORAGE_BASE`: storage URL prefix
    /// - `PIXFRONT_TIMEOUT_SECS`: upstream timeout in seconds
    /// - `PIXFRONT_MAX_OUTPUT_PIXELS`: pixel budget per transform
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("PIXFRONT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PIXFRONT_PORT") {
            self.server.port = parse_env("PIXFRONT_PORT", &port)?;
        }
        if let Some(base) = lookup("PIXFRONT_STORAGE_BASE") {
            self.storage.base_url = base;
        }
        if let Some(secs) = lookup("PIXFRONT_TIMEOUT_SECS") {
            self.storage.timeout_secs = parse_env("PIXFRONT_TIMEOUT_SECS", &secs)?;
        }
        if let Some(pixels) = lookup("PIXFRONT_MAX_OUTPUT_PIXELS") {
            self.transform.max_output_pixels = parse_env("PIXFRONT_MAX_OUTPUT_PIXELS", &pixels)?;
        }
        Ok(self)
    }

    /// Builder-style method to set the bind host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.server.host = host.into();
        self
    }

    /// Builder-style method to set the bind port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Builder-style method to set the storage URL prefix
    #[must_use]
    pub fn with_storage_base(mut self, base_url: impl Into<String>) -> Self {
        self.storage.base_url = base_url.into();
        self
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = &self.storage.base_url;
        if base.is_empty() {
            return Err(ConfigError::Validation("storage.base_url cannot be empty".into()));
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(ConfigError::Validation(
                "storage.base_url must start with http:// or https://".into(),
            ));
        }
        if self.storage.timeout_secs == 0 {
            return Err(ConfigError::Validation("storage.timeout_secs cannot be zero".into()));
        }
        if !(1..=100).contains(&self.transform.jpeg_quality) {
            return Err(ConfigError::Validation("transform.jpeg_quality must be 1-100".into()));
        }
        if self.transform.max_output_pixels == 0 {
            return Err(ConfigError::Validation(
                "transform.max_output_pixels cannot be zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}
