//! Logging setup for pixfront
//!
//! Installs a global `tracing` subscriber with an `EnvFilter`. `RUST_LOG`
//! always wins over the configured level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber described by `config`.
///
/// Fails if a global subscriber is already set.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let json = config.json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number)
    });
    let compact = (!config.json).then(|| {
        fmt::layer()
            .compact()
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number)
    });

    tracing_subscriber::registry()
        .with(build_filter(&config))
        .with(json)
        .with(compact)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.log_level,
        json = config.json,
        "Logging initialized"
    );

    Ok(())
}

/// `RUST_LOG` if set and valid, otherwise the configured directives.
fn build_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()))
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default level when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
    /// Include the event target
    pub show_target: bool,
    /// Include thread ids
    pub show_thread_ids: bool,
    /// Include the source file
    pub show_file: bool,
    /// Include the source line
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

impl TelemetryConfig {
    /// Filter directives: the configured level, with per-request HTTP spans
    /// kept at the same level as our own events.
    pub fn directives(&self) -> String {
        format!("{level},tower_http={level}", level = self.log_level)
    }

    /// Builder-style method to set the level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Builder-style method to switch to JSON lines
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}
