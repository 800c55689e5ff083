//! pixfront: image transformation proxy for object storage.

mod output;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use output::{Status, format_size};
use pixfront_image::{
    DEFAULT_MAX_OUTPUT_PIXELS, EncodeOptions, OutputFormat, canonical_extension,
    declared_extension, decode, detect_format, sniff_signature,
};
use pixfront_proxy::{ProxyConfig, TransformPlan, shutdown_signal};
use pixfront_telemetry::TelemetryConfig;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pixfront")]
#[command(about = "Resize and crop images on the fly in front of object storage")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP proxy
    Serve {
        /// Config file (defaults to pixfront.toml in the usual places)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Bind host
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,
        /// Storage URL prefix
        #[arg(long)]
        storage_base: Option<String>,
        /// Log level
        #[arg(long, default_value = "info", env = "PIXFRONT_LOG")]
        log_level: String,
        /// Log as JSON lines
        #[arg(long)]
        json_logs: bool,
    },
    /// Detect image format from file
    Detect {
        /// Path to image file
        path: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply a transform to a local file
    Transform {
        /// Source image
        input: PathBuf,
        /// `max` or `crop`
        #[arg(short, long)]
        mode: String,
        /// Target width
        #[arg(short = 'W', long)]
        width: i64,
        /// Target height
        #[arg(short = 'H', long)]
        height: i64,
        /// Output file; its extension picks the format
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// JPEG quality (1-100)
        #[arg(long, default_value_t = 75)]
        quality: u8,
        /// Refuse results with more pixels than this
        #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_PIXELS)]
        max_pixels: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            storage_base,
            log_level,
            json_logs,
        } => {
            pixfront_telemetry::init_with_config(
                TelemetryConfig::default()
                    .with_level(log_level)
                    .with_json(json_logs),
            )?;

            let mut proxy_config = ProxyConfig::load(config.as_deref())?;
            if let Some(host) = host {
                proxy_config = proxy_config.with_host(host);
            }
            if let Some(port) = port {
                proxy_config = proxy_config.with_port(port);
            }
            if let Some(base) = storage_base {
                proxy_config = proxy_config.with_storage_base(base);
            }

            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(pixfront_proxy::serve(proxy_config, shutdown_signal()))?;
        }

        Commands::Detect { path, json } => {
            let data = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let declared = declared_extension(&path.to_string_lossy());

            match detect_format(&data) {
                Ok(format) => {
                    if json {
                        let report = serde_json::json!({
                            "path": path.to_string_lossy(),
                            "format": format,
                            "mime": format.mime_type(),
                            "extensions": format.extensions(),
                            "declared_extension": declared,
                            "size_bytes": data.len(),
                        });
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        Status::header(&path.display().to_string());
                        Status::field("Format", format.name());
                        Status::field("MIME", format.mime_type());
                        Status::field("Extensions", &format.extensions().join(", "));
                        Status::field("Declared", &declared);
                        Status::field("Size", &format_size(data.len() as u64));
                    }
                }
                Err(e) => {
                    Status::error(&format!("{}: {}", path.display(), e));
                    std::process::exit(1);
                }
            }
        }

        Commands::Transform {
            input,
            mode,
            width,
            height,
            output,
            quality,
            max_pixels,
        } => {
            let output = output.unwrap_or_else(|| default_output(&input, &mode, width, height));
            let plan = TransformPlan {
                mode: mode.parse()?,
                width,
                height,
            };
            let written = transform_file(&input, &output, &plan, quality, max_pixels)?;
            Status::success(&format!(
                "{} -> {} ({})",
                input.display(),
                output.display(),
                format_size(written)
            ));
        }
    }

    Ok(())
}

/// Transform `input` into `output`; returns the number of bytes written.
fn transform_file(
    input: &Path,
    output: &Path,
    plan: &TransformPlan,
    quality: u8,
    max_pixels: u64,
) -> anyhow::Result<u64> {
    if !(1..=100).contains(&quality) {
        bail!("Quality must be 1-100, got {quality}");
    }

    let data =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let extension = declared_extension(&output.to_string_lossy());
    let format = OutputFormat::from_canonical(canonical_extension(&extension))
        .with_context(|| format!("Cannot encode to {}", output.display()))?;

    let img = decode(&data).with_context(|| {
        format!(
            "Failed to decode {} ({})",
            input.display(),
            sniff_signature(&data)
        )
    })?;
    let target = plan.target_for(&img, max_pixels)?;
    let options = EncodeOptions {
        jpeg_quality: quality,
        ..EncodeOptions::default()
    };
    let bytes = plan.mode.transform().apply(&img, target, format, &options)?;

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(bytes.len() as u64)
}

/// `photo.jpg` -> `photo.crop-100x100.jpg` next to the input.
fn default_output(input: &Path, mode: &str, width: i64, height: i64) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{stem}.{mode}-{width}x{height}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{mode}-{width}x{height}"),
    };
    input.with_file_name(name)
}
