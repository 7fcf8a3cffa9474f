//! Silhouette CLI Tool
//!
//! Command-line frontend for the pipeline controller: one upload, optional
//! background removal, one PNG export.

use super::config::CliConfigBuilder;
use super::progress::IndicatifProgressReporter;
use crate::{
    config::DEFAULT_DOWNLOAD_NAME,
    controller::{Dispatch, PipelineCommand, PipelineController},
    services::{ImageIOService, ProgressReporter},
    tracing_config::{init_cli_tracing, spans, TracingFormat},
    types::{ImageUpload, OCTET_STREAM},
};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::{debug, Instrument};

/// Silhouette generator CLI tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "imgly-silhouette")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input image file (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Output PNG file. Use "-" for stdout.
    #[arg(short, long, value_name = "OUTPUT", default_value = DEFAULT_DOWNLOAD_NAME)]
    pub output: String,

    /// Silhouette color as hex, with or without the leading '#'
    #[arg(short, long, default_value = "#000000")]
    pub color: String,

    /// Remove the background before generating the silhouette
    #[arg(short, long)]
    pub remove_background: bool,

    /// Background removal service endpoint
    #[arg(long, env = "IMGLY_SILHOUETTE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the background removal service
    #[arg(long, env = "IMGLY_SILHOUETTE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print the final pipeline state as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Compact log output without colors
    #[arg(long)]
    pub compact: bool,

    /// JSON log output on stderr (requires the tracing-json feature)
    #[arg(long, conflicts_with = "compact")]
    pub log_json: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose, log_format(&cli)).context("Failed to initialize tracing")?;

    // Validate CLI arguments
    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;
    let remover = CliConfigBuilder::remover(&cli)?;

    info!("Input: {}", cli.input);
    debug!(
        color = %config.default_color,
        remove_background = config.remove_background,
        remover = %remover.name(),
        "Configuration ready"
    );

    let progress = Arc::new(IndicatifProgressReporter::new(
        cli.verbose == 0 && io::stderr().is_terminal(),
    ));
    let reporter: Arc<dyn ProgressReporter> = progress.clone();
    let mut controller = PipelineController::with_reporter(config, remover, reporter)
        .context("Failed to create pipeline controller")?;

    let start_time = Instant::now();
    let span = spans::silhouette_run(Path::new(&cli.input), cli.remove_background);
    let result = run(&cli, &mut controller).instrument(span).await;
    progress.finish();
    result?;

    info!(
        "Generated silhouette in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    if cli.json {
        let snapshot = serde_json::to_string_pretty(&controller.snapshot())
            .context("Failed to serialize pipeline state")?;
        println!("{}", snapshot);
    }

    Ok(())
}

/// Log output format selected by the flags
fn log_format(cli: &Cli) -> TracingFormat {
    #[cfg(feature = "tracing-json")]
    if cli.log_json {
        return TracingFormat::Json;
    }

    if cli.compact {
        TracingFormat::Compact
    } else {
        TracingFormat::Console
    }
}

/// Upload, render and export one input
async fn run(cli: &Cli, controller: &mut PipelineController) -> Result<()> {
    let upload = read_input(&cli.input).await?;

    match controller
        .handle(PipelineCommand::Upload(upload))
        .await
        .with_context(|| format!("Failed to generate silhouette for {}", cli.input))?
    {
        Dispatch::RenderedFromOriginal { error } => {
            warn!("Background removal failed, using the original image: {}", error);
        },
        Dispatch::Rendered => {},
        other => debug!(?other, "Unexpected upload outcome"),
    }

    export(controller, &cli.output)
}

/// Write the current silhouette to a file or stdout
fn export(controller: &PipelineController, output: &str) -> Result<()> {
    let _guard = spans::export(Path::new(output)).entered();

    if output == "-" {
        let download = controller.download().context("Failed to encode silhouette")?;
        return write_stdout(&download.bytes);
    }

    controller
        .save_png(output)
        .with_context(|| format!("Failed to save {}", output))?;
    info!("Saved {}", output);
    Ok(())
}

/// Read the input file or stdin into an upload
async fn read_input(input: &str) -> Result<ImageUpload> {
    if input != "-" {
        return ImageIOService::read_upload(input)
            .await
            .with_context(|| format!("Failed to read {}", input));
    }

    info!("Reading image from stdin");
    let mut bytes = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut bytes)
        .await
        .context("Failed to read image data from stdin")?;
    if bytes.is_empty() {
        anyhow::bail!("No data received from stdin");
    }

    let media_type = detect_media_type(&bytes);
    if media_type == OCTET_STREAM {
        warn!("Could not detect image format from stdin data");
    }
    Ok(ImageUpload::new(bytes, media_type).with_file_name("stdin"))
}

/// Declared media type for data without a file name, from its magic bytes
fn detect_media_type(data: &[u8]) -> &'static str {
    image::guess_format(data).map_or(OCTET_STREAM, |format| format.to_mime_type())
}

/// Write data to stdout
fn write_stdout(data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(data)
        .context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
