//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::{
    color::normalize_hex_input,
    config::{HttpRemoverConfig, PipelineConfig, DEFAULT_DOWNLOAD_NAME},
    removal::{BackgroundRemover, HttpBackgroundRemover, UnavailableRemover},
};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Convert CLI arguments to pipeline configuration and a remover
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build `PipelineConfig` from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<PipelineConfig> {
        let color = normalize_hex_input(&cli.color).context("Invalid --color value")?;

        PipelineConfig::builder()
            .default_color(color)
            .remove_background(cli.remove_background)
            .download_file_name(Self::download_name(&cli.output))
            .build()
            .context("Invalid configuration")
    }

    /// Background remover selected by the flags
    ///
    /// Without `--remove-background` no service is contacted at all.
    pub(crate) fn remover(cli: &Cli) -> Result<Arc<dyn BackgroundRemover>> {
        let Some(endpoint) = cli.endpoint.as_deref().filter(|_| cli.remove_background) else {
            return Ok(Arc::new(UnavailableRemover));
        };

        let mut config = HttpRemoverConfig::new(endpoint);
        if let Some(key) = &cli.api_key {
            config = config.with_api_key(key.clone());
        }
        let remover = HttpBackgroundRemover::new(config)
            .context("Failed to create background removal client")?;
        Ok(Arc::new(remover))
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        normalize_hex_input(&cli.color).context("Invalid --color value")?;

        if cli.remove_background && cli.endpoint.is_none() {
            anyhow::bail!(
                "--remove-background needs a service endpoint (--endpoint or IMGLY_SILHOUETTE_ENDPOINT)"
            );
        }

        if cli.json && cli.output == "-" {
            anyhow::bail!("--json can not be combined with writing the PNG to stdout (-o -)");
        }

        if cli.log_json && !cfg!(feature = "tracing-json") {
            anyhow::bail!("--log-json needs a build with the tracing-json feature");
        }

        Ok(())
    }

    /// File name offered for the download, falling back to the default
    fn download_name(output: &str) -> String {
        Path::new(output)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| name.to_ascii_lowercase().ends_with(".png"))
            .map_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string(), str::to_string)
    }
}
