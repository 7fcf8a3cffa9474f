#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # IMG.LY Silhouette Library
//!
//! Turns a photo into a flat-color silhouette. Every pixel that is not fully
//! transparent takes the chosen color; fully transparent pixels are left as
//! they are. An optional background removal step runs first so the subject's
//! outline, not the whole frame, becomes the silhouette.
//!
//! ## Features
//!
//! - **Silhouette Filter**: alpha-preserving recolor of RGBA rasters
//! - **Pipeline Controller**: upload, toggle, color and reset handling with a processing flag
//! - **Background Removal Boundary**: any async [`BackgroundRemover`], failures fall back to the original
//! - **HTTP Remover**: client for a remote removal service (`reqwest`)
//! - **Format Support**: JPEG, PNG, WebP, BMP, TIFF input; PNG output
//! - **CLI Integration**: Optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgly_silhouette::{
//!     ColorInput, ImageIOService, PipelineCommand, PipelineConfig, PipelineController,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut controller = PipelineController::without_removal(PipelineConfig::default())?;
//! controller
//!     .handle(PipelineCommand::ChangeColor(ColorInput::HexText("#FF6600".into())))
//!     .await?;
//!
//! let upload = ImageIOService::read_upload("portrait.jpg").await?;
//! controller.handle(PipelineCommand::Upload(upload)).await?;
//! controller.save_png("silhouette.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## With Background Removal
//!
//! ```rust,no_run
//! use imgly_silhouette::{
//!     Dispatch, HttpBackgroundRemover, HttpRemoverConfig, ImageIOService, PipelineCommand,
//!     PipelineConfig, PipelineController,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let remover = HttpBackgroundRemover::new(HttpRemoverConfig::new("https://remove.example.com/v1"))?;
//! let config = PipelineConfig::builder().remove_background(true).build()?;
//! let mut controller = PipelineController::new(config, Arc::new(remover))?;
//!
//! let upload = ImageIOService::read_upload("portrait.jpg").await?;
//! if let Dispatch::RenderedFromOriginal { error } =
//!     controller.handle(PipelineCommand::Upload(upload)).await?
//! {
//!     eprintln!("background removal failed, used the original: {}", error);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): Command-line interface and progress bars
//! - `webp-support` (default): WebP image format support
//! - `tracing-json`: JSON log output for the CLI (`--log-json`)
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! imgly-silhouette = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod raster;
pub mod removal;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

// Internal imports for lib functions
use tokio::io::AsyncRead;

// Public API exports
pub use color::{format_hex, normalize_hex_input, parse_hex, try_parse_hex, ColorInput, Rgb};
pub use config::{HttpRemoverConfig, PipelineConfig, PipelineConfigBuilder, DEFAULT_DOWNLOAD_NAME};
pub use controller::{
    Dispatch, PendingRemoval, PipelineCommand, PipelineController, PipelinePhase,
    PipelineSnapshot, RemovalOutcome, View,
};
pub use error::{Result, SilhouetteError};
pub use filter::SilhouetteFilter;
pub use raster::RasterBuffer;
pub use removal::{
    BackgroundRemovalAdapter, BackgroundRemover, HttpBackgroundRemover, UnavailableRemover,
};
pub use services::{
    ConsoleProgressReporter, ImageIOService, NoOpProgressReporter, ProcessingStage,
    ProgressReporter, RemovalProgress,
};
pub use types::{Download, EncodedImage, ImageUpload, SourceImage, SourceOrigin};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, spans, TracingConfig, TracingFormat};

/// Render a silhouette from encoded image bytes
///
/// No background removal is involved: the image's own alpha decides which
/// pixels are covered.
///
/// # Examples
///
/// ```rust,no_run
/// use imgly_silhouette::{silhouette_from_bytes, ImageIOService, Rgb};
///
/// # fn example(upload_bytes: Vec<u8>) -> anyhow::Result<()> {
/// let silhouette = silhouette_from_bytes(&upload_bytes, Rgb::new(255, 102, 0))?;
/// let png = ImageIOService::encode_png(&silhouette)?;
/// # Ok(())
/// # }
/// ```
pub fn silhouette_from_bytes(image_bytes: &[u8], color: Rgb) -> Result<RasterBuffer> {
    let encoded = EncodedImage::new(image_bytes.to_vec(), types::OCTET_STREAM);
    let mut raster = ImageIOService::decode(&encoded, "bytes")?;
    SilhouetteFilter::apply(&mut raster, color);
    Ok(raster)
}

/// Render a silhouette from an async reader stream
///
/// # Examples
///
/// ```rust,no_run
/// use imgly_silhouette::{silhouette_from_reader, ImageIOService, Rgb};
/// use tokio::fs::File;
///
/// # async fn example() -> anyhow::Result<()> {
/// let file = File::open("cutout.png").await?;
/// let silhouette = silhouette_from_reader(file, Rgb::BLACK).await?;
/// ImageIOService::write_bytes(&ImageIOService::encode_png(&silhouette)?, "silhouette.png")?;
/// # Ok(())
/// # }
/// ```
pub async fn silhouette_from_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    color: Rgb,
) -> Result<RasterBuffer> {
    let mut buffer = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut buffer).await?;
    silhouette_from_bytes(&buffer, color)
}
