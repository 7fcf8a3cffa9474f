//! Image pipeline controller
//!
//! Owns the pipeline state and applies user commands to it:
//!
//! | phase                | command / event        | next phase                    |
//! |----------------------|------------------------|-------------------------------|
//! | any, not processing  | upload (image)         | `LoadingUpload`, then below   |
//! | `LoadingUpload`      | toggle on              | `RemovingBackground`          |
//! | `LoadingUpload`      | toggle off             | `Ready`                       |
//! | `RemovingBackground` | removal succeeded      | `Ready` (cutout)              |
//! | `RemovingBackground` | removal failed         | `Ready` (from original)       |
//! | `Ready`              | toggle change          | as for `LoadingUpload`        |
//! | `Ready`              | color change           | `Ready` (filter only)         |
//! | any                  | reset                  | `Idle`                        |
//! | any                  | decode failure         | `Idle`                        |
//!
//! Background removal is the only suspension point. [`PipelineController::dispatch`]
//! hands it back as a [`PendingRemoval`] the caller drives and returns through
//! [`PipelineController::complete_removal`]; while it is outstanding the
//! processing flag is set and uploads and toggle changes are refused.
//! [`PipelineController::handle`] does both steps in one call.

use crate::{
    color::{format_hex, normalize_hex_input, parse_hex, ColorInput, Rgb},
    config::PipelineConfig,
    error::{Result, SilhouetteError},
    filter::SilhouetteFilter,
    raster::RasterBuffer,
    removal::{BackgroundRemovalAdapter, BackgroundRemover, UnavailableRemover},
    services::{ImageIOService, NoOpProgressReporter, ProcessingStage, ProgressReporter},
    types::{Download, EncodedImage, ImageUpload, SourceImage, SourceOrigin},
};
use futures::future::BoxFuture;
use instant::Instant;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Phases of the pipeline state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    /// Nothing loaded, upload zone shown
    Idle,
    /// An upload was accepted and is being turned into a source image
    LoadingUpload,
    /// Waiting on the background removal call
    RemovingBackground,
    /// A silhouette is displayed
    Ready,
}

/// Which view a frontend should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    UploadZone,
    Editor,
}

/// User actions the controller understands
#[derive(Debug, Clone)]
pub enum PipelineCommand {
    /// A file was picked or dropped
    Upload(ImageUpload),
    /// The picker or the hex field changed
    ChangeColor(ColorInput),
    /// The background removal checkbox changed
    ToggleBackgroundRemoval(bool),
    /// Back to the upload zone
    Reset,
}

/// What a command did
#[derive(Debug)]
pub enum Dispatch {
    /// A new silhouette is on display
    Rendered,
    /// Background removal failed; the silhouette was rendered from the original upload
    RenderedFromOriginal { error: SilhouetteError },
    /// Background removal started; drive the job and pass its outcome to
    /// [`PipelineController::complete_removal`]
    RemovalStarted(PendingRemoval),
    /// Hex text was invalid; it now shows the current color again
    ColorReverted,
    /// State changed (or not) without anything to render
    Unchanged,
    /// A removal result arrived after a reset and was dropped
    Discarded,
}

/// An outstanding background removal call
pub struct PendingRemoval {
    generation: u64,
    job: BoxFuture<'static, Result<EncodedImage>>,
}

impl PendingRemoval {
    /// Run identifier, matched against the controller on completion
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drive the removal call to completion
    pub async fn run(self) -> RemovalOutcome {
        RemovalOutcome {
            generation: self.generation,
            result: self.job.await,
        }
    }
}

impl fmt::Debug for PendingRemoval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRemoval")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Result of a finished [`PendingRemoval`]
#[derive(Debug)]
pub struct RemovalOutcome {
    pub generation: u64,
    pub result: Result<EncodedImage>,
}

/// Read-only view of the controller for frontends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSnapshot {
    pub phase: PipelinePhase,
    pub view: View,
    pub processing: bool,
    pub color: String,
    pub remove_background: bool,
    pub has_original: bool,
    pub source_origin: Option<SourceOrigin>,
    pub dimensions: Option<(u32, u32)>,
    pub last_error: Option<String>,
}

/// Orchestrates decode, optional background removal and the silhouette filter
pub struct PipelineController {
    config: PipelineConfig,
    adapter: BackgroundRemovalAdapter,
    reporter: Arc<dyn ProgressReporter>,
    phase: PipelinePhase,
    color: Rgb,
    remove_background: bool,
    original: Option<ImageUpload>,
    source: Option<SourceImage>,
    silhouette: Option<RasterBuffer>,
    processing: bool,
    generation: u64,
    last_error: Option<String>,
}

impl PipelineController {
    /// Create a controller using `remover` for background removal
    ///
    /// # Errors
    /// - `SilhouetteError::InvalidConfig` when the configuration is invalid
    pub fn new(config: PipelineConfig, remover: Arc<dyn BackgroundRemover>) -> Result<Self> {
        Self::with_reporter(config, remover, Arc::new(NoOpProgressReporter))
    }

    /// Create a controller without any background removal service
    ///
    /// Enabling the toggle still works, but every run falls back to the original.
    ///
    /// # Errors
    /// - `SilhouetteError::InvalidConfig` when the configuration is invalid
    pub fn without_removal(config: PipelineConfig) -> Result<Self> {
        Self::new(config, Arc::new(UnavailableRemover))
    }

    /// Create a controller with a custom progress reporter
    ///
    /// # Errors
    /// - `SilhouetteError::InvalidConfig` when the configuration is invalid
    pub fn with_reporter(
        config: PipelineConfig,
        remover: Arc<dyn BackgroundRemover>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<Self> {
        config.validate()?;
        let adapter = BackgroundRemovalAdapter::new(remover, Arc::clone(&reporter));

        Ok(Self {
            color: config.default_color,
            remove_background: config.remove_background,
            config,
            adapter,
            reporter,
            phase: PipelinePhase::Idle,
            original: None,
            source: None,
            silhouette: None,
            processing: false,
            generation: 0,
            last_error: None,
        })
    }

    #[must_use]
    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// True while a background removal call is outstanding
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    #[must_use]
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Text the hex field shows, always derived from the current color
    #[must_use]
    pub fn hex_text(&self) -> String {
        format_hex(self.color)
    }

    #[must_use]
    pub fn remove_background(&self) -> bool {
        self.remove_background
    }

    #[must_use]
    pub fn original(&self) -> Option<&ImageUpload> {
        self.original.as_ref()
    }

    #[must_use]
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// The silhouette currently on display
    #[must_use]
    pub fn silhouette(&self) -> Option<&RasterBuffer> {
        self.silhouette.as_ref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn view(&self) -> View {
        if self.silhouette.is_some() {
            View::Editor
        } else {
            View::UploadZone
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            phase: self.phase,
            view: self.view(),
            processing: self.processing,
            color: self.hex_text(),
            remove_background: self.remove_background,
            has_original: self.original.is_some(),
            source_origin: self.source.as_ref().map(SourceImage::origin),
            dimensions: self.silhouette.as_ref().map(RasterBuffer::dimensions),
            last_error: self.last_error.clone(),
        }
    }

    /// Apply a command, returning a pending job when background removal starts
    ///
    /// # Errors
    /// - `SilhouetteError::Busy` for uploads and toggle changes while processing
    /// - `SilhouetteError::InvalidInputType` for non-image uploads
    /// - `SilhouetteError::Decode` when the original can not be decoded
    pub fn dispatch(&mut self, command: PipelineCommand) -> Result<Dispatch> {
        match command {
            PipelineCommand::Upload(upload) => self.on_upload(upload),
            PipelineCommand::ChangeColor(input) => Ok(self.on_color_change(input)),
            PipelineCommand::ToggleBackgroundRemoval(enabled) => self.on_toggle_change(enabled),
            PipelineCommand::Reset => {
                self.on_reset();
                Ok(Dispatch::Unchanged)
            },
        }
    }

    /// Apply a command and drive any background removal it starts
    ///
    /// # Errors
    /// - Same as [`Self::dispatch`] and [`Self::complete_removal`]
    pub async fn handle(&mut self, command: PipelineCommand) -> Result<Dispatch> {
        match self.dispatch(command)? {
            Dispatch::RemovalStarted(pending) => {
                let outcome = pending.run().await;
                self.complete_removal(outcome)
            },
            other => Ok(other),
        }
    }

    /// Accept a picked or dropped file
    ///
    /// # Errors
    /// - `SilhouetteError::Busy` while a removal call is outstanding
    /// - `SilhouetteError::InvalidInputType` when the declared type is not `image/*`
    /// - `SilhouetteError::Decode` when the original can not be decoded
    #[instrument(skip(self, upload), fields(upload = %upload.label(), media_type = %upload.media_type()))]
    pub fn on_upload(&mut self, upload: ImageUpload) -> Result<Dispatch> {
        if self.processing {
            debug!("Upload refused while background removal is outstanding");
            return Err(SilhouetteError::busy("background removal is still running"));
        }

        self.reporter.report_stage(ProcessingStage::Upload);
        if !upload.image.declares_image() {
            let error = SilhouetteError::invalid_input_type(format!(
                "Please upload an image file ({} is {})",
                upload.label(),
                upload.media_type()
            ));
            self.reporter.report_error(ProcessingStage::Upload, &error.to_string());
            return Err(error);
        }

        info!(bytes = upload.image.len(), "Upload accepted");
        self.original = Some(upload);
        self.last_error = None;
        self.phase = PipelinePhase::LoadingUpload;
        self.run_pipeline()
    }

    /// Apply a color from the picker or the hex field
    ///
    /// Invalid hex text reverts silently. Runs even while processing.
    #[instrument(skip(self))]
    pub fn on_color_change(&mut self, input: ColorInput) -> Dispatch {
        let color = match input {
            ColorInput::Picker(value) => parse_hex(&value),
            ColorInput::HexText(text) => match normalize_hex_input(&text) {
                Ok(color) => color,
                Err(error) => {
                    debug!(%error, hex = %self.hex_text(), "Reverting hex text");
                    return Dispatch::ColorReverted;
                },
            },
        };

        self.color = color;
        if self.rerender() {
            Dispatch::Rendered
        } else {
            Dispatch::Unchanged
        }
    }

    /// Flip the background removal toggle and re-run from the original
    ///
    /// # Errors
    /// - `SilhouetteError::Busy` while a removal call is outstanding
    /// - `SilhouetteError::Decode` when the original can not be decoded
    #[instrument(skip(self))]
    pub fn on_toggle_change(&mut self, enabled: bool) -> Result<Dispatch> {
        if self.processing {
            debug!("Toggle change refused while background removal is outstanding");
            return Err(SilhouetteError::busy("background removal is still running"));
        }

        self.remove_background = enabled;
        if self.original.is_none() {
            return Ok(Dispatch::Unchanged);
        }
        self.run_pipeline()
    }

    /// Clear everything loaded and return to the upload zone
    ///
    /// Color and toggle survive. An outstanding removal keeps the processing
    /// flag set until it completes; its result is then discarded.
    #[instrument(skip(self))]
    pub fn on_reset(&mut self) {
        self.original = None;
        self.source = None;
        self.silhouette = None;
        self.last_error = None;
        self.phase = PipelinePhase::Idle;
        self.generation += 1;
        info!(processing = self.processing, "Pipeline reset");
    }

    /// Hand back the outcome of a [`PendingRemoval`]
    ///
    /// # Errors
    /// - `SilhouetteError::Decode` when the chosen source can not be decoded;
    ///   the controller is back in `Idle` afterwards
    #[instrument(skip(self, outcome), fields(generation = outcome.generation))]
    pub fn complete_removal(&mut self, outcome: RemovalOutcome) -> Result<Dispatch> {
        self.processing = false;

        if outcome.generation != self.generation || self.original.is_none() {
            debug!(current = self.generation, "Discarding superseded removal result");
            return Ok(Dispatch::Discarded);
        }

        match outcome.result {
            Ok(removed) => {
                self.load_source(removed, SourceOrigin::BackgroundRemoved)?;
                Ok(Dispatch::Rendered)
            },
            Err(error) => {
                warn!(%error, "Falling back to original upload");
                self.reporter
                    .report_error(ProcessingStage::BackgroundRemoval, &error.to_string());
                self.load_original()?;
                self.last_error = Some(error.to_string());
                Ok(Dispatch::RenderedFromOriginal { error })
            },
        }
    }

    /// PNG bytes and file name of the current silhouette
    ///
    /// # Errors
    /// - `SilhouetteError::NothingToExport` when no silhouette is displayed
    /// - `SilhouetteError::Image` when encoding fails
    pub fn download(&self) -> Result<Download> {
        let silhouette = self
            .silhouette
            .as_ref()
            .ok_or_else(|| SilhouetteError::nothing_to_export("no silhouette has been generated"))?;

        self.reporter.report_stage(ProcessingStage::Encoding);
        let bytes = ImageIOService::encode_png(silhouette)?;
        Ok(Download {
            file_name: self.config.download_file_name.clone(),
            bytes,
        })
    }

    /// Write the current silhouette as PNG to `path`
    ///
    /// # Errors
    /// - Same as [`Self::download`], plus `SilhouetteError::Io`
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let download = self.download()?;
        ImageIOService::write_bytes(&download.bytes, path)
    }

    /// Start a run from the original upload
    fn run_pipeline(&mut self) -> Result<Dispatch> {
        let Some(original) = self.original.as_ref() else {
            return Ok(Dispatch::Unchanged);
        };

        if self.remove_background {
            let encoded = original.image.clone();
            self.generation += 1;
            self.processing = true;
            self.phase = PipelinePhase::RemovingBackground;
            self.reporter.report_stage(ProcessingStage::BackgroundRemoval);
            info!(
                generation = self.generation,
                remover = %self.adapter.remover_name(),
                "Background removal started"
            );

            return Ok(Dispatch::RemovalStarted(PendingRemoval {
                generation: self.generation,
                job: self.adapter.start(encoded),
            }));
        }

        self.load_original()?;
        Ok(Dispatch::Rendered)
    }

    fn load_original(&mut self) -> Result<()> {
        let encoded = self
            .original
            .as_ref()
            .map(|upload| upload.image.clone())
            .ok_or_else(|| SilhouetteError::decode("no original upload to decode"))?;
        self.load_source(encoded, SourceOrigin::Original)
    }

    /// Decode `encoded` into the new source image and render it
    fn load_source(&mut self, encoded: EncodedImage, origin: SourceOrigin) -> Result<()> {
        self.reporter.report_stage(ProcessingStage::Decoding);
        let label = match origin {
            SourceOrigin::Original => self
                .original
                .as_ref()
                .map_or_else(|| "upload".to_string(), ImageUpload::label),
            SourceOrigin::BackgroundRemoved => "background removal result".to_string(),
        };

        let raster = match ImageIOService::decode(&encoded, &label) {
            Ok(raster) => raster,
            Err(error) => {
                warn!(%error, "Decode failed, returning to idle");
                self.reporter.report_error(ProcessingStage::Decoding, &error.to_string());
                self.on_reset();
                self.last_error = Some(error.to_string());
                return Err(error);
            },
        };

        self.source = Some(SourceImage::new(raster, encoded, origin));
        self.rerender();
        self.phase = PipelinePhase::Ready;
        self.reporter.report_stage(ProcessingStage::Completed);
        Ok(())
    }

    /// Re-run the filter on the current source; false when there is none
    fn rerender(&mut self) -> bool {
        let Some(source) = self.source.as_ref() else {
            return false;
        };

        self.reporter.report_stage(ProcessingStage::Silhouette);
        let start = Instant::now();
        let rendered = SilhouetteFilter::render(source.raster(), self.color);
        let (width, height) = rendered.dimensions();
        debug!(
            width,
            height,
            color = %self.hex_text(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Silhouette rendered"
        );
        self.silhouette = Some(rendered);
        true
    }
}
