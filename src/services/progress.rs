//! Progress reporting service
//!
//! This module separates progress reporting concerns from pipeline logic,
//! allowing different frontends to implement their own progress handling.

use serde::Serialize;

/// Stages of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// Validating and storing the acquired file
    Upload,
    /// Waiting on the external background removal call
    BackgroundRemoval,
    /// Decoding encoded bytes into a raster
    Decoding,
    /// Recoloring the raster
    Silhouette,
    /// Encoding the result as PNG
    Encoding,
    /// Run finished
    Completed,
}

impl ProcessingStage {
    /// Get a human-readable description of the processing stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::Upload => "Reading upload",
            ProcessingStage::BackgroundRemoval => "Removing background",
            ProcessingStage::Decoding => "Decoding image",
            ProcessingStage::Silhouette => "Generating silhouette",
            ProcessingStage::Encoding => "Encoding PNG",
            ProcessingStage::Completed => "Silhouette ready",
        }
    }
}

/// Progress triple reported by a background removal collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalProgress {
    /// What is being worked on, e.g. a model file or `download`
    pub key: String,
    pub current: u64,
    pub total: u64,
}

impl RemovalProgress {
    pub fn new<S: Into<String>>(key: S, current: u64, total: u64) -> Self {
        Self {
            key: key.into(),
            current,
            total,
        }
    }

    /// Completion in percent, `None` when the total is unknown
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let clamped = self.current.min(self.total);
        Some(((clamped * 100) / self.total) as u8)
    }
}

/// Trait for reporting progress during pipeline runs
pub trait ProgressReporter: Send + Sync {
    /// Report entry into a pipeline stage
    fn report_stage(&self, stage: ProcessingStage);

    /// Report progress of an outstanding background removal call
    fn report_removal_progress(&self, progress: RemovalProgress);

    /// Report an error during processing
    ///
    /// # Arguments
    /// * `stage` - Stage where error occurred
    /// * `error` - Human-readable error description
    fn report_error(&self, stage: ProcessingStage, error: &str);
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_stage(&self, _stage: ProcessingStage) {
        // Intentionally empty - discards stage updates
    }

    fn report_removal_progress(&self, _progress: RemovalProgress) {
        // Intentionally empty - discards removal progress
    }

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {
        // Intentionally empty - discards error reports
    }
}

/// Console progress reporter that logs progress through `log`
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `verbose` - Whether to log every stage transition
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_stage(&self, stage: ProcessingStage) {
        if self.verbose || stage == ProcessingStage::Completed {
            log::info!("{}", stage.description());
        } else {
            log::debug!("{}", stage.description());
        }
    }

    fn report_removal_progress(&self, progress: RemovalProgress) {
        log::info!(
            "Downloading {}: {} of {}",
            progress.key,
            progress.current,
            progress.total
        );
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        log::error!("❌ Error during {}: {}", stage.description(), error);
    }
}
