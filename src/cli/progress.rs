//! Terminal progress display for the CLI

use crate::services::{ProcessingStage, ProgressReporter, RemovalProgress};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";
const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Progress reporter drawing an `indicatif` spinner on stderr
///
/// Switches to a bar while the background remover reports byte counts.
pub struct IndicatifProgressReporter {
    bar: ProgressBar,
}

impl IndicatifProgressReporter {
    /// Create a reporter; `visible = false` draws nothing
    #[must_use]
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Clear the spinner from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

impl ProgressReporter for IndicatifProgressReporter {
    fn report_stage(&self, stage: ProcessingStage) {
        if stage != ProcessingStage::BackgroundRemoval {
            self.bar.set_style(spinner_style());
        }
        self.bar.set_message(stage.description());
        tracing::debug!(stage = ?stage, "{}", stage.description());
    }

    fn report_removal_progress(&self, progress: RemovalProgress) {
        if progress.total == 0 {
            self.bar.set_message(format!("Downloading {}", progress.key));
            return;
        }
        self.bar.set_style(bar_style());
        self.bar.set_length(progress.total);
        self.bar.set_position(progress.current);
        self.bar.set_message(progress.key);
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        self.bar
            .suspend(|| log::warn!("Error during {}: {}", stage.description(), error));
    }
}
