//! Background removal collaborator boundary
//!
//! The removal algorithm itself lives behind [`BackgroundRemover`]. The
//! pipeline only talks to it through [`BackgroundRemovalAdapter`], which turns
//! every failure mode of the collaborator (errors and panics alike) into a
//! `SilhouetteError::BackgroundRemoval` the controller can recover from.

pub mod http;

#[cfg(test)]
pub(crate) mod test_utils;

pub use http::HttpBackgroundRemover;

use crate::{
    error::{Result, SilhouetteError},
    services::ProgressReporter,
    types::EncodedImage,
};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use instant::Instant;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

/// External background removal capability
///
/// Given an encoded image, returns a new encoded image (PNG with alpha) in
/// which non-subject pixels are transparent. Implementations may report
/// progress through `progress` and may fail.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Remove the background from `source`
    ///
    /// # Errors
    /// - Any error; the adapter reports it as a background removal failure
    async fn remove_background(
        &self,
        source: EncodedImage,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<EncodedImage>;

    /// Short name for logs
    fn name(&self) -> &str {
        "background-remover"
    }
}

/// Remover used when no background removal service is configured
///
/// Every call fails, so the pipeline falls back to the original upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRemover;

#[async_trait]
impl BackgroundRemover for UnavailableRemover {
    async fn remove_background(
        &self,
        _source: EncodedImage,
        _progress: Arc<dyn ProgressReporter>,
    ) -> Result<EncodedImage> {
        Err(SilhouetteError::background_removal(
            "no background removal service configured",
        ))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Wraps a [`BackgroundRemover`] and isolates its failures
#[derive(Clone)]
pub struct BackgroundRemovalAdapter {
    remover: Arc<dyn BackgroundRemover>,
    reporter: Arc<dyn ProgressReporter>,
}

impl BackgroundRemovalAdapter {
    pub fn new(remover: Arc<dyn BackgroundRemover>, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self { remover, reporter }
    }

    #[must_use]
    pub fn remover_name(&self) -> &str {
        self.remover.name()
    }

    /// Start a removal call for `source`
    ///
    /// The returned future owns everything it needs, so it can be awaited
    /// inline or spawned. It always resolves; panics inside the collaborator
    /// come back as errors.
    #[must_use]
    pub fn start(&self, source: EncodedImage) -> BoxFuture<'static, Result<EncodedImage>> {
        let remover = Arc::clone(&self.remover);
        let reporter = Arc::clone(&self.reporter);
        let span = info_span!(
            "background_removal",
            remover = %remover.name(),
            input_bytes = source.len()
        );

        async move {
            let start = Instant::now();
            info!("Starting background removal...");

            let call = remover.remove_background(source, reporter);
            let result = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(Ok(image)) if image.is_empty() => Err(SilhouetteError::background_removal(
                    format!("{} returned an empty image", remover.name()),
                )),
                Ok(Ok(image)) => Ok(image),
                Ok(Err(error)) => Err(into_removal_error(error)),
                Err(payload) => Err(SilhouetteError::background_removal(format!(
                    "{} panicked: {}",
                    remover.name(),
                    panic_message(payload.as_ref())
                ))),
            };

            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(image) => info!(
                    output_bytes = image.len(),
                    media_type = %image.media_type(),
                    elapsed_ms,
                    "Background removal complete."
                ),
                Err(error) => warn!(elapsed_ms, %error, "Background removal error"),
            }
            result
        }
        .instrument(span)
        .boxed()
    }
}

fn into_removal_error(error: SilhouetteError) -> SilhouetteError {
    if error.is_background_removal() {
        error
    } else {
        SilhouetteError::background_removal(error.to_string())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
