//! HTTP background removal service client
//!
//! Sends the encoded image as the body of a `POST` request and streams the
//! PNG answer back, reporting `upload` and `download` progress.

use super::BackgroundRemover;
use crate::{
    config::HttpRemoverConfig,
    error::{Result, SilhouetteError},
    services::{ProgressReporter, RemovalProgress},
    types::{is_image_media_type, EncodedImage},
};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::sync::Arc;

/// Error bodies longer than this are cut in error messages
const MAX_ERROR_DETAIL: usize = 200;

/// Upper bound for buffer space reserved from a declared `Content-Length`
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Background remover backed by a remote HTTP service
///
/// No request timeout is set: the service's own completion or failure is
/// the only termination signal.
#[derive(Debug, Clone)]
pub struct HttpBackgroundRemover {
    client: Client,
    config: HttpRemoverConfig,
}

impl HttpBackgroundRemover {
    /// Create a new HTTP remover
    ///
    /// # Errors
    /// - `SilhouetteError::InvalidConfig` when the configuration is invalid
    /// - `SilhouetteError::BackgroundRemoval` when the HTTP client can not be built
    pub fn new(config: HttpRemoverConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SilhouetteError::network_error("Failed to create HTTP client", e))?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &HttpRemoverConfig {
        &self.config
    }
}

/// Media type from a `Content-Type` value, parameters stripped
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Initial body capacity; the declared length is only a hint
fn preallocation(expected: Option<u64>) -> usize {
    expected.map_or(0, |n| n.min(MAX_PREALLOC) as usize)
}

#[async_trait]
impl BackgroundRemover for HttpBackgroundRemover {
    async fn remove_background(
        &self,
        source: EncodedImage,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<EncodedImage> {
        let endpoint = self.config.endpoint.as_str();
        let upload_size = source.len() as u64;
        progress.report_removal_progress(RemovalProgress::new("upload", 0, upload_size));

        let mut request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, source.media_type())
            .header(ACCEPT, "image/png")
            .body(source.bytes().to_vec());
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        log::debug!("POST {} ({} bytes, {})", endpoint, upload_size, source.media_type());
        let response = request
            .send()
            .await
            .map_err(|e| SilhouetteError::network_error(format!("Failed to reach {}", endpoint), e))?;
        progress.report_removal_progress(RemovalProgress::new("upload", upload_size, upload_size));

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.trim().chars().take(MAX_ERROR_DETAIL).collect();
            return Err(SilhouetteError::background_removal(format!(
                "HTTP error {} from {}: {}",
                status, endpoint, detail
            )));
        }

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or_else(|| "image/png".to_string(), essence);
        if !is_image_media_type(&media_type) {
            return Err(SilhouetteError::background_removal(format!(
                "{} answered with {} instead of an image",
                endpoint, media_type
            )));
        }

        let expected = response.content_length();
        let mut body = Vec::with_capacity(preallocation(expected));
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                SilhouetteError::network_error(format!("Failed to read response from {}", endpoint), e)
            })?;
            body.extend_from_slice(&chunk);

            let received = body.len() as u64;
            progress.report_removal_progress(RemovalProgress::new(
                "download",
                received,
                expected.unwrap_or(received),
            ));
        }

        log::debug!("Received {} bytes ({}) from {}", body.len(), media_type, endpoint);
        Ok(EncodedImage::new(body, media_type))
    }

    fn name(&self) -> &str {
        "http"
    }
}
