//! Configuration types for the silhouette pipeline

use crate::color::Rgb;
use crate::error::{Result, SilhouetteError};
use serde::{Deserialize, Serialize};

/// File name offered for the downloaded silhouette
pub const DEFAULT_DOWNLOAD_NAME: &str = "silhouette.png";

/// Configuration for a [`crate::PipelineController`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Color used until the user picks one
    pub default_color: Rgb,

    /// Initial state of the background removal toggle
    pub remove_background: bool,

    /// File name offered for downloads, must end in `.png`
    pub download_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_color: Rgb::BLACK,
            remove_background: false,
            download_file_name: DEFAULT_DOWNLOAD_NAME.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// - `SilhouetteError::InvalidConfig` for an empty, non-PNG or path-like
    ///   download file name
    pub fn validate(&self) -> Result<()> {
        let name = self.download_file_name.as_str();
        if name.is_empty() {
            return Err(SilhouetteError::invalid_config(
                "Download file name must not be empty",
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(SilhouetteError::invalid_config(format!(
                "Download file name must not contain path separators: {}",
                name
            )));
        }
        if !name.to_ascii_lowercase().ends_with(".png") {
            return Err(SilhouetteError::invalid_config(format!(
                "Download file name must end in .png: {}",
                name
            )));
        }
        Ok(())
    }
}

/// Builder for `PipelineConfig`
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn default_color(mut self, color: Rgb) -> Self {
        self.config.default_color = color;
        self
    }

    #[must_use]
    pub fn remove_background(mut self, enabled: bool) -> Self {
        self.config.remove_background = enabled;
        self
    }

    #[must_use]
    pub fn download_file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.download_file_name = name.into();
        self
    }

    /// Build the pipeline configuration
    ///
    /// # Errors
    /// - `SilhouetteError::InvalidConfig` when validation fails
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for [`crate::removal::HttpBackgroundRemover`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRemoverConfig {
    /// Endpoint receiving `POST` requests with the encoded image as body
    pub endpoint: String,

    /// Optional bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// `User-Agent` header value
    pub user_agent: String,
}

impl HttpRemoverConfig {
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }

    #[must_use]
    pub fn with_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// - `SilhouetteError::InvalidConfig` for endpoints that are not http(s)
    ///   URLs or an empty api key
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        let rest = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"));

        match rest {
            Some(host) if !host.is_empty() => {},
            _ => {
                return Err(SilhouetteError::invalid_config(format!(
                    "Background removal endpoint must be an http(s) URL: {}",
                    self.endpoint
                )));
            },
        }

        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(SilhouetteError::invalid_config("API key must not be empty"));
        }
        Ok(())
    }
}
