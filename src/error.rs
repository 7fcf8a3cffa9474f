//! Error types for silhouette pipeline operations

use thiserror::Error;

/// Result type alias for silhouette pipeline operations
pub type Result<T> = std::result::Result<T, SilhouetteError>;

/// Error kinds surfaced by the silhouette pipeline
///
/// All of them are local and recoverable: none leaves the controller in a
/// state that needs a restart.
#[derive(Error, Debug)]
pub enum SilhouetteError {
    /// Uploaded file does not declare an `image/*` media type
    #[error("Invalid input type: {0}")]
    InvalidInputType(String),

    /// Hex color text failed validation
    #[error("Invalid color text: {0}")]
    InvalidColorText(String),

    /// The external background removal call failed
    #[error("Background removal failed: {0}")]
    BackgroundRemoval(String),

    /// Encoded image bytes could not be decoded into a raster
    #[error("Decode error: {0}")]
    Decode(String),

    /// A background removal call is still outstanding
    #[error("Processing in progress: {0}")]
    Busy(String),

    /// There is no silhouette to export yet
    #[error("Nothing to export: {0}")]
    NothingToExport(String),

    /// Raw pixel data does not match the declared dimensions
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Image encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SilhouetteError {
    /// Create a new invalid input type error
    pub fn invalid_input_type<S: Into<String>>(media_type: S) -> Self {
        Self::InvalidInputType(media_type.into())
    }

    /// Create a new invalid color text error
    pub fn invalid_color_text<S: Into<String>>(text: S) -> Self {
        Self::InvalidColorText(text.into())
    }

    /// Create a new background removal error
    pub fn background_removal<S: Into<String>>(msg: S) -> Self {
        Self::BackgroundRemoval(msg.into())
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new busy error
    pub fn busy<S: Into<String>>(msg: S) -> Self {
        Self::Busy(msg.into())
    }

    /// Create a new nothing-to-export error
    pub fn nothing_to_export<S: Into<String>>(msg: S) -> Self {
        Self::NothingToExport(msg.into())
    }

    /// Create a new invalid raster error
    pub fn invalid_raster<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRaster(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a background removal error from a transport failure
    pub fn network_error<S: Into<String>, E: std::fmt::Display>(context: S, error: E) -> Self {
        Self::BackgroundRemoval(format!("{}: {}", context.into(), error))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create decode error with the source description and byte count
    pub fn decode_error_with_context(
        source: &str,
        size_bytes: usize,
        error: &image::ImageError,
    ) -> Self {
        Self::Decode(format!(
            "Failed to decode {} ({} bytes): {}. Supported formats: PNG, JPEG, WebP, TIFF, BMP",
            source, size_bytes, error
        ))
    }

    /// Whether this error was produced by the background removal collaborator
    #[must_use]
    pub fn is_background_removal(&self) -> bool {
        matches!(self, Self::BackgroundRemoval(_))
    }
}
