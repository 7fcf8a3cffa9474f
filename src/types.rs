//! Core data types for the silhouette pipeline

use crate::raster::RasterBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Media type used when nothing better is known
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Encoded image bytes with their declared media type
///
/// Bytes are shared, so cloning is cheap. The allocation is released when the
/// last clone is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Arc<[u8]>,
    media_type: String,
}

impl EncodedImage {
    pub fn new<B: Into<Arc<[u8]>>, S: Into<String>>(bytes: B, media_type: S) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    /// PNG-encoded bytes
    pub fn png<B: Into<Arc<[u8]>>>(bytes: B) -> Self {
        Self::new(bytes, "image/png")
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The shared allocation backing these bytes
    #[must_use]
    pub fn shared_bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the declared media type is `image/*`
    #[must_use]
    pub fn declares_image(&self) -> bool {
        is_image_media_type(&self.media_type)
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Check a declared media type for the `image/*` family
///
/// Only the declaration is inspected; content is never sniffed.
#[must_use]
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .trim()
        .split('/')
        .next()
        .is_some_and(|top| top.eq_ignore_ascii_case("image"))
        && media_type.contains('/')
}

/// A file acquired from the user, before any decoding
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub image: EncodedImage,
}

impl ImageUpload {
    pub fn new<B: Into<Arc<[u8]>>, S: Into<String>>(bytes: B, media_type: S) -> Self {
        Self {
            file_name: None,
            image: EncodedImage::new(bytes, media_type),
        }
    }

    #[must_use]
    pub fn with_file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.file_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        self.image.media_type()
    }

    /// Short label for logs and error messages
    #[must_use]
    pub fn label(&self) -> String {
        match &self.file_name {
            Some(name) => format!("upload '{}'", name),
            None => "upload".to_string(),
        }
    }
}

/// Which encoded image a [`SourceImage`] was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// The untouched upload
    Original,
    /// The background removal result
    BackgroundRemoved,
}

/// Immutable decoded raster used as the filter input
///
/// Holds on to the encoded payload it was decoded from; both are released
/// together when the source is superseded.
#[derive(Debug, Clone)]
pub struct SourceImage {
    raster: Arc<RasterBuffer>,
    encoded: EncodedImage,
    origin: SourceOrigin,
}

impl SourceImage {
    #[must_use]
    pub fn new(raster: RasterBuffer, encoded: EncodedImage, origin: SourceOrigin) -> Self {
        Self {
            raster: Arc::new(raster),
            encoded,
            origin,
        }
    }

    #[must_use]
    pub fn raster(&self) -> &RasterBuffer {
        &self.raster
    }

    #[must_use]
    pub fn encoded(&self) -> &EncodedImage {
        &self.encoded
    }

    #[must_use]
    pub fn origin(&self) -> SourceOrigin {
        self.origin
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }
}

/// A finished silhouette ready to be saved
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
