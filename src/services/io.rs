//! Image I/O operations service
//!
//! This module separates decoding, encoding and file access from pipeline
//! logic, making the controller testable without touching the filesystem.

use crate::{
    error::{Result, SilhouetteError},
    raster::RasterBuffer,
    types::{EncodedImage, ImageUpload, OCTET_STREAM},
};
use image::{DynamicImage, ImageFormat};
use instant::Instant;
use std::io::Cursor;
use std::path::Path;

/// Service for decoding, encoding and file operations on images
pub struct ImageIOService;

impl ImageIOService {
    /// Decode encoded image bytes into an RGBA raster
    ///
    /// Format detection is content-based; the declared media type is not
    /// consulted here.
    ///
    /// # Errors
    /// - `SilhouetteError::Decode` when the bytes are not a supported image
    pub fn decode(encoded: &EncodedImage, source: &str) -> Result<RasterBuffer> {
        let start = Instant::now();
        let image = image::load_from_memory(encoded.bytes()).map_err(|e| {
            SilhouetteError::decode_error_with_context(source, encoded.len(), &e)
        })?;
        let raster = RasterBuffer::from(&image);

        log::debug!(
            "Decoded {} ({} bytes) to {}x{} in {}ms",
            source,
            encoded.len(),
            raster.width(),
            raster.height(),
            start.elapsed().as_millis()
        );
        Ok(raster)
    }

    /// Encode a raster as PNG bytes, alpha preserved
    ///
    /// # Errors
    /// - `SilhouetteError::Image` when the encoder fails
    ///
    /// # Examples
    /// ```rust
    /// use imgly_silhouette::{raster::RasterBuffer, services::ImageIOService};
    ///
    /// let raster = RasterBuffer::from_raw(1, 1, vec![255, 0, 0, 255])?;
    /// let png = ImageIOService::encode_png(&raster)?;
    /// assert!(png.starts_with(b"\x89PNG"));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn encode_png(raster: &RasterBuffer) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(raster.as_image().clone())
            .write_to(&mut cursor, ImageFormat::Png)?;
        Ok(cursor.into_inner())
    }

    /// Guess the declared media type of a file from its extension
    ///
    /// Unknown extensions map to `application/octet-stream`, which the
    /// pipeline then rejects as not being an image.
    #[must_use]
    pub fn media_type_for_path<P: AsRef<Path>>(path: P) -> &'static str {
        ImageFormat::from_path(path.as_ref())
            .map(|format| format.to_mime_type())
            .unwrap_or(OCTET_STREAM)
    }

    /// Read a file into an upload, declaring its media type from the extension
    ///
    /// # Errors
    /// - `SilhouetteError::Io` when the file can not be read
    pub async fn read_upload<P: AsRef<Path>>(path: P) -> Result<ImageUpload> {
        let path_ref = path.as_ref();
        let bytes = tokio::fs::read(path_ref)
            .await
            .map_err(|e| SilhouetteError::file_io_error("read upload", path_ref, &e))?;

        let media_type = Self::media_type_for_path(path_ref);
        log::debug!(
            "Read {} ({} bytes, declared {})",
            path_ref.display(),
            bytes.len(),
            media_type
        );

        let mut upload = ImageUpload::new(bytes, media_type);
        if let Some(name) = path_ref.file_name().and_then(|n| n.to_str()) {
            upload = upload.with_file_name(name);
        }
        Ok(upload)
    }

    /// Write PNG bytes to a file, creating parent directories
    ///
    /// # Errors
    /// - `SilhouetteError::Io` when the directory or file can not be written
    pub fn write_bytes<P: AsRef<Path>>(bytes: &[u8], path: P) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SilhouetteError::file_io_error("create output directory", parent, &e)
                })?;
            }
        }

        std::fs::write(path_ref, bytes)
            .map_err(|e| SilhouetteError::file_io_error("write", path_ref, &e))?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path_ref.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample_png() -> Vec<u8> {
        let raster = RasterBuffer::from_rgba(RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 200])));
        ImageIOService::encode_png(&raster).unwrap()
    }

    #[test]
    fn test_png_round_trip_preserves_alpha() {
        let decoded = ImageIOService::decode(&EncodedImage::png(sample_png()), "sample").unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.pixel(2, 1), Some([1, 2, 3, 200]));
    }

    #[test]
    fn test_decode_ignores_declared_type() {
        let mislabeled = EncodedImage::new(sample_png(), "image/jpeg");
        assert!(ImageIOService::decode(&mislabeled, "mislabeled").is_ok());
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = ImageIOService::decode(&EncodedImage::png(vec![0u8; 10]), "garbage").unwrap_err();
        assert!(matches!(err, SilhouetteError::Decode(_)));
        assert!(err.to_string().contains("garbage"));
    }

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(ImageIOService::media_type_for_path("a/photo.PNG"), "image/png");
        assert_eq!(ImageIOService::media_type_for_path("photo.jpg"), "image/jpeg");
        assert_eq!(ImageIOService::media_type_for_path("notes.txt"), OCTET_STREAM);
        assert_eq!(ImageIOService::media_type_for_path("no_extension"), OCTET_STREAM);
    }

    #[tokio::test]
    async fn test_read_upload_and_write_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.png");
        ImageIOService::write_bytes(&sample_png(), &input).unwrap();

        let upload = ImageIOService::read_upload(&input).await.unwrap();
        assert_eq!(upload.media_type(), "image/png");
        assert_eq!(upload.file_name.as_deref(), Some("input.png"));
        assert_eq!(upload.image.bytes(), sample_png().as_slice());

        let nested = dir.path().join("out/nested/silhouette.png");
        ImageIOService::write_bytes(b"png", &nested).unwrap();
        assert_eq!(std::fs::read(&nested).unwrap(), b"png");
    }

    #[tokio::test]
    async fn test_read_missing_upload_is_io_error() {
        let err = ImageIOService::read_upload("/definitely/missing.png").await.unwrap_err();
        assert!(matches!(err, SilhouetteError::Io(_)));
    }
}
