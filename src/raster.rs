//! RGBA raster buffer

use crate::error::{Result, SilhouetteError};
use image::{DynamicImage, GenericImageView, RgbaImage};

/// Bytes per RGBA pixel
pub const CHANNELS: usize = 4;

/// An owned width×height grid of 8-bit RGBA pixels
///
/// Pixel data is always exactly `width * height * 4` bytes, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    image: RgbaImage,
}

impl RasterBuffer {
    /// Wrap an existing RGBA image
    #[must_use]
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Convert any decoded image to RGBA8, the way a canvas draw flattens it
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            image: image.to_rgba8(),
        }
    }

    /// Build a raster from raw RGBA bytes
    ///
    /// # Errors
    /// - `SilhouetteError::InvalidRaster` when `pixels.len() != width * height * 4`
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS));
        let actual = pixels.len();

        if expected != Some(actual) {
            return Err(SilhouetteError::invalid_raster(format!(
                "{}x{} RGBA needs {} bytes, got {}",
                width,
                height,
                expected.map_or_else(|| "too many".to_string(), |n| n.to_string()),
                actual
            )));
        }

        RgbaImage::from_raw(width, height, pixels)
            .map(Self::from_rgba)
            .ok_or_else(|| SilhouetteError::invalid_raster("pixel buffer rejected"))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Number of pixels in the grid
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Raw RGBA bytes
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Mutable raw RGBA bytes, for in-place filter passes
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// RGBA value at `(x, y)`, or `None` outside the grid
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.width() && y < self.height() {
            Some(self.image.get_pixel(x, y).0)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    #[must_use]
    pub fn into_dynamic(self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.image)
    }
}

impl From<RgbaImage> for RasterBuffer {
    fn from(image: RgbaImage) -> Self {
        Self::from_rgba(image)
    }
}

impl From<&DynamicImage> for RasterBuffer {
    fn from(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        log::trace!("Flattening {}x{} {:?} image to RGBA8", width, height, image.color());
        Self::from_dynamic(image)
    }
}
