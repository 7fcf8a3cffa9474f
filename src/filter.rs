//! Silhouette filter
//!
//! Recolors every pixel with a non-zero alpha to a single flat color and
//! leaves fully transparent pixels byte-identical. Partially transparent edge
//! pixels are recolored solidly too; their alpha is kept.

use crate::{color::Rgb, raster::RasterBuffer, raster::CHANNELS};

/// Flat-color silhouette filter
#[derive(Debug, Clone, Copy, Default)]
pub struct SilhouetteFilter;

impl SilhouetteFilter {
    /// Recolor a raster in place
    pub fn apply(buffer: &mut RasterBuffer, color: Rgb) {
        Self::apply_to_pixels(buffer.pixels_mut(), color);
    }

    /// Recolor a copy of `source`, leaving it untouched
    #[must_use]
    pub fn render(source: &RasterBuffer, color: Rgb) -> RasterBuffer {
        let mut output = source.clone();
        Self::apply(&mut output, color);
        output
    }

    /// Recolor raw RGBA bytes in place
    ///
    /// A trailing partial pixel (length not a multiple of 4) is left as is.
    pub fn apply_to_pixels(pixels: &mut [u8], color: Rgb) {
        let [r, g, b] = color.channels();
        for pixel in pixels.chunks_exact_mut(CHANNELS) {
            if let [pr, pg, pb, alpha] = pixel {
                if *alpha > 0 {
                    *pr = r;
                    *pg = g;
                    *pb = b;
                }
            }
        }
    }

    /// Count pixels the filter would recolor
    #[must_use]
    pub fn covered_pixels(buffer: &RasterBuffer) -> usize {
        buffer
            .pixels()
            .chunks_exact(CHANNELS)
            .filter(|pixel| pixel.get(3).is_some_and(|&alpha| alpha > 0))
            .count()
    }
}
