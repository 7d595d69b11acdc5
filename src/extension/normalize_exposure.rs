//! Two-phase exposure normalisation.
//!
//! `apply` only measures: it adds each image's mean brightness to a running
//! total. Once every image has been seen, `finalise` is called on each
//! written output and shifts its brightness toward the run's average.
//!
//! Brightness is the mean of the HSV value channel, `max(r, g, b)`, on a
//! 0–255 scale.

use super::{Finaliser, Transform};
use crate::imaging::{ImageDocument, ImageError};
use image::DynamicImage;
use tracing::debug;

#[derive(Debug, Default)]
pub struct NormalizeExposure {
    total_exposure: f64,
    total_images: u32,
}

impl NormalizeExposure {
    pub fn images_seen(&self) -> u32 {
        self.total_images
    }

    /// Mean brightness across every image applied so far.
    pub fn average_exposure(&self) -> Option<f64> {
        (self.total_images > 0).then(|| self.total_exposure / self.total_images as f64)
    }
}

impl Transform for NormalizeExposure {
    fn about(&self) -> &str {
        "Detects and normalizes the exposure to ensure uniform exposure across all images"
    }

    fn apply(&mut self, image: &mut ImageDocument) -> Result<(), ImageError> {
        self.total_exposure += mean_brightness(image.raster()?);
        self.total_images += 1;
        Ok(())
    }

    fn as_finaliser(&mut self) -> Option<&mut dyn Finaliser> {
        Some(self as &mut dyn Finaliser)
    }
}

impl Finaliser for NormalizeExposure {
    fn finalise(&mut self, image: &mut ImageDocument) -> Result<(), ImageError> {
        let Some(average) = self.average_exposure() else {
            return Ok(());
        };
        let raster = image.raster()?;
        let current = mean_brightness(raster);
        let shift = (average - current).round() as i32;
        if shift != 0 {
            *raster = brighten_on_8bit_scale(raster, shift);
        }
        debug!(
            "Exposure {:.1} → target {:.1} (shift {})",
            current, average, shift
        );
        Ok(())
    }
}

/// `brighten` by a 0–255 shift, whatever the channel depth of `raster`.
///
/// `DynamicImage::brighten` adds in native channel units, so 16-bit rasters
/// need the shift scaled by 257. Float rasters are brought to 8 bits first.
fn brighten_on_8bit_scale(raster: &DynamicImage, shift: i32) -> DynamicImage {
    let color = raster.color();
    let bytes_per_channel = color.bytes_per_pixel() / color.channel_count();
    match bytes_per_channel {
        1 => raster.brighten(shift),
        2 => raster.brighten(shift * 257),
        _ if color.has_alpha() => DynamicImage::ImageRgba8(raster.to_rgba8()).brighten(shift),
        _ => DynamicImage::ImageRgb8(raster.to_rgb8()).brighten(shift),
    }
}

/// Mean of `max(r, g, b)` over all pixels. Empty rasters measure 0.
pub fn mean_brightness(raster: &DynamicImage) -> f64 {
    let rgb = raster.to_rgb8();
    let count = rgb.width() as u64 * rgb.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let total: u64 = rgb
        .pixels()
        .map(|p| p.0.iter().copied().max().unwrap_or(0) as u64)
        .sum();
    total as f64 / count as f64
}
