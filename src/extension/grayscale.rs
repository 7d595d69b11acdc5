use super::Transform;
use crate::imaging::{ColorMode, ImageDocument, ImageError};

/// Reduce to single-channel luminance.
pub struct Grayscale;

impl Transform for Grayscale {
    fn about(&self) -> &str {
        "Convert image to grayscale format"
    }

    fn apply(&mut self, image: &mut ImageDocument) -> Result<(), ImageError> {
        image.convert(ColorMode::Luma)?;
        Ok(())
    }
}
