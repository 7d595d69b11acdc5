use super::Transform;
use crate::imaging::{ColorMode, ImageDocument, ImageError};

/// Convert to 3-channel color, dropping alpha and promoting grayscale.
pub struct Rgb;

impl Transform for Rgb {
    fn about(&self) -> &str {
        "Convert image to RGB format"
    }

    fn apply(&mut self, image: &mut ImageDocument) -> Result<(), ImageError> {
        image.convert(ColorMode::Rgb)?;
        Ok(())
    }
}
