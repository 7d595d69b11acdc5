//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::document::ImageError;
use crate::size::SizeSpec;

/// Target dimensions for a resize.
///
/// # Arguments
/// * `original` - Current image dimensions (width, height)
/// * `width`, `height` - Requested sizes; `0` means "derive from aspect ratio"
/// * `max_size` - Upper bound for both edges in pixels; `0` means unconstrained
///
/// # Algorithm
/// 1. Resolve width/height against the original dimensions.
/// 2. With a max-size: seed zero width *and* height with the original size,
///    then clamp width first and height second. The height clamp sees the
///    result of the width clamp.
/// 3. Fill a zero dimension from the other using the original aspect ratio.
/// 4. Zero-by-zero without a max-size is an error.
///
/// Every ratio is truncated toward zero.
///
/// # Examples
/// ```
/// # use rexize::imaging::plan_resize;
/// # use rexize::size::SizeSpec;
/// // Height only: width follows the aspect ratio
/// let dims = plan_resize((400, 300), SizeSpec::pixels(0), SizeSpec::pixels(150), SizeSpec::pixels(0));
/// assert_eq!(dims.unwrap(), (200, 150));
///
/// // Max-size only: fit inside a 100x100 box
/// let dims = plan_resize((400, 300), SizeSpec::pixels(0), SizeSpec::pixels(0), SizeSpec::pixels(100));
/// assert_eq!(dims.unwrap(), (100, 75));
/// ```
pub fn plan_resize(
    original: (u32, u32),
    width: SizeSpec,
    height: SizeSpec,
    max_size: SizeSpec,
) -> Result<(u32, u32), ImageError> {
    let (orig_w, orig_h) = original;
    let mut new_w = width.resolve(orig_w);
    let mut new_h = height.resolve(orig_h);
    let max_size = max_size.resolve_absolute();

    if max_size > 0 {
        if new_w == 0 && new_h == 0 {
            new_w = orig_w;
            new_h = orig_h;
        }
        (new_w, new_h) = clamp_to_max_size(new_w, new_h, max_size);
    }

    let (filled_w, filled_h) = (new_w, new_h);
    if filled_w == 0 {
        new_w = scale(filled_h, orig_h, orig_w);
    }
    if filled_h == 0 {
        new_h = scale(filled_w, orig_w, orig_h);
    }

    if new_w == 0 && new_h == 0 && max_size == 0 {
        return Err(ImageError::InvalidDimensions);
    }

    Ok((new_w, new_h))
}

/// Two-step clamp: width first, then height on the already-clamped result.
///
/// This is not a single min-scale fit. For extreme aspect ratios the second
/// step scales a width that the first step already reduced.
fn clamp_to_max_size(mut width: u32, mut height: u32, max_size: u32) -> (u32, u32) {
    if width > max_size {
        height = scale(max_size, width, height);
        width = max_size;
    }
    if height > max_size {
        width = scale(max_size, height, width);
        height = max_size;
    }
    (width, height)
}

/// `floor(numerator / denominator * value)`, evaluated in that order.
fn scale(numerator: u32, denominator: u32, value: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (numerator as f64 / denominator as f64 * value as f64) as u32
}
