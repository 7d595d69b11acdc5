//! Image processing in pure Rust via the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | lazy decode through `image::ImageReader` |
//! | **Resize** | [`plan_resize`] + `resize_exact` (bicubic) |
//! | **Convert / rotate** | `DynamicImage` color and orientation ops |
//! | **Save** | per-format encoders from the `image` crate |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Output format, color mode, encoder options
//! - **Document**: [`ImageDocument`], the per-file editing handle

mod calculations;
pub mod document;
mod params;

pub use calculations::plan_resize;
pub use document::{ImageDocument, ImageError};
pub use params::{ColorMode, EncodeOptions, OutputFormat, Quality, UnknownFormat};

/// Extensions the pipeline reads, matched case-sensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "webp", "gif", "tiff", "tif", "bmp"];
