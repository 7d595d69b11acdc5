//! Shared test utilities for the rexize test suite.
//!
//! Builds throwaway input trees: empty placeholder files for walker tests
//! and small real PNGs for anything that decodes pixels.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_file_tree(tmp.path(), &["a.png", "nested/notes.txt"]);
//! create_test_png(&tmp.path().join("real.png"), 40, 30);
//! ```

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs;
use std::path::Path;

// =========================================================================
// File trees
// =========================================================================

/// Create an empty file at each relative path under `root`, with parent directories.
pub fn write_file_tree(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"").unwrap();
    }
}

// =========================================================================
// Image fixtures
// =========================================================================

/// Write a `width`x`height` RGB gradient PNG to `path`.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let raster = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    save_png(path, DynamicImage::ImageRgb8(raster));
}

/// Write a `width`x`height` RGBA PNG with a left-to-right alpha ramp.
pub fn create_test_rgba_png(path: &Path, width: u32, height: u32) {
    let raster = RgbaImage::from_fn(width, height, |x, _| {
        Rgba([200, 100, 50, (x * 255 / width.max(1)) as u8])
    });
    save_png(path, DynamicImage::ImageRgba8(raster));
}

fn save_png(path: &Path, raster: DynamicImage) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    raster
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}
