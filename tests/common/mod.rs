//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;

/// Write a `width`x`height` PNG where every pixel has the given value.
pub fn write_png(path: &Path, width: u32, height: u32, value: u8) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let raster = RgbImage::from_pixel(width, height, Rgb([value, value, value]));
    DynamicImage::ImageRgb8(raster)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Relative paths of every file under `root`, sorted, with `/` separators.
pub fn list_tree(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// Write a 16-bit `width`x`height` PNG where every channel holds `value` scaled to 16 bits.
pub fn write_png16(path: &Path, width: u32, height: u32, value: u8) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let v = value as u16 * 257;
    let raster: image::ImageBuffer<Rgb<u16>, Vec<u16>> =
        image::ImageBuffer::from_pixel(width, height, Rgb([v, v, v]));
    DynamicImage::ImageRgb16(raster)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}
