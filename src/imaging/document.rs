//! An image file opened for editing.
//!
//! [`ImageDocument`] owns one decoded raster plus the path it came from.
//! Decoding is deferred until pixels or dimensions are first needed, so
//! opening a document only checks that the file exists.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with format sniffing |
//! | Resize | `DynamicImage::resize_exact` with `CatmullRom` (bicubic) |
//! | Convert | `DynamicImage::to_rgb8` / `to_luma8` / … |
//! | Rotate | `DynamicImage::rotate180` / `rotate90` / `rotate270`, else `imageproc::geometric_transformations::rotate_about_center` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → others | `DynamicImage::write_to` |
//!
//! Mutating operations replace the raster in place and return `&mut Self`
//! so calls can be chained:
//!
//! ```text
//! doc.resize(w, h, max)?.convert(ColorMode::Luma)?.save(&dest, format, &options)?;
//! ```

use super::calculations::plan_resize;
use super::params::{ColorMode, EncodeOptions, OutputFormat};
use crate::size::SizeSpec;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Luma, LumaA, Rgb, Rgba};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File not found at {0}")]
    SourceNotFound(PathBuf),
    #[error("Both width and height cannot be 0 at the same time.")]
    InvalidDimensions,
    #[error("Resolved size {width}x{height} has a zero dimension")]
    EmptyTarget { width: u32, height: u32 },
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
    #[error("Cannot infer an image format from {0}")]
    UnknownFormat(PathBuf),
    #[error("Rotation by {0} degrees is not supported")]
    UnsupportedRotation(f32),
}

pub struct ImageDocument {
    source: PathBuf,
    destination: Option<PathBuf>,
    raster: Option<DynamicImage>,
}

impl ImageDocument {
    /// Open a document. Fails with [`ImageError::SourceNotFound`] if `path` does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ImageError> {
        let source = path.into();
        if !source.exists() {
            return Err(ImageError::SourceNotFound(source));
        }
        Ok(Self {
            source,
            destination: None,
            raster: None,
        })
    }

    /// Wrap an already-decoded raster.
    pub fn from_raster(source: impl Into<PathBuf>, raster: DynamicImage) -> Self {
        Self {
            source: source.into(),
            destination: None,
            raster: Some(raster),
        }
    }

    /// Attach a pre-resolved destination used by [`save_to_destination`](Self::save_to_destination).
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn is_decoded(&self) -> bool {
        self.raster.is_some()
    }

    /// The decoded raster, decoding on first access.
    pub fn raster(&mut self) -> Result<&mut DynamicImage, ImageError> {
        let raster = match self.raster.take() {
            Some(raster) => raster,
            None => {
                let raster = load_image(&self.source)?;
                debug!(
                    "Opened image: {} ({}x{})",
                    self.source.display(),
                    raster.width(),
                    raster.height()
                );
                raster
            }
        };
        Ok(self.raster.insert(raster))
    }

    pub fn set_raster(&mut self, raster: DynamicImage) -> &mut Self {
        self.raster = Some(raster);
        self
    }

    pub fn dimensions(&mut self) -> Result<(u32, u32), ImageError> {
        let raster = self.raster()?;
        Ok((raster.width(), raster.height()))
    }

    pub fn width(&mut self) -> Result<u32, ImageError> {
        Ok(self.dimensions()?.0)
    }

    pub fn height(&mut self) -> Result<u32, ImageError> {
        Ok(self.dimensions()?.1)
    }

    /// Resample to the size computed by [`plan_resize`].
    pub fn resize(
        &mut self,
        width: SizeSpec,
        height: SizeSpec,
        max_size: SizeSpec,
    ) -> Result<&mut Self, ImageError> {
        let original = self.dimensions()?;
        let (new_w, new_h) = plan_resize(original, width, height, max_size)?;
        if new_w == 0 || new_h == 0 {
            return Err(ImageError::EmptyTarget {
                width: new_w,
                height: new_h,
            });
        }

        let raster = self.raster()?;
        let resized = raster.resize_exact(new_w, new_h, FilterType::CatmullRom);
        *raster = resized;
        debug!(
            "Resized image from {}x{} to {}x{}",
            original.0, original.1, new_w, new_h
        );
        Ok(self)
    }

    pub fn convert(&mut self, mode: ColorMode) -> Result<&mut Self, ImageError> {
        let raster = self.raster()?;
        let converted = match mode {
            ColorMode::Rgb => DynamicImage::ImageRgb8(raster.to_rgb8()),
            ColorMode::Rgba => DynamicImage::ImageRgba8(raster.to_rgba8()),
            ColorMode::Luma => DynamicImage::ImageLuma8(raster.to_luma8()),
            ColorMode::LumaAlpha => DynamicImage::ImageLumaA8(raster.to_luma_alpha8()),
        };
        *raster = converted;
        debug!("Converted image to: {:?}", mode);
        Ok(self)
    }

    /// Rotate counter-clockwise about the center, keeping the canvas size.
    ///
    /// Corners that rotate out of the canvas are cropped and uncovered
    /// areas are filled with black (transparent when the raster has alpha).
    pub fn rotate(&mut self, degrees: f32) -> Result<&mut Self, ImageError> {
        if !degrees.is_finite() {
            return Err(ImageError::UnsupportedRotation(degrees));
        }
        let normalized = degrees.rem_euclid(360.0);
        if normalized == 0.0 {
            return Ok(self);
        }
        let raster = self.raster()?;
        let square = raster.width() == raster.height();
        let rotated = match normalized {
            180.0 => raster.rotate180(),
            90.0 if square => raster.rotate270(),
            270.0 if square => raster.rotate90(),
            _ => rotate_in_place(raster, normalized),
        };
        *raster = rotated;
        debug!("Rotated image by: {} degrees", degrees);
        Ok(self)
    }

    /// Encode the raster to `destination`, creating parent directories as needed.
    pub fn save(
        &mut self,
        destination: &Path,
        format: OutputFormat,
        options: &EncodeOptions,
    ) -> Result<&mut Self, ImageError> {
        let codec = format
            .image_format(destination)
            .ok_or_else(|| ImageError::UnknownFormat(destination.to_path_buf()))?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("Saving image to: {}", destination.display());
        let raster = self.raster()?;
        save_image(raster, destination, codec, options)?;
        Ok(self)
    }

    /// Save to the destination attached with [`with_destination`](Self::with_destination),
    /// falling back to overwriting the source.
    pub fn save_to_destination(
        &mut self,
        format: OutputFormat,
        options: &EncodeOptions,
    ) -> Result<&mut Self, ImageError> {
        let destination = self
            .destination
            .clone()
            .unwrap_or_else(|| self.source.clone());
        self.save(&destination, format, options)
    }
}

/// Bilinear rotation about the center on a same-size canvas.
fn rotate_in_place(raster: &DynamicImage, degrees: f32) -> DynamicImage {
    // imageproc turns clockwise for positive angles.
    let theta = -degrees.to_radians();
    let bilinear = Interpolation::Bilinear;
    match raster {
        DynamicImage::ImageLuma8(img) => {
            DynamicImage::ImageLuma8(rotate_about_center(img, theta, bilinear, Luma([0])))
        }
        DynamicImage::ImageLumaA8(img) => {
            DynamicImage::ImageLumaA8(rotate_about_center(img, theta, bilinear, LumaA([0, 0])))
        }
        DynamicImage::ImageRgb8(img) => {
            DynamicImage::ImageRgb8(rotate_about_center(img, theta, bilinear, Rgb([0, 0, 0])))
        }
        DynamicImage::ImageLuma16(img) => {
            DynamicImage::ImageLuma16(rotate_about_center(img, theta, bilinear, Luma([0])))
        }
        DynamicImage::ImageLumaA16(img) => {
            DynamicImage::ImageLumaA16(rotate_about_center(img, theta, bilinear, LumaA([0, 0])))
        }
        DynamicImage::ImageRgb16(img) => {
            DynamicImage::ImageRgb16(rotate_about_center(img, theta, bilinear, Rgb([0, 0, 0])))
        }
        DynamicImage::ImageRgba16(img) => DynamicImage::ImageRgba16(rotate_about_center(
            img,
            theta,
            bilinear,
            Rgba([0, 0, 0, 0]),
        )),
        // Rgba8, and float rasters brought down to it.
        other => DynamicImage::ImageRgba8(rotate_about_center(
            &other.to_rgba8(),
            theta,
            bilinear,
            Rgba([0, 0, 0, 0]),
        )),
    }
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, ImageError> {
    if !path.exists() {
        return Err(ImageError::SourceNotFound(path.to_path_buf()));
    }
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| ImageError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Convert to a pixel layout the target encoder accepts.
///
/// JPEG has no alpha channel; GIF, WebP and BMP only take 8-bit data.
fn prepare_for(raster: &DynamicImage, codec: ImageFormat) -> Option<DynamicImage> {
    let has_alpha = raster.color().has_alpha();
    let is_gray = !raster.color().has_color();
    match codec {
        ImageFormat::Jpeg => match raster {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => None,
            _ if is_gray => Some(DynamicImage::ImageLuma8(raster.to_luma8())),
            _ => Some(DynamicImage::ImageRgb8(raster.to_rgb8())),
        },
        ImageFormat::Gif => match raster {
            DynamicImage::ImageRgba8(_) => None,
            _ => Some(DynamicImage::ImageRgba8(raster.to_rgba8())),
        },
        ImageFormat::WebP | ImageFormat::Bmp => match raster {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => None,
            DynamicImage::ImageLuma8(_) if codec == ImageFormat::Bmp => None,
            _ if has_alpha => Some(DynamicImage::ImageRgba8(raster.to_rgba8())),
            _ => Some(DynamicImage::ImageRgb8(raster.to_rgb8())),
        },
        ImageFormat::Tiff => match raster {
            DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
                Some(DynamicImage::ImageRgba8(raster.to_rgba8()))
            }
            _ => None,
        },
        _ => None,
    }
}

fn save_image(
    raster: &DynamicImage,
    path: &Path,
    codec: ImageFormat,
    options: &EncodeOptions,
) -> Result<(), ImageError> {
    let prepared = prepare_for(raster, codec);
    let raster = prepared.as_ref().unwrap_or(raster);

    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encode_err = |e: image::ImageError| ImageError::Encode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    match codec {
        ImageFormat::Jpeg => {
            let quality = options.quality.value() as u8;
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            raster.write_with_encoder(encoder).map_err(encode_err)?;
        }
        other => raster.write_to(&mut writer, other).map_err(encode_err)?,
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_png, create_test_rgba_png};
    use tempfile::TempDir;

    fn px(n: u32) -> SizeSpec {
        SizeSpec::pixels(n)
    }

    #[test]
    fn open_missing_file_errors() {
        let result = ImageDocument::open("/nonexistent/image.png");
        assert!(matches!(result, Err(ImageError::SourceNotFound(_))));
    }

    #[test]
    fn open_defers_decoding() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 40, 30);

        let mut doc = ImageDocument::open(&path).unwrap();
        assert!(!doc.is_decoded());
        assert_eq!(doc.width().unwrap(), 40);
        assert!(doc.is_decoded());
        assert_eq!(doc.height().unwrap(), 30);
    }

    #[test]
    fn open_corrupt_file_fails_on_decode() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        fs::write(&path, b"not an image").unwrap();

        let mut doc = ImageDocument::open(&path).unwrap();
        assert!(matches!(doc.dimensions(), Err(ImageError::Decode { .. })));
    }

    #[test]
    fn resize_replaces_raster() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 440, 578);

        let mut doc = ImageDocument::open(&path).unwrap();
        doc.resize("25%".parse().unwrap(), px(110), px(0)).unwrap();
        assert_eq!(doc.dimensions().unwrap(), (110, 110));
    }

    #[test]
    fn resize_zero_by_zero_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        create_test_png(&path, 20, 20);

        let mut doc = ImageDocument::open(&path).unwrap();
        let result = doc.resize(px(0), px(0), px(0));
        assert!(matches!(result, Err(ImageError::InvalidDimensions)));
        assert_eq!(doc.dimensions().unwrap(), (20, 20));
    }

    #[test]
    fn resize_to_zero_width_errors() {
        let mut doc = ImageDocument::from_raster(
            "tall.png",
            DynamicImage::ImageRgb8(image::RgbImage::new(1, 10000)),
        );
        let result = doc.resize(px(0), px(0), px(100));
        assert!(matches!(
            result,
            Err(ImageError::EmptyTarget {
                width: 0,
                height: 100
            })
        ));
    }

    #[test]
    fn operations_chain() {
        let mut doc = ImageDocument::from_raster(
            "mem.png",
            DynamicImage::ImageRgba8(image::RgbaImage::new(80, 40)),
        );
        doc.resize(px(40), px(0), px(0))
            .unwrap()
            .convert(ColorMode::Luma)
            .unwrap()
            .rotate(90.0)
            .unwrap();

        assert_eq!(doc.dimensions().unwrap(), (40, 20));
        assert!(matches!(doc.raster().unwrap(), DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn rotate_arbitrary_angle_keeps_canvas() {
        let mut doc = ImageDocument::from_raster(
            "mem.png",
            DynamicImage::ImageRgb8(image::RgbImage::from_pixel(40, 20, Rgb([255, 255, 255]))),
        );
        doc.rotate(45.0).unwrap();
        assert_eq!(doc.dimensions().unwrap(), (40, 20));

        let rgb = doc.raster().unwrap().to_rgb8();
        // The center stays covered; the corners rotate out and are filled.
        assert!(rgb.get_pixel(20, 10).0.iter().all(|&c| c > 250));
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn rotate_keeps_alpha_layout() {
        let mut doc = ImageDocument::from_raster(
            "mem.png",
            DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(30, 30, Rgba([9, 9, 9, 255]))),
        );
        doc.rotate(-30.0).unwrap();
        let raster = doc.raster().unwrap();
        assert!(matches!(raster, DynamicImage::ImageRgba8(_)));
        assert_eq!(raster.to_rgba8().get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn rotate_quarter_turns() {
        // Top-left marker pixel on a square canvas.
        let mut square = image::RgbImage::new(4, 4);
        square.put_pixel(0, 0, Rgb([255, 0, 0]));
        let mut doc = ImageDocument::from_raster("mem.png", DynamicImage::ImageRgb8(square));

        doc.rotate(90.0).unwrap();
        // Counter-clockwise: top-left moves to bottom-left.
        assert_eq!(doc.raster().unwrap().to_rgb8().get_pixel(0, 3).0, [255, 0, 0]);

        doc.rotate(-90.0).unwrap();
        assert_eq!(doc.raster().unwrap().to_rgb8().get_pixel(0, 0).0, [255, 0, 0]);

        doc.rotate(180.0).unwrap();
        assert_eq!(doc.raster().unwrap().to_rgb8().get_pixel(3, 3).0, [255, 0, 0]);

        doc.rotate(360.0).unwrap();
        assert_eq!(doc.raster().unwrap().to_rgb8().get_pixel(3, 3).0, [255, 0, 0]);
    }

    #[test]
    fn rotate_quarter_turn_on_wide_canvas_keeps_size() {
        let mut doc = ImageDocument::from_raster(
            "mem.png",
            DynamicImage::ImageRgb8(image::RgbImage::new(8, 2)),
        );
        doc.rotate(90.0).unwrap();
        assert_eq!(doc.dimensions().unwrap(), (8, 2));
    }

    #[test]
    fn rotate_rejects_non_finite_angles() {
        let mut doc = ImageDocument::from_raster(
            "mem.png",
            DynamicImage::ImageRgb8(image::RgbImage::new(4, 2)),
        );
        assert!(matches!(
            doc.rotate(f32::NAN),
            Err(ImageError::UnsupportedRotation(_))
        ));
    }

    #[test]
    fn save_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("test.png");
        create_test_png(&source, 32, 32);

        let dest = tmp.path().join("nested/deeper/out.webp");
        let mut doc = ImageDocument::open(&source).unwrap();
        doc.save(&dest, OutputFormat::WebP, &EncodeOptions::default())
            .unwrap();

        assert!(dest.exists());
        assert_eq!(image::image_dimensions(&dest).unwrap(), (32, 32));
    }

    #[test]
    fn save_every_selectable_format() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("alpha.png");
        create_test_rgba_png(&source, 24, 16);

        for format in [
            OutputFormat::Jpeg,
            OutputFormat::Png,
            OutputFormat::WebP,
            OutputFormat::Gif,
            OutputFormat::Tiff,
            OutputFormat::Bmp,
        ] {
            let ext = format.extension().unwrap();
            let dest = tmp.path().join(format!("out.{ext}"));
            let mut doc = ImageDocument::open(&source).unwrap();
            doc.save(&dest, format, &EncodeOptions::default())
                .unwrap_or_else(|e| panic!("saving {format} failed: {e}"));
            assert_eq!(image::image_dimensions(&dest).unwrap(), (24, 16), "{format}");
        }
    }

    #[test]
    fn save_grayscale_as_jpeg_and_webp() {
        let tmp = TempDir::new().unwrap();
        let mut doc = ImageDocument::from_raster(
            "gray.png",
            DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(10, 10)),
        );
        doc.save(
            &tmp.path().join("g.jpg"),
            OutputFormat::Jpeg,
            &EncodeOptions::default(),
        )
        .unwrap();
        doc.save(
            &tmp.path().join("g.webp"),
            OutputFormat::WebP,
            &EncodeOptions::default(),
        )
        .unwrap();
    }

    #[test]
    fn save_default_format_infers_from_extension() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("test.png");
        create_test_png(&source, 16, 16);
        let dest = tmp.path().join("copy.bmp");

        let mut doc = ImageDocument::open(&source).unwrap();
        doc.save(&dest, OutputFormat::Default, &EncodeOptions::default())
            .unwrap();
        assert_eq!(
            ImageReader::open(&dest)
                .unwrap()
                .with_guessed_format()
                .unwrap()
                .format(),
            Some(ImageFormat::Bmp)
        );
    }

    #[test]
    fn save_default_format_without_extension_errors() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("test.png");
        create_test_png(&source, 8, 8);

        let mut doc = ImageDocument::open(&source).unwrap();
        let result = doc.save(
            &tmp.path().join("noext"),
            OutputFormat::Default,
            &EncodeOptions::default(),
        );
        assert!(matches!(result, Err(ImageError::UnknownFormat(_))));
    }

    #[test]
    fn save_to_destination_uses_attached_path() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("test.png");
        create_test_png(&source, 8, 8);
        let dest = tmp.path().join("out/test.png");

        let mut doc = ImageDocument::open(&source)
            .unwrap()
            .with_destination(&dest);
        assert_eq!(doc.destination(), Some(dest.as_path()));
        doc.save_to_destination(OutputFormat::Default, &EncodeOptions::default())
            .unwrap();
        assert!(dest.exists());
    }
}
