//! Parameter types for image operations.
//!
//! - [`OutputFormat`]: Target container/codec, or `Default` to infer from the destination path.
//! - [`ColorMode`]: Pixel layout for [`convert`](super::ImageDocument::convert).
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`EncodeOptions`]: Encoder knobs passed to [`save`](super::ImageDocument::save).

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output format. `Default` means "infer from the destination extension".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Default,
    Jpeg,
    Png,
    Bmp,
    Gif,
    Tiff,
    WebP,
}

/// Raised when a format name is not one of the supported encoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl OutputFormat {
    /// Canonical file extension written for this format.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            OutputFormat::Default => None,
            OutputFormat::Jpeg => Some("jpg"),
            OutputFormat::Png => Some("png"),
            OutputFormat::Bmp => Some("bmp"),
            OutputFormat::Gif => Some("gif"),
            OutputFormat::Tiff => Some("tiff"),
            OutputFormat::WebP => Some("webp"),
        }
    }

    /// Resolve to a concrete codec, inferring from `destination` for `Default`.
    pub fn image_format(self, destination: &Path) -> Option<image::ImageFormat> {
        match self {
            OutputFormat::Default => image::ImageFormat::from_path(destination).ok(),
            OutputFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            OutputFormat::Png => Some(image::ImageFormat::Png),
            OutputFormat::Bmp => Some(image::ImageFormat::Bmp),
            OutputFormat::Gif => Some(image::ImageFormat::Gif),
            OutputFormat::Tiff => Some(image::ImageFormat::Tiff),
            OutputFormat::WebP => Some(image::ImageFormat::WebP),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    /// Case-insensitive: `webp`, `WEBP` and `WebP` are all accepted.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_uppercase().as_str() {
            "JPEG" => Ok(OutputFormat::Jpeg),
            "PNG" => Ok(OutputFormat::Png),
            "BMP" => Ok(OutputFormat::Bmp),
            "GIF" => Ok(OutputFormat::Gif),
            "TIFF" => Ok(OutputFormat::Tiff),
            "WEBP" => Ok(OutputFormat::WebP),
            _ => Err(UnknownFormat(name.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Default => "Default",
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Bmp => "BMP",
            OutputFormat::Gif => "GIF",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::WebP => "WEBP",
        };
        f.write_str(name)
    }
}

/// Pixel layout a raster can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// 3-channel color (`RGB`).
    Rgb,
    /// 3-channel color with alpha (`RGBA`).
    Rgba,
    /// Single-channel luminance (`L`).
    Luma,
    /// Luminance with alpha (`LA`).
    LumaAlpha,
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "RGB" => Ok(ColorMode::Rgb),
            "RGBA" => Ok(ColorMode::Rgba),
            "L" => Ok(ColorMode::Luma),
            "LA" => Ok(ColorMode::LumaAlpha),
            other => Err(format!("Unknown color mode: {other}")),
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// Encoder options for [`ImageDocument::save`](super::ImageDocument::save).
///
/// Quality applies to JPEG; the WebP encoder is lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    pub quality: Quality,
}
