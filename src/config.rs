//! Run configuration.
//!
//! Settings come from two layers. Command-line flags fill a [`Settings`];
//! an optional config file (`-C`) is then overlaid on top, so any key present
//! in the file wins over the matching flag. [`Settings::resolve`] validates
//! the merged result and produces the immutable [`RunConfig`] the pipeline
//! runs with.
//!
//! ## Config Files
//!
//! JSON, YAML and TOML are accepted, chosen by file extension. Keys are the
//! long flag names with dashes replaced by underscores:
//!
//! ```yaml
//! input_folder: photos
//! output_folder: photos_small
//! width: 50%          # integer pixels or a size token ("800", "800px", "50%")
//! height: 0
//! max_size: 1200
//! format: JPEG        # JPEG, PNG, WEBP, GIF, TIFF, BMP
//! quality: 85
//! pre_processor: [grayscale]
//! post_processor: [normalize_exposure]
//! ```
//!
//! Unknown keys are rejected with `Invalid configuration key: {key}`.
//!
//! ## Validation
//!
//! In order, [`Settings::resolve`] checks that an input folder was given, that
//! at least one of width, height and max-size is non-zero, and that the input
//! folder is a readable directory. The output folder defaults to
//! `<input>_resized`, is created when missing and must be writable.

use crate::imaging::{EncodeOptions, OutputFormat, Quality};
use crate::size::SizeSpec;
use crate::walk::is_readable_dir;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Configuration file {0} is not JSON, YAML or TOML")]
    UnsupportedConfigFile(PathBuf),
    #[error("Invalid configuration key: {0}")]
    InvalidKey(String),
    #[error("Invalid image format")]
    InvalidFormat(String),
    #[error("Input folder is required")]
    MissingInput,
    #[error("At least one of width, height or max-size is required")]
    MissingDimensions,
    #[error("Input folder not found or readable at {0}")]
    InputNotFound(PathBuf),
    #[error("Output folder not writable at {0}")]
    OutputNotWritable(PathBuf),
}

/// Keys a config file may set.
pub const CONFIG_KEYS: &[&str] = &[
    "input_folder",
    "output_folder",
    "width",
    "height",
    "max_size",
    "format",
    "pre_processor",
    "post_processor",
    "list_extensions",
    "quiet",
    "verbose",
    "quality",
];

const DEFAULT_FORMAT: &str = "WEBP";

/// Unvalidated settings, as collected from flags and config files.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input_folder: Option<PathBuf>,
    pub output_folder: Option<PathBuf>,
    pub width: SizeSpec,
    pub height: SizeSpec,
    pub max_size: SizeSpec,
    /// Format name, checked by [`resolve`](Self::resolve).
    pub format: String,
    pub pre_processors: Vec<String>,
    pub post_processors: Vec<String>,
    pub list_extensions: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub quality: Quality,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_folder: None,
            output_folder: None,
            width: SizeSpec::default(),
            height: SizeSpec::default(),
            max_size: SizeSpec::default(),
            format: DEFAULT_FORMAT.to_string(),
            pre_processors: Vec::new(),
            post_processors: Vec::new(),
            list_extensions: false,
            quiet: false,
            verbose: false,
            quality: Quality::default(),
        }
    }
}

/// Values read from a config file. Absent keys leave the flag value alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsOverlay {
    pub input_folder: Option<PathBuf>,
    pub output_folder: Option<PathBuf>,
    pub width: Option<SizeSpec>,
    pub height: Option<SizeSpec>,
    pub max_size: Option<SizeSpec>,
    pub format: Option<String>,
    pub pre_processor: Option<Vec<String>>,
    pub post_processor: Option<Vec<String>>,
    pub list_extensions: Option<bool>,
    pub quiet: Option<bool>,
    pub verbose: Option<bool>,
    pub quality: Option<Quality>,
}

/// Validated configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub width: SizeSpec,
    pub height: SizeSpec,
    pub max_size: SizeSpec,
    pub format: OutputFormat,
    pub pre_processors: Vec<String>,
    pub post_processors: Vec<String>,
    pub encode: EncodeOptions,
}

impl Settings {
    /// Overlay every value present in `overlay` onto these settings.
    pub fn apply(&mut self, overlay: SettingsOverlay) {
        if let Some(v) = overlay.input_folder {
            self.input_folder = Some(v);
        }
        if let Some(v) = overlay.output_folder {
            self.output_folder = Some(v);
        }
        if let Some(v) = overlay.width {
            self.width = v;
        }
        if let Some(v) = overlay.height {
            self.height = v;
        }
        if let Some(v) = overlay.max_size {
            self.max_size = v;
        }
        if let Some(v) = overlay.format {
            self.format = v;
        }
        if let Some(v) = overlay.pre_processor {
            self.pre_processors = v;
        }
        if let Some(v) = overlay.post_processor {
            self.post_processors = v;
        }
        if let Some(v) = overlay.list_extensions {
            self.list_extensions = v;
        }
        if let Some(v) = overlay.quiet {
            self.quiet = v;
        }
        if let Some(v) = overlay.verbose {
            self.verbose = v;
        }
        if let Some(v) = overlay.quality {
            self.quality = v;
        }
    }

    /// Load `path` and overlay it. See [`load_settings_file`].
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let overlay = load_settings_file(path)?;
        self.apply(overlay);
        Ok(())
    }

    /// `tracing` filter directive matching the verbosity flags.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "rexize=debug"
        } else if self.quiet {
            "rexize=error"
        } else {
            "rexize=info"
        }
    }

    /// Validate and produce a [`RunConfig`]. Creates the output folder if needed.
    pub fn resolve(&self) -> Result<RunConfig, ConfigError> {
        let input_root = self.input_folder.clone().ok_or(ConfigError::MissingInput)?;
        if self.width.magnitude() == 0
            && self.height.magnitude() == 0
            && self.max_size.magnitude() == 0
        {
            return Err(ConfigError::MissingDimensions);
        }
        if !is_readable_dir(&input_root) {
            return Err(ConfigError::InputNotFound(input_root));
        }

        let format: OutputFormat = self
            .format
            .parse()
            .map_err(|e: crate::imaging::UnknownFormat| ConfigError::InvalidFormat(e.0))?;

        let output_root = self
            .output_folder
            .clone()
            .unwrap_or_else(|| default_output_folder(&input_root));
        fs::create_dir_all(&output_root)
            .map_err(|_| ConfigError::OutputNotWritable(output_root.clone()))?;
        if !is_writable_dir(&output_root) {
            return Err(ConfigError::OutputNotWritable(output_root));
        }

        Ok(RunConfig {
            input_root,
            output_root,
            width: self.width,
            height: self.height,
            max_size: self.max_size,
            format,
            pre_processors: self.pre_processors.clone(),
            post_processors: self.post_processors.clone(),
            encode: EncodeOptions {
                quality: self.quality,
            },
        })
    }
}

/// `photos` → `photos_resized`.
pub fn default_output_folder(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push("_resized");
    PathBuf::from(name)
}

/// Read a JSON, YAML or TOML config file, rejecting unknown keys.
pub fn load_settings_file(path: &Path) -> Result<SettingsOverlay, ConfigError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let content = fs::read_to_string(path)?;
    let value: serde_json::Value = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content)?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => return Err(ConfigError::UnsupportedConfigFile(path.to_path_buf())),
    };
    parse_overlay(value, path)
}

fn parse_overlay(value: serde_json::Value, path: &Path) -> Result<SettingsOverlay, ConfigError> {
    let serde_json::Value::Object(map) = &value else {
        return Err(ConfigError::UnsupportedConfigFile(path.to_path_buf()));
    };
    if let Some(key) = map.keys().find(|k| !CONFIG_KEYS.contains(&k.as_str())) {
        return Err(ConfigError::InvalidKey(key.clone()));
    }
    Ok(serde_json::from_value(value)?)
}

/// Create and remove a probe file; permission bits alone are unreliable.
fn is_writable_dir(dir: &Path) -> bool {
    let probe = dir.join(".rexize-write-probe");
    match fs::write(&probe, b"") {
        Ok(()) => fs::remove_file(&probe).is_ok(),
        Err(_) => false,
    }
}
