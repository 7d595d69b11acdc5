//! Size values for width, height and max-size.
//!
//! A size is either an absolute pixel count or a percentage of the source
//! dimension it is resolved against:
//!
//! ```text
//! "640"    → 640 pixels
//! "640px"  → 640 pixels
//! "25%"    → 25% of the reference dimension (truncated)
//! ```

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error(
        "Invalid value for size ({0}): should be a valid integer with optional % or px suffix"
    )]
    InvalidSizeFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeUnit {
    #[default]
    Pixels,
    Percent,
}

/// A width/height/max-size value tagged as pixels or percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "SizeToken")]
pub struct SizeSpec {
    magnitude: u32,
    unit: SizeUnit,
}

impl SizeSpec {
    pub fn pixels(magnitude: u32) -> Self {
        Self {
            magnitude,
            unit: SizeUnit::Pixels,
        }
    }

    pub fn percent(magnitude: u32) -> Self {
        Self {
            magnitude,
            unit: SizeUnit::Percent,
        }
    }

    pub fn magnitude(self) -> u32 {
        self.magnitude
    }

    pub fn unit(self) -> SizeUnit {
        self.unit
    }

    pub fn is_percentage(self) -> bool {
        self.unit == SizeUnit::Percent
    }

    /// Resolve against a source dimension. Percentages truncate, never round.
    pub fn resolve(self, reference: u32) -> u32 {
        match self.unit {
            SizeUnit::Pixels => self.magnitude,
            SizeUnit::Percent => (self.magnitude as f64 / 100.0 * reference as f64) as u32,
        }
    }

    /// Resolve without a reference dimension.
    ///
    /// Used for max-size, which only has meaning in pixels: a percentage
    /// resolves to 0 (no constraint).
    pub fn resolve_absolute(self) -> u32 {
        match self.unit {
            SizeUnit::Pixels => self.magnitude,
            SizeUnit::Percent => 0,
        }
    }
}

impl FromStr for SizeSpec {
    type Err = SizeError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || SizeError::InvalidSizeFormat(token.to_string());

        let (digits, unit) = if let Some(d) = token.strip_suffix('%') {
            (d, SizeUnit::Percent)
        } else if let Some(d) = token.strip_suffix("px") {
            (d, SizeUnit::Pixels)
        } else {
            (token, SizeUnit::Pixels)
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let magnitude = digits.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { magnitude, unit })
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            SizeUnit::Pixels => write!(f, "{}px", self.magnitude),
            SizeUnit::Percent => write!(f, "{}%", self.magnitude),
        }
    }
}

/// Config files may give sizes as bare integers or as tokens.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeToken {
    Number(u32),
    Text(String),
}

impl TryFrom<SizeToken> for SizeSpec {
    type Error = SizeError;

    fn try_from(token: SizeToken) -> Result<Self, Self::Error> {
        match token {
            SizeToken::Number(n) => Ok(SizeSpec::pixels(n)),
            SizeToken::Text(s) => s.parse(),
        }
    }
}
