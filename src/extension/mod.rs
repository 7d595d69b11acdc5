//! Named image transforms applied before or after resizing.
//!
//! A transform implements [`Transform`]: an `apply` step run on every image
//! and an `about` description. Transforms that need to see the whole run
//! before they can act also expose a [`Finaliser`] through
//! [`Transform::as_finaliser`]; their `finalise` step runs in a second pass
//! over the written output, after every `apply` call has completed.
//!
//! ## Registry
//!
//! [`ExtensionRegistry`] maps case-sensitive names to transforms. Built-ins
//! are registered as factories and instantiated on first use; the instance
//! is then cached for the rest of the run, so stateful transforms
//! accumulate across files:
//!
//! | Name | Kind | Effect |
//! |---|---|---|
//! | `rgb` | simple | convert to 3-channel color |
//! | `grayscale` | simple | convert to single-channel luminance |
//! | `normalize_exposure` | two-phase | shift every image toward the run's mean brightness |
//!
//! Third-party transforms are added with [`ExtensionRegistry::register`] or
//! [`ExtensionRegistry::register_factory`].

mod grayscale;
mod normalize_exposure;
mod rgb;

pub use grayscale::Grayscale;
pub use normalize_exposure::{NormalizeExposure, mean_brightness};
pub use rgb::Rgb;

use crate::imaging::{ImageDocument, ImageError};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("Extension '{0}' not found")]
    ExtensionNotFound(String),
    #[error("Extension '{0}' is already registered")]
    DuplicateExtension(String),
    #[error("'{0}' is not a valid extension name")]
    InvalidExtensionType(String),
    #[error("Extension '{name}' failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: ImageError,
    },
}

/// An image transform usable as a pre- or post-processor.
pub trait Transform {
    /// One-line description shown by `--list-extensions`.
    fn about(&self) -> &str;

    fn apply(&mut self, image: &mut ImageDocument) -> Result<(), ImageError>;

    /// Second-phase capability. `None` for single-pass transforms.
    fn as_finaliser(&mut self) -> Option<&mut dyn Finaliser> {
        None
    }
}

/// The optional second phase of a two-phase transform.
pub trait Finaliser {
    fn finalise(&mut self, image: &mut ImageDocument) -> Result<(), ImageError>;
}

pub type Factory = fn() -> Box<dyn Transform>;

const BUILTINS: &[(&str, Factory)] = &[
    ("grayscale", || Box::new(Grayscale)),
    ("normalize_exposure", || Box::new(NormalizeExposure::default())),
    ("rgb", || Box::new(Rgb)),
];

pub struct ExtensionRegistry {
    factories: BTreeMap<String, Factory>,
    loaded: HashMap<String, Box<dyn Transform>>,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// A registry with the built-in transforms available.
    pub fn new() -> Self {
        let factories = BUILTINS
            .iter()
            .map(|(name, factory)| (name.to_string(), *factory))
            .collect();
        Self {
            factories,
            loaded: HashMap::new(),
        }
    }

    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
            loaded: HashMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name) || self.loaded.contains_key(name)
    }

    /// Register a transform constructed on first use.
    pub fn register_factory(&mut self, name: &str, factory: Factory) -> Result<(), ExtensionError> {
        self.check_new_name(name)?;
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Register a ready-made transform instance.
    pub fn register(
        &mut self,
        name: &str,
        extension: Box<dyn Transform>,
    ) -> Result<(), ExtensionError> {
        self.check_new_name(name)?;
        self.loaded.insert(name.to_string(), extension);
        Ok(())
    }

    /// The transform registered under `name`, instantiating it if needed.
    pub fn get(&mut self, name: &str) -> Result<&mut dyn Transform, ExtensionError> {
        if !self.loaded.contains_key(name) {
            let factory = self
                .factories
                .get(name)
                .ok_or_else(|| ExtensionError::ExtensionNotFound(name.to_string()))?;
            debug!("Loading extension: {}", name);
            self.loaded.insert(name.to_string(), factory());
        }
        match self.loaded.get_mut(name) {
            Some(extension) => Ok(extension.as_mut()),
            None => Err(ExtensionError::ExtensionNotFound(name.to_string())),
        }
    }

    pub fn apply(&mut self, name: &str, image: &mut ImageDocument) -> Result<(), ExtensionError> {
        debug!("Applying extension: {}", name);
        self.get(name)?
            .apply(image)
            .map_err(|source| ExtensionError::Failed {
                name: name.to_string(),
                source,
            })
    }

    /// Whether `name` needs a finalisation pass. Tracking that is the caller's job.
    pub fn has_finaliser(&mut self, name: &str) -> Result<bool, ExtensionError> {
        Ok(self.get(name)?.as_finaliser().is_some())
    }

    /// Run the second phase of `name`. A no-op for single-pass transforms.
    pub fn finalise(&mut self, name: &str, image: &mut ImageDocument) -> Result<(), ExtensionError> {
        let Some(finaliser) = self.get(name)?.as_finaliser() else {
            return Ok(());
        };
        debug!("Finalising extension: {}", name);
        finaliser
            .finalise(image)
            .map_err(|source| ExtensionError::Failed {
                name: name.to_string(),
                source,
            })
    }

    /// Every available transform, name → description.
    pub fn list_all(&mut self) -> BTreeMap<String, String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.extend(self.loaded.keys().cloned());
        names.sort();
        names.dedup();

        let mut listing = BTreeMap::new();
        for name in names {
            if let Ok(extension) = self.get(&name) {
                let about = extension.about().to_string();
                listing.insert(name, about);
            }
        }
        listing
    }

    fn check_new_name(&self, name: &str) -> Result<(), ExtensionError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ExtensionError::InvalidExtensionType(name.to_string()));
        }
        if self.contains(name) {
            return Err(ExtensionError::DuplicateExtension(name.to_string()));
        }
        Ok(())
    }
}
