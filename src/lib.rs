//! # Rexize
//!
//! Bulk resize and convert images from a folder, recursively. Every supported
//! image under an input folder is resized, optionally transformed by named
//! extensions, and written to a mirrored tree under an output folder in the
//! chosen format.
//!
//! # Architecture: One Pass, Optional Second Pass
//!
//! ```text
//! 1. Resolve   flags + config file  →  RunConfig        (validation, output folder)
//! 2. Process   input/               →  output/          (pre → resize → post → save)
//! 3. Finalise  output/              →  output/          (only if an extension needs it)
//! ```
//!
//! The finalise pass exists for transforms that need statistics from the whole
//! run, such as exposure normalisation: it starts only after every file of the
//! process pass has been written.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`size`] | `SizeSpec` tokens: `"800"`, `"800px"`, `"50%"` |
//! | [`walk`] | Recursive file enumeration with composable filters |
//! | [`imaging`] | `ImageDocument`, resize planning, format and encoder parameters |
//! | [`extension`] | Named transforms and the registry that loads them |
//! | [`config`] | Flag and config-file settings, validated into a `RunConfig` |
//! | [`pipeline`] | `PipelineRunner`: the process and finalise passes |
//! | [`output`] | CLI output formatting for run events and extension listings |
//!
//! # Design Decisions
//!
//! ## Registry Instead of Plugin Loading
//!
//! Extensions are compiled in and registered by name. Built-ins are factories
//! instantiated on first use; the instance then lives for the whole run, which
//! is what lets a stateful transform accumulate across files. Library users
//! add their own with [`extension::ExtensionRegistry::register`].
//!
//! ## Events, Not a Global Console
//!
//! The pipeline never prints. It sends [`pipeline::RunEvent`]s to an optional
//! channel; the binary formats them with [`output`]. Diagnostics go through
//! `tracing` and are controlled by `--quiet`, `--verbose` or `RUST_LOG`.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and encoding use the `image` crate, with `imageproc`
//! for free-angle rotation, so the binary needs no system libraries.

pub mod config;
pub mod extension;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod size;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
