//! CLI output formatting.
//!
//! Every `format_*` function is pure and returns the lines to print, so the
//! exact wording is unit tested. The `print_*` wrappers write them out.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! Processing: photos/2024/beach.png --> photos_resized/2024/beach.webp
//!     1600x1200 → 800x600
//! Processed 12 files.
//! Finalising with: normalize_exposure
//! Finalised: photos_resized/2024/beach.webp
//! Finalised 12 files.
//! ```
//!
//! Warnings go to stderr: a finalised count that differs from the processed
//! count, and two sources resized to the same output path.
//!
//! ```text
//! Finalised 13 files do not match 12 processed files.
//! Overwriting photos_resized/a.webp, already written this run (from photos/a.bmp)
//! ```
//!
//! ## Extensions
//!
//! ```text
//! Available Extensions (Use with the pre and post processor options):
//!   grayscale: Convert image to grayscale format
//!   rgb: Convert image to RGB format
//! ```

use crate::pipeline::{RunEvent, RunSummary};
use std::collections::BTreeMap;

/// Lines for one pipeline event.
pub fn format_run_event(event: &RunEvent) -> Vec<String> {
    match event {
        RunEvent::FileProcessed {
            source,
            output,
            original,
            resized,
        } => vec![
            format!("Processing: {} --> {}", source.display(), output.display()),
            format!(
                "    {}x{} → {}x{}",
                original.0, original.1, resized.0, resized.1
            ),
        ],
        RunEvent::ProcessingComplete { processed } => {
            vec![format!("Processed {} files.", processed)]
        }
        RunEvent::FinalisationStarted { extensions } => {
            vec![format!("Finalising with: {}", extensions.join(", "))]
        }
        RunEvent::FileFinalised { path } => vec![format!("Finalised: {}", path.display())],
        RunEvent::FinalisationComplete { finalised } => {
            vec![format!("Finalised {} files.", finalised)]
        }
        RunEvent::FinalisedCountMismatch {
            finalised,
            processed,
        } => vec![format!(
            "Finalised {} files do not match {} processed files.",
            finalised, processed
        )],
        RunEvent::OutputCollision { source, output } => vec![format!(
            "Overwriting {}, already written this run (from {})",
            output.display(),
            source.display()
        )],
    }
}

/// Print an event. Warnings go to stderr and are shown even when `quiet`.
pub fn print_run_event(event: &RunEvent, quiet: bool) {
    if event.is_warning() {
        for line in format_run_event(event) {
            eprintln!("{}", line);
        }
    } else if !quiet {
        for line in format_run_event(event) {
            println!("{}", line);
        }
    }
}

/// One-line summary of a finished run.
pub fn format_summary(summary: &RunSummary) -> String {
    match summary.finalised {
        Some(finalised) => format!(
            "Done: {} processed, {} finalised",
            summary.processed, finalised
        ),
        None => format!("Done: {} processed", summary.processed),
    }
}

/// Extension listing for `--list-extensions`.
pub fn format_extension_list(extensions: &BTreeMap<String, String>) -> Vec<String> {
    let mut lines =
        vec!["Available Extensions (Use with the pre and post processor options):".to_string()];
    for (name, about) in extensions {
        lines.push(format!("  {}: {}", name, about));
    }
    lines
}

pub fn print_extension_list(extensions: &BTreeMap<String, String>) {
    for line in format_extension_list(extensions) {
        println!("{}", line);
    }
}
