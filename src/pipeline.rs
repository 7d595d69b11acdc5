//! Batch processing: walk, transform, resize, save, finalise.
//!
//! ## Phases
//!
//! ```text
//! Init ──▶ Processing ──▶ Finalising (only if needed) ──▶ Done
//!   └──────────┴──────────────┴──────────▶ Failed
//! ```
//!
//! **Processing** walks the input tree (supported extensions only). Each file
//! is opened, run through the pre-processors in order, resized, run through
//! the post-processors in order, and saved to its mirrored output path.
//! Every extension that exposes a finaliser is remembered, once.
//!
//! **Finalising** runs only when some applied extension needs it. It walks
//! the *output* tree and, for every file, calls `finalise` for each
//! remembered extension and re-saves in place. It starts only after every
//! `apply` call of the processing phase has returned.
//!
//! If the finalised count differs from the processed count the output tree
//! changed between the passes; this is reported as a warning event and does
//! not fail the run. Any other error aborts the run.
//!
//! ## Output Paths
//!
//! ```text
//! input/  a/b/photo.png   ──▶  output/a/b/photo.webp   (format = WEBP)
//! input/  c/shot.tiff     ──▶  output/c/shot.jpg       (format = JPEG)
//! ```
//!
//! Sources that differ only by extension (`a.png`, `a.bmp`) map to the same
//! output path. The later one overwrites the earlier and an
//! [`RunEvent::OutputCollision`] warning is emitted.
//!
//! ## Progress
//!
//! The runner reports through an optional [`RunEvent`] channel, the same way
//! the binary's printer consumes it. Passing `None` runs silently.

use crate::config::RunConfig;
use crate::extension::{ExtensionError, ExtensionRegistry};
use crate::imaging::{ImageDocument, ImageError, OutputFormat, SUPPORTED_EXTENSIONS};
use crate::walk::{FileWalker, WalkError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Extension(#[from] ExtensionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Processing,
    Finalising,
    Done,
    Failed,
}

/// Counters for one execution.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunState {
    pub processed: usize,
    pub finalised: usize,
    /// Extensions needing a finalisation pass, in first-applied order.
    pub pending_finalisers: Vec<String>,
}

/// Progress events emitted during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    FileProcessed {
        source: PathBuf,
        output: PathBuf,
        original: (u32, u32),
        resized: (u32, u32),
    },
    ProcessingComplete {
        processed: usize,
    },
    FinalisationStarted {
        extensions: Vec<String>,
    },
    FileFinalised {
        path: PathBuf,
    },
    FinalisationComplete {
        finalised: usize,
    },
    FinalisedCountMismatch {
        finalised: usize,
        processed: usize,
    },
    /// `source` maps to an output already written earlier in the run.
    OutputCollision {
        source: PathBuf,
        output: PathBuf,
    },
}

impl RunEvent {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            RunEvent::FinalisedCountMismatch { .. } | RunEvent::OutputCollision { .. }
        )
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    /// `None` when no finalisation pass was needed.
    pub finalised: Option<usize>,
    pub pending_finalisers: Vec<String>,
}

pub struct PipelineRunner {
    config: RunConfig,
    registry: ExtensionRegistry,
    events: Option<Sender<RunEvent>>,
    phase: Phase,
    state: RunState,
    /// Output paths saved during the processing pass.
    written: HashSet<PathBuf>,
}

impl PipelineRunner {
    pub fn new(
        config: RunConfig,
        registry: ExtensionRegistry,
        events: Option<Sender<RunEvent>>,
    ) -> Self {
        Self {
            config,
            registry,
            events,
            phase: Phase::Init,
            state: RunState::default(),
            written: HashSet::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn registry_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.registry
    }

    /// Run every phase to completion. On error the runner is left in [`Phase::Failed`].
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let result = self.run_phases();
        if result.is_err() {
            self.phase = Phase::Failed;
        }
        result
    }

    fn run_phases(&mut self) -> Result<RunSummary, PipelineError> {
        self.phase = Phase::Processing;
        self.process_images()?;

        let mut finalised = None;
        if !self.state.pending_finalisers.is_empty() {
            self.phase = Phase::Finalising;
            self.finalise_images()?;
            finalised = Some(self.state.finalised);
        }

        self.phase = Phase::Done;
        Ok(RunSummary {
            processed: self.state.processed,
            finalised,
            pending_finalisers: self.state.pending_finalisers.clone(),
        })
    }

    fn process_images(&mut self) -> Result<(), PipelineError> {
        self.written.clear();
        for entry in self.input_walker()?.walk() {
            let source = entry?;
            self.process_file(&source)?;
        }
        self.emit(RunEvent::ProcessingComplete {
            processed: self.state.processed,
        });
        Ok(())
    }

    fn process_file(&mut self, source: &Path) -> Result<(), PipelineError> {
        let config = &self.config;
        let output = output_path(
            &config.input_root,
            &config.output_root,
            source,
            config.format,
        );
        debug!("Processing: {} --> {}", source.display(), output.display());
        if !self.written.insert(output.clone()) {
            warn!(
                "{} overwrites {}, already written this run",
                source.display(),
                output.display()
            );
            self.emit(RunEvent::OutputCollision {
                source: source.to_path_buf(),
                output: output.clone(),
            });
        }

        let mut image = ImageDocument::open(source)?.with_destination(&output);
        let original = image.dimensions()?;

        apply_extensions(
            &mut self.registry,
            &mut self.state.pending_finalisers,
            &config.pre_processors,
            &mut image,
        )?;
        image.resize(config.width, config.height, config.max_size)?;
        apply_extensions(
            &mut self.registry,
            &mut self.state.pending_finalisers,
            &config.post_processors,
            &mut image,
        )?;

        let resized = image.dimensions()?;
        image.save_to_destination(config.format, &config.encode)?;
        self.state.processed += 1;

        self.emit(RunEvent::FileProcessed {
            source: source.to_path_buf(),
            output,
            original,
            resized,
        });
        Ok(())
    }

    fn finalise_images(&mut self) -> Result<(), PipelineError> {
        let walker =
            FileWalker::new(&self.config.output_root)?.filter_by_extension(SUPPORTED_EXTENSIONS);
        self.emit(RunEvent::FinalisationStarted {
            extensions: self.state.pending_finalisers.clone(),
        });

        for entry in walker.walk() {
            let path = entry?;
            let mut image = ImageDocument::open(&path)?;
            for name in &self.state.pending_finalisers {
                self.registry.finalise(name, &mut image)?;
            }
            image.save(&path, OutputFormat::Default, &self.config.encode)?;
            self.state.finalised += 1;
            self.emit(RunEvent::FileFinalised { path });
        }

        let (finalised, processed) = (self.state.finalised, self.state.processed);
        self.emit(RunEvent::FinalisationComplete { finalised });
        if finalised != processed {
            self.emit(RunEvent::FinalisedCountMismatch {
                finalised,
                processed,
            });
        }
        Ok(())
    }

    /// Input walker over supported formats, skipping the output tree when it is nested inside.
    fn input_walker(&self) -> Result<FileWalker, WalkError> {
        let walker = FileWalker::new(&self.config.input_root)?
            .filter_by_extension(SUPPORTED_EXTENSIONS);
        let output_root = self.config.output_root.clone();
        if output_root != self.config.input_root
            && output_root.starts_with(&self.config.input_root)
        {
            return Ok(walker.add_filter(move |path| !path.starts_with(&output_root)));
        }
        Ok(walker)
    }

    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }
}

/// Apply `names` in order, remembering each one that needs finalisation.
fn apply_extensions(
    registry: &mut ExtensionRegistry,
    pending: &mut Vec<String>,
    names: &[String],
    image: &mut ImageDocument,
) -> Result<(), ExtensionError> {
    for name in names {
        registry.apply(name, image)?;
        if registry.has_finaliser(name)? && !pending.contains(name) {
            pending.push(name.clone());
        }
    }
    Ok(())
}

/// Mirror `source` from `input_root` into `output_root` with the format's extension.
pub fn output_path(
    input_root: &Path,
    output_root: &Path,
    source: &Path,
    format: OutputFormat,
) -> PathBuf {
    let relative = source
        .strip_prefix(input_root)
        .ok()
        .or_else(|| source.file_name().map(Path::new))
        .unwrap_or(source);
    let mut output = output_root.join(relative);
    if let Some(ext) = format.extension() {
        output.set_extension(ext);
    }
    output
}
