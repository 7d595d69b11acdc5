use clap::Parser;
use rexize::config::{RunConfig, Settings};
use rexize::extension::ExtensionRegistry;
use rexize::pipeline::{PipelineError, PipelineRunner, RunSummary};
use rexize::output;
use rexize::size::SizeSpec;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for argument, config and validation failures.
const EXIT_STARTUP: u8 = 55;
/// Exit status when processing fails part way through.
const EXIT_RUN: u8 = 1;

#[derive(Parser)]
#[command(name = "rexize")]
#[command(version)]
#[command(about = "Bulk resize and convert images from a folder recursively")]
#[command(long_about = "\
Bulk resize and convert images from a folder recursively

Every JPEG, PNG, WebP, GIF, TIFF and BMP under the input folder is resized
and written to the same relative path under the output folder, with the
extension of the chosen format.

Sizes:
  800      800 pixels
  800px    800 pixels
  50%      half of the original dimension
  0        derive from the other dimension, keeping the aspect ratio

Examples:
  rexize -i photos -W 50%
  rexize -i photos -o thumbs -M 320 -f JPEG --quality 80
  rexize -i photos -H 1080 -P normalize_exposure
  rexize -l

Values in a -C config file (JSON, YAML or TOML) override the flags.")]
struct Cli {
    /// Input folder containing images
    #[arg(short = 'i', long = "input_folder")]
    input_folder: Option<PathBuf>,

    /// Output folder for resized images [default: <input>_resized]
    #[arg(short = 'o', long = "output_folder")]
    output_folder: Option<PathBuf>,

    /// Path to a JSON, YAML or TOML configuration file
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Width to resize the image to. Suffix with % for a percentage
    #[arg(short = 'W', long, default_value = "0")]
    width: SizeSpec,

    /// Height to resize the image to. Suffix with % for a percentage
    #[arg(short = 'H', long, default_value = "0")]
    height: SizeSpec,

    /// Maximum size in pixels for the longer side
    #[arg(short = 'M', long = "max-size", default_value_t = 0)]
    max_size: u32,

    /// Output format: JPEG, PNG, WEBP, GIF, TIFF, BMP
    #[arg(short = 'f', long, default_value = "WEBP")]
    format: String,

    /// Extension applied before resizing (repeatable, runs in order)
    #[arg(short = 'p', long = "pre-processor")]
    pre_processor: Vec<String>,

    /// Extension applied after resizing (repeatable, runs in order)
    #[arg(short = 'P', long = "post-processor")]
    post_processor: Vec<String>,

    /// List all available extensions and exit
    #[arg(short = 'l', long)]
    list_extensions: bool,

    /// Suppress all output messages, except errors
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Verbose output for debugging
    #[arg(long)]
    verbose: bool,

    /// JPEG encoding quality
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: u32,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            input_folder: self.input_folder.clone(),
            output_folder: self.output_folder.clone(),
            width: self.width,
            height: self.height,
            max_size: SizeSpec::pixels(self.max_size),
            format: self.format.clone(),
            pre_processors: self.pre_processor.clone(),
            post_processors: self.post_processor.clone(),
            list_extensions: self.list_extensions,
            quiet: self.quiet,
            verbose: self.verbose,
            quality: self.quality.into(),
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print().ok();
            return if e.exit_code() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_STARTUP)
            };
        }
    };

    let mut settings = cli.settings();
    if let Some(path) = &cli.config {
        if let Err(e) = settings.apply_file(path) {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_STARTUP);
        }
    }

    init_tracing(&settings);

    let mut registry = ExtensionRegistry::new();
    if settings.list_extensions {
        output::print_extension_list(&registry.list_all());
        return ExitCode::SUCCESS;
    }

    let config = match settings.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_STARTUP);
        }
    };
    debug!("Run configuration: {:?}", config);

    match run(config, registry, settings.quiet) {
        Ok(summary) => {
            debug!("{}", output::format_summary(&summary));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_RUN)
        }
    }
}

/// Run the pipeline on this thread while a printer thread drains its events.
fn run(
    config: RunConfig,
    registry: ExtensionRegistry,
    quiet: bool,
) -> Result<RunSummary, PipelineError> {
    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_run_event(&event, quiet);
        }
    });

    let mut runner = PipelineRunner::new(config, registry, Some(tx));
    let result = runner.run();
    // Dropping the runner closes the channel so the printer can finish.
    drop(runner);
    printer.join().ok();
    result
}

/// `RUST_LOG` wins; otherwise the level follows `--quiet`/`--verbose`, and `DEV_MODE` forces debug.
fn init_tracing(settings: &Settings) {
    let default_filter = if std::env::var_os("DEV_MODE").is_some_and(|v| !v.is_empty()) {
        "rexize=debug"
    } else {
        settings.log_filter()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}
