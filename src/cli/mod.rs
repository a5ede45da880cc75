//! Command-line surface
//!
//! Argument parsing lives here rather than in `main.rs` so the whole
//! resolve → load → present pipeline can be driven from tests.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::{info, warn};

use crate::discover::resolve_paths;
use crate::error::Result;
use crate::loader::{load, LoadReport};
use crate::tui::{self, TuiConfig};
use crate::viz;

/// Browse the tensors inside SafeTensors and GGUF model files
///
/// Examples:
///   tensor-explorer model.safetensors
///   tensor-explorer ./Llama-3-8B/            (uses model.safetensors.index.json)
///   tensor-explorer -r ./checkpoints "extra/*.gguf"
///   tensor-explorer -v model.gguf -o chart.html --no-open
#[derive(Parser, Debug)]
#[command(name = "tensor-explorer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Model files, directories, or glob patterns
    #[arg(value_name = "PATHS", required = true, num_args = 1..)]
    pub paths: Vec<String>,

    /// Search directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Write a sunburst chart instead of starting the browser
    #[arg(short = 'v', long)]
    pub visualize: bool,

    /// HTML output path for --visualize (default: system temp dir)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not open the chart in a web browser
    #[arg(long)]
    pub no_open: bool,

    /// Increase log verbosity (once: info, twice: debug, three times: trace)
    #[arg(long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Resolved run configuration
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Path arguments in command-line order
    pub paths: Vec<String>,
    /// Recurse into directories
    pub recursive: bool,
    /// Produce the chart instead of the browser
    pub visualize: bool,
    /// Chart output path
    pub output: Option<PathBuf>,
    /// Launch the platform opener on the chart
    pub open_browser: bool,
    /// `--verbose` count
    pub verbosity: u8,
    /// Browser settings
    pub tui: TuiConfig,
}

impl From<Cli> for ExplorerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            paths: cli.paths,
            recursive: cli.recursive,
            visualize: cli.visualize,
            output: cli.output,
            open_browser: !cli.no_open,
            verbosity: cli.verbose,
            tui: TuiConfig::default(),
        }
    }
}

impl ExplorerConfig {
    /// Default log filter for this verbosity, used when `RUST_LOG` is unset
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Resolve, load, then browse or chart
///
/// # Errors
///
/// Returns the first fatal error: path resolution, every file failing to
/// decode, a terminal failure, or the chart not being writable.
pub fn run(config: &ExplorerConfig) -> Result<()> {
    let report = load_paths(config)?;
    if config.visualize {
        visualize(&report, config)
    } else {
        tui::run(report, config.tui.clone())
    }
}

/// Resolve the path arguments and load every file they name
///
/// # Errors
///
/// See [`resolve_paths`] and [`load`].
pub fn load_paths(config: &ExplorerConfig) -> Result<LoadReport> {
    let sources = resolve_paths(&config.paths, config.recursive)?;
    info!(files = sources.len(), "resolved paths");
    load(&sources)
}

fn visualize(report: &LoadReport, config: &ExplorerConfig) -> Result<()> {
    let path = viz::write_visualization(&report.tree, &report.metadata, config.output.as_deref())?;
    println!("Visualization saved to {}", path.display());
    if config.open_browser {
        if let Err(e) = viz::open_in_browser(&path) {
            warn!(error = %e, "could not open a browser");
        }
    }
    Ok(())
}
