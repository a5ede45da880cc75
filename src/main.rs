//! tensor-explorer: browse the tensors inside SafeTensors and GGUF files
//!
//! - `tensor-explorer PATHS...` opens the interactive tree browser
//! - `tensor-explorer -v PATHS...` writes a sunburst chart of tensor sizes

use std::process::ExitCode;

use clap::Parser;
use tensor_explorer::cli::{self, Cli, ExplorerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(config: &ExplorerConfig) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let config = ExplorerConfig::from(Cli::parse());
    init_tracing(&config);

    match cli::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}
