use clap::Parser;
use eyre::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod defines;
mod rewriter;

use cli::Cli;
use config::ConfigEnvironment;
use defines::DefineTable;
use rewriter::Rewriter;

fn main() -> Result<()> {
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Seed the define table from the configuration environment
    let config = ConfigEnvironment::load(cli.config.as_deref())
        .context("Failed to load configuration environment")?;
    let mut defines = DefineTable::from_config(&config);

    // Command-line defines win over configured ones
    defines.apply_overrides(cli.get_overrides());
    if defines.is_empty() {
        tracing::debug!("define table is empty, every #undef/#cmakedefine stays undefined");
    } else {
        tracing::debug!(count = defines.len(), "define table ready");
    }

    let rewriter = Rewriter::new(&defines);

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            rewriter.process_file(&cli.input, &mut writer)?;
            writer
                .flush()
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        }
        None => {
            let mut writer = io::stdout().lock();
            rewriter.process_file(&cli.input, &mut writer)?;
            writer.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays free for the generated header
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "cmake_define=debug" } else { "cmake_define=warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();
}
