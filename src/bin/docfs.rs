//! docfs CLI Binary
//!
//! Command-line interface over a document tree bound to a local directory.

use anyhow::Context;
use clap::Parser;
use docfs::config::ConfigLoader;
use docfs::logging::init_logging;
use docfs::tooling::cli::{Cli, CliContext};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?;
    if let Err(e) = init_logging(Some(&cli.logging_config(&config.logging))) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let context = CliContext::new(&cli.root, config)
        .with_context(|| format!("binding {}", cli.root.display()))?;
    let output = context.execute(&cli.command)?;
    println!("{}", output);
    Ok(())
}
