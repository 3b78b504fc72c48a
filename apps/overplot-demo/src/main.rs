//! overplot-demo - Overplot-safe scatter walkthrough
//!
//! Samples a Gaussian mixture and writes raw, binned, faceted and contoured
//! tables for an external charting library.
//!
//! Usage: `overplot-demo [config.toml] [--out DIR]`
//!
//! Set `IS_NOT_BINDER=1` to also run the example with >= 10 million points.

mod walkthrough;

use std::path::PathBuf;

use clap::Parser;
use overplot_core::DemoConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use walkthrough::Walkthrough;

#[derive(Parser, Debug)]
#[command(name = "overplot-demo")]
#[command(about = "Prepare overplot-safe tables from a synthetic point mixture")]
struct Args {
    /// TOML configuration file (defaults are used when omitted)
    config: Option<PathBuf>,

    /// Output directory, overriding the configuration
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    config.apply_env();
    if let Some(out) = args.out {
        config.output.dir = out;
    }
    config.validate()?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let report = Walkthrough::new(&config)?.run()?;
    info!(
        files = report.files.len(),
        skipped_rasters = report.skipped_rasters,
        dir = %config.output.dir.display(),
        "walkthrough complete"
    );
    Ok(())
}
