//! formik-to-conform - batch entry point over `formik_conform_codemod::files`.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Args;
use formik_conform_codemod::{files, ConvertOptions};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(args: Args) -> Result<()> {
    let options = match &args.options {
        Some(json) => ConvertOptions::from_json(json).context("bad --options")?,
        None => ConvertOptions::default(),
    };
    let summary = files::convert_dir(&args.dir, &options, args.dry_run)?;
    info!(
        converted = summary.converted.len(),
        unchanged = summary.unchanged.len(),
        failed = summary.failed.len(),
        dry_run = args.dry_run,
        "done"
    );
    Ok(())
}
