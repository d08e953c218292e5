//! Command-line interface for slide-merge

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use slide_merge::{merge_files, RunConfig};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Generate slides from Excel/CSV data, one slide per row
#[derive(Parser)]
#[command(name = "slide-merge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Template .pptx file
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Data file (.xlsx or .csv)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Output filename, written next to the template
    #[arg(short, long)]
    output: Option<String>,

    /// Directory searched for inputs when -t or -d is omitted
    #[arg(short = 'C', long = "dir", value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    verbose: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let working_dir = match cli.dir {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };

    let mut builder = RunConfig::builder().working_dir(working_dir);
    if let Some(template) = cli.template {
        builder = builder.template(template);
    }
    if let Some(data) = cli.data {
        builder = builder.data(data);
    }
    if let Some(output) = cli.output {
        builder = builder.output(output);
    }
    let config = builder.build();

    let paths = config
        .resolve(Local::now().naive_local())
        .context("Could not determine the input files (use -t/--template and -d/--data)")?;
    let report = merge_files(&paths.template, &paths.data, &paths.output).with_context(|| {
        format!(
            "Failed to merge {} into {}",
            paths.data.display(),
            paths.template.display()
        )
    })?;
    info!(slides = report.slides.len(), "done");

    println!("Created: {}", paths.output.display());
    Ok(())
}
