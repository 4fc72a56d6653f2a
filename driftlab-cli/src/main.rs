//! DriftLab CLI — run the metrics pipeline and verify published runs.
//!
//! Commands:
//! - `run` — ingest a CSV series, compute instability metrics, publish the
//!   receipted artifact chain
//! - `verify` — re-check a published run directory and print the box report

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use driftlab_core::config::RunConfig;
use driftlab_runner::{render_report, run_chain, verify_run, RunOutcome};

#[derive(Parser)]
#[command(
    name = "driftlab",
    about = "DriftLab CLI — receipted instability metrics over CSV time series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for a CSV series and publish a receipted run directory.
    Run {
        /// Input CSV with date,value columns.
        #[arg(long)]
        input: PathBuf,

        /// Output run directory. Must be absent or empty.
        #[arg(long)]
        outdir: PathBuf,

        /// Rolling window length. Overrides the config file.
        #[arg(long)]
        window: Option<usize>,

        /// Path to a TOML run configuration.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Re-check a published run directory and print the verification report.
    Verify {
        /// The run directory to verify.
        run_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            outdir,
            window,
            config,
        } => run_cmd(input, outdir, window, config),
        Commands::Verify { run_dir } => verify_cmd(run_dir),
    }
}

fn run_cmd(
    input: PathBuf,
    outdir: PathBuf,
    window: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => RunConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(window) = window {
        config.window = window;
    }

    let input = resolve_input(&input)?;
    let outdir = absolutize(&outdir)?;

    let outcome = run_chain(&input, &outdir, &config)
        .with_context(|| format!("run failed for {}", input.display()))?;

    print_summary(&outcome, &config);
    Ok(())
}

/// Resolve the input to an absolute path, following symlinks. The file
/// must already exist.
fn resolve_input(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path)
        .with_context(|| format!("failed to resolve input path {}", path.display()))
}

/// Anchor a possibly relative path to the current directory. The output
/// directory may not exist yet, so this never touches the filesystem.
fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("failed to resolve current directory")?
            .join(path))
    }
}

fn verify_cmd(run_dir: PathBuf) -> Result<()> {
    let report = verify_run(&run_dir)
        .with_context(|| format!("verification failed for {}", run_dir.display()))?;

    println!("{}", render_report(&report));

    if !report.all_ok() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(outcome: &RunOutcome, config: &RunConfig) {
    println!();
    println!("=== Run Published ===");
    println!("Run dir:   {}", outcome.run_dir.display());
    println!("Rows:      {}", outcome.row_count);
    println!("Window:    {}", config.window);
    println!("Decision:  {}", outcome.decision);
    println!();
    println!("--- Artifacts ---");
    for (name, digest) in &outcome.outputs {
        println!("{name:<22} {digest}");
    }
    println!();
}
