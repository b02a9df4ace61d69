//! mashup-batch - Run many mashup requests in parallel
//!
//! Reads a TOML manifest of `[[request]]` tables and runs each one as an
//! independent pipeline with its own scratch directory. One JSON result is
//! printed per request, in manifest order.
//!
//! Usage: mashup-batch <manifest.toml>

use anyhow::{Context, Result};
use clap::Parser;
use mashup_cli::output::{error_json, outcome_json};
use mashup_cli::request::{MashupRequest, RangePolicy};
use mashup_core::MashupConfig;
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "mashup-batch")]
#[command(about = "Run a manifest of mashup requests in parallel", long_about = None)]
struct Args {
    /// Manifest with one [[request]] table per mashup
    manifest: PathBuf,

    /// TOML configuration shared by all requests
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of worker threads (default: number of CPUs)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    request: Vec<MashupRequest>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let failed = run_batch(&args.manifest, args.config.as_deref())?;
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Run every request and return how many failed
fn run_batch(manifest_path: &Path, config_path: Option<&Path>) -> Result<usize> {
    let base = match config_path {
        Some(path) => MashupConfig::load(path)?,
        None => MashupConfig::default(),
    };

    let content = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
    let manifest: Manifest = toml::from_str(&content).context("Failed to parse manifest")?;
    log::info!("Running {} requests", manifest.request.len());

    let results: Vec<(String, bool)> = manifest
        .request
        .par_iter()
        .enumerate()
        .map(|(i, request)| {
            let mut progress = |message: &str| log::info!("[request {}] {}", i + 1, message);
            match request.run(&base, RangePolicy::Service, &mut progress) {
                Ok(outcome) => (outcome_json(&outcome).unwrap_or_default(), true),
                Err(e) => {
                    log::warn!("Request {} failed: {:#}", i + 1, e);
                    (error_json(Some(request.output.as_path()), &e).unwrap_or_default(), false)
                }
            }
        })
        .collect();

    let mut failed = 0;
    for (json, ok) in results {
        println!("{}", json);
        if !ok {
            failed += 1;
        }
    }
    Ok(failed)
}
