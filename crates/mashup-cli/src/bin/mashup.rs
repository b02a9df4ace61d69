//! mashup - Build a crossfaded mashup from a set of tracks
//!
//! Picks the most energetic window of each track and joins the segments with
//! short crossfades into one WAV file. Progress goes to stderr, the JSON
//! result to stdout.
//!
//! Usage: mashup <inputs...> --count <N> --duration <S> --output <out.wav>

use anyhow::Result;
use clap::Parser;
use mashup_cli::output::{print_json_error, print_json_outcome};
use mashup_cli::request::{MashupRequest, RangePolicy};
use mashup_core::MashupConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mashup")]
#[command(about = "Create a crossfaded mashup of the loudest parts of each track", long_about = None)]
struct Args {
    /// Audio files or directories of audio files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of tracks to use (must be > 10)
    #[arg(short, long)]
    count: usize,

    /// Segment duration in seconds (must be > 20)
    #[arg(short, long)]
    duration: f64,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Cut at a fixed offset instead of searching for the loudest window
    #[arg(long)]
    standard: bool,

    /// Crossfade length in milliseconds
    #[arg(long)]
    crossfade_ms: Option<u32>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Default: no logs (clean JSON output for parsing)
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    if let Err(e) = run_mashup(&args) {
        print_json_error(Some(args.output.as_path()), &e);
        std::process::exit(1);
    }
}

fn run_mashup(args: &Args) -> Result<()> {
    let base = match &args.config {
        Some(path) => MashupConfig::load(path)?,
        None => MashupConfig::default(),
    };

    let request = MashupRequest {
        inputs: args.inputs.clone(),
        count: args.count,
        duration: args.duration,
        output: args.output.clone(),
        intelligent: !args.standard,
        crossfade_ms: args.crossfade_ms,
    };

    let mut progress = |message: &str| eprintln!("  {}", message);
    let outcome = request.run(&base, RangePolicy::Cli, &mut progress)?;
    print_json_outcome(&outcome);

    Ok(())
}
