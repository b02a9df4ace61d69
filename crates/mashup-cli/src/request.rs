//! Mashup requests as issued by the command-line tools
//!
//! A request names its inputs, how many tracks to use, the segment length and
//! where the result goes. Running it loads candidates through a
//! [`TrackSupply`], runs the pipeline and writes the WAV through a scratch
//! directory, so the final path only ever holds a finished file.

use crate::scratch::{self, ScratchDir};
use anyhow::{bail, Context, Result};
use mashup_core::audio::AudioFormat;
use mashup_core::{MashupConfig, MashupPipeline, ProgressSink, SegmentInfo, TrackFile, TrackSupply};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Accepted ranges for count and duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePolicy {
    /// Interactive tool: more than 10 tracks, segments longer than 20s
    Cli,
    /// Batch runs: 10 to 50 tracks, 20s to 60s segments
    Service,
}

impl RangePolicy {
    pub fn check(&self, count: usize, duration_s: f64) -> Result<()> {
        match self {
            RangePolicy::Cli => {
                if count <= 10 {
                    bail!("count must be greater than 10 (got {})", count);
                }
                if !(duration_s > 20.0) {
                    bail!("duration must be greater than 20 seconds (got {})", duration_s);
                }
            }
            RangePolicy::Service => {
                if !(10..=50).contains(&count) {
                    bail!("count must be between 10 and 50 (got {})", count);
                }
                if !(20.0..=60.0).contains(&duration_s) {
                    bail!("duration must be between 20 and 60 seconds (got {})", duration_s);
                }
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct MashupRequest {
    /// Audio files or directories of audio files
    pub inputs: Vec<PathBuf>,
    /// Number of tracks to gather
    pub count: usize,
    /// Segment length in seconds
    pub duration: f64,
    /// Destination WAV file
    pub output: PathBuf,
    #[serde(default = "default_true")]
    pub intelligent: bool,
    #[serde(default)]
    pub crossfade_ms: Option<u32>,
}

/// Result of a completed request
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub output: PathBuf,
    pub duration_s: f64,
    pub size_bytes: u64,
    pub tracks_received: usize,
    pub tracks_valid: usize,
    pub segments: Vec<SegmentInfo>,
}

impl MashupRequest {
    /// Request settings layered over a base configuration
    pub fn config(&self, base: &MashupConfig) -> MashupConfig {
        let mut config = base.clone();
        config.source.num_candidates = self.count;
        config.extraction.segment_duration_s = self.duration;
        config.extraction.use_intelligent_extraction = self.intelligent;
        if let Some(crossfade_ms) = self.crossfade_ms {
            config.assembly.crossfade_ms = crossfade_ms;
        }
        config
    }

    pub fn run(
        &self,
        base: &MashupConfig,
        policy: RangePolicy,
        progress: &mut dyn ProgressSink,
    ) -> Result<RequestOutcome> {
        policy.check(self.count, self.duration)?;
        check_output_path(&self.output)?;

        let config = self.config(base);
        let pipeline = MashupPipeline::new(config.clone())?;

        let candidates = collect_inputs(&self.inputs)?;
        if candidates.is_empty() {
            bail!("No supported audio files among the inputs");
        }
        log::info!("Found {} candidate files", candidates.len());

        // Only paths and measurements stay resident; each file is decoded
        // again when its segment is cut
        let rate = config.assembly.output_sample_rate;
        let mut supply = TrackSupply::new(
            candidates.into_iter().map(|path| TrackFile::new(path, rate)),
            &config,
        );
        let tracks: Vec<_> = supply.by_ref().collect();
        progress.notify(&format!(
            "Found {} valid tracks ({} candidates tried, {} rejected)",
            tracks.len(),
            supply.attempts(),
            supply.rejected()
        ));

        let report = pipeline.run(tracks, progress)?;

        let scratch = ScratchDir::new()?;
        let staged = scratch.file("mashup.wav");
        let size_bytes = report.mashup.write_wav(&staged)?;
        scratch::persist(&staged, &self.output)?;
        progress.notify(&format!("Saved {}", self.output.display()));

        Ok(RequestOutcome {
            output: self.output.clone(),
            duration_s: report.mashup.duration_s(),
            size_bytes,
            tracks_received: report.tracks_received,
            tracks_valid: report.tracks_valid,
            segments: report.mashup.segments,
        })
    }
}

fn check_output_path(path: &Path) -> Result<()> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if !is_wav {
        bail!("Output file must have a .wav extension: {}", path.display());
    }
    Ok(())
}

/// Expand inputs into an ordered list of decodable files
///
/// Files are kept in the order given; each directory contributes its
/// supported files sorted by name. Subdirectories are not descended.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read directory: {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && AudioFormat::from_path(path).is_supported())
                .collect();
            entries.sort();
            files.extend(entries);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            log::warn!("Input not found: {}", input.display());
        }
    }
    Ok(files)
}
