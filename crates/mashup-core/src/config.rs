//! Configuration parameters for the mashup pipeline
//!
//! Every field has a default, so a TOML file only needs to name the values
//! it overrides.

use crate::error::MashupError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Silence threshold: an RMS of 100 on a 16-bit scale, expressed in full scale
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 100.0 / 32768.0;

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MashupConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

/// Candidate supply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_num_candidates")]
    pub num_candidates: usize,
    /// Extra candidates that may be tried to make up for rejected ones
    #[serde(default = "default_extra_attempts")]
    pub extra_attempts: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            num_candidates: default_num_candidates(),
            extra_attempts: default_extra_attempts(),
        }
    }
}

fn default_num_candidates() -> usize {
    20
}
fn default_extra_attempts() -> usize {
    10
}

/// Window selection and segment shaping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_segment_duration")]
    pub segment_duration_s: f64,
    /// Spectral energy search instead of the fixed intro-skip offset
    #[serde(default = "default_true")]
    pub use_intelligent_extraction: bool,
    /// Windows never start before this point (skips the intro)
    #[serde(default = "default_intro_skip")]
    pub intro_skip_s: f64,
    /// Margin kept before the end of the audio when a window is pulled back
    #[serde(default = "default_tail_margin")]
    pub tail_margin_s: f64,
    /// Fraction of the track where the proportional fallback starts
    #[serde(default = "default_heuristic_position")]
    pub heuristic_position: f64,
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u32,
    /// Peak headroom left by segment normalization
    #[serde(default = "default_headroom_db")]
    pub headroom_db: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            segment_duration_s: default_segment_duration(),
            use_intelligent_extraction: true,
            intro_skip_s: default_intro_skip(),
            tail_margin_s: default_tail_margin(),
            heuristic_position: default_heuristic_position(),
            fade_ms: default_fade_ms(),
            headroom_db: default_headroom_db(),
        }
    }
}

fn default_segment_duration() -> f64 {
    20.0
}
fn default_true() -> bool {
    true
}
fn default_intro_skip() -> f64 {
    20.0
}
fn default_tail_margin() -> f64 {
    5.0
}
fn default_heuristic_position() -> f64 {
    0.4
}
fn default_fade_ms() -> u32 {
    1000
}
fn default_headroom_db() -> f32 {
    0.1
}

/// Energy profile analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_rate")]
    pub sample_rate: u32,
    /// Only this much of the start of a track is analyzed
    #[serde(default = "default_analysis_duration")]
    pub max_duration_s: f64,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_analysis_rate(),
            max_duration_s: default_analysis_duration(),
            hop_size: default_hop_size(),
            frame_size: default_frame_size(),
        }
    }
}

fn default_analysis_rate() -> u32 {
    22050
}
fn default_analysis_duration() -> f64 {
    180.0
}
fn default_hop_size() -> usize {
    512
}
fn default_frame_size() -> usize {
    2048
}

/// Crossfade merge and output container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    #[serde(default = "default_crossfade_ms")]
    pub crossfade_ms: u32,
    #[serde(default = "default_headroom_db")]
    pub headroom_db: f32,
    /// Rate every track is decoded to, and the rate of the mashup
    #[serde(default = "default_output_rate")]
    pub output_sample_rate: u32,
    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: u16,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            crossfade_ms: default_crossfade_ms(),
            headroom_db: default_headroom_db(),
            output_sample_rate: default_output_rate(),
            bits_per_sample: default_bits_per_sample(),
        }
    }
}

fn default_crossfade_ms() -> u32 {
    500
}
fn default_output_rate() -> u32 {
    44100
}
fn default_bits_per_sample() -> u16 {
    16
}

/// Admission thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_min_source_duration")]
    pub min_source_duration_s: f64,
    /// Full-scale RMS below which audio counts as silent
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f32,
    #[serde(default = "default_min_count")]
    pub min_valid_tracks: usize,
    #[serde(default = "default_min_count")]
    pub min_segments: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_source_duration_s: default_min_source_duration(),
            silence_threshold: default_silence_threshold(),
            min_valid_tracks: default_min_count(),
            min_segments: default_min_count(),
        }
    }
}

fn default_min_source_duration() -> f64 {
    30.0
}
fn default_silence_threshold() -> f32 {
    DEFAULT_SILENCE_THRESHOLD
}
fn default_min_count() -> usize {
    5
}

impl MashupConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: MashupConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        Ok(config)
    }

    /// Attempt budget of the track supply
    pub fn max_attempts(&self) -> usize {
        self.source.num_candidates + self.source.extra_attempts
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), MashupError> {
        let invalid = |msg: &str| -> Result<(), MashupError> {
            Err(MashupError::InvalidConfig(msg.to_string()))
        };

        let ex = &self.extraction;
        if !(ex.segment_duration_s > 0.0) {
            return invalid("segment_duration_s must be > 0");
        }
        if ex.intro_skip_s < 0.0 || ex.tail_margin_s < 0.0 {
            return invalid("intro_skip_s and tail_margin_s must be >= 0");
        }
        if !(0.0..=1.0).contains(&ex.heuristic_position) {
            return invalid("heuristic_position must be within [0, 1]");
        }

        let an = &self.analysis;
        if an.sample_rate == 0 {
            return invalid("analysis sample_rate must be > 0");
        }
        if !(an.max_duration_s > 0.0) {
            return invalid("analysis max_duration_s must be > 0");
        }
        if an.hop_size == 0 || an.frame_size == 0 {
            return invalid("hop_size and frame_size must be > 0");
        }
        if an.hop_size > an.frame_size {
            return invalid("hop_size must be <= frame_size");
        }

        let asm = &self.assembly;
        if asm.output_sample_rate == 0 {
            return invalid("output_sample_rate must be > 0");
        }
        if !matches!(asm.bits_per_sample, 16 | 24) {
            return invalid("bits_per_sample must be 16 or 24");
        }
        if asm.crossfade_ms as f64 / 1000.0 >= ex.segment_duration_s {
            return invalid("crossfade_ms must be shorter than the segment duration");
        }

        if self.thresholds.silence_threshold < 0.0 {
            return invalid("silence_threshold must be >= 0");
        }
        if self.thresholds.min_segments == 0 {
            return invalid("min_segments must be >= 1");
        }

        Ok(())
    }
}
