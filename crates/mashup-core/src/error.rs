//! Error taxonomy for the mashup pipeline
//!
//! Only `InsufficientInput`, `InsufficientSegments` and `AssemblyFailure`
//! ever make a pipeline run fail. Per-track problems are reported as a
//! [`SkipReason`] and absorbed by the pipeline.

use std::fmt;
use thiserror::Error;

/// Which admission threshold a run failed to meet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStage {
    /// Tracks passing the validity filter
    Tracks,
    /// Segments surviving extraction
    Segments,
}

impl fmt::Display for InputStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputStage::Tracks => write!(f, "audio tracks"),
            InputStage::Segments => write!(f, "segments"),
        }
    }
}

/// Errors raised by the core library
#[derive(Debug, Error)]
pub enum MashupError {
    #[error("not enough valid {stage} (got {actual}, need at least {required})")]
    InsufficientInput {
        stage: InputStage,
        actual: usize,
        required: usize,
    },

    #[error("no segments to merge")]
    InsufficientSegments,

    #[error("assembly failed: {0}")]
    AssemblyFailure(String),

    #[error("energy analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("unreadable audio: {0}")]
    UnreadableAudio(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MashupError {
    /// True for the conditions that abort a whole pipeline run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MashupError::InsufficientInput { .. }
                | MashupError::InsufficientSegments
                | MashupError::AssemblyFailure(_)
                | MashupError::InvalidConfig(_)
                | MashupError::Io(_)
        )
    }
}

/// Why a single track was dropped from a run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("failed validity check: {0}")]
    Invalid(String),

    #[error("too short: {available_s:.1}s available, {required_s:.1}s required")]
    TooShort { available_s: f64, required_s: f64 },

    #[error("segment too quiet (rms {rms:.5} < {threshold:.5})")]
    Silent { rms: f32, threshold: f32 },

    #[error("unreadable: {0}")]
    Unreadable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_input_message() {
        let err = MashupError::InsufficientInput {
            stage: InputStage::Segments,
            actual: 3,
            required: 5,
        };
        assert_eq!(
            err.to_string(),
            "not enough valid segments (got 3, need at least 5)"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_analysis_failure_is_not_fatal() {
        assert!(!MashupError::AnalysisFailed("empty".into()).is_fatal());
        assert!(!MashupError::UnreadableAudio("no samples".into()).is_fatal());
    }
}
