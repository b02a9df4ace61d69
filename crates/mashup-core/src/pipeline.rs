//! The segment-selection and assembly pipeline
//!
//! One [`MashupPipeline::run`] call processes its tracks strictly in order on
//! the calling thread. Separate pipeline instances share nothing and can run
//! concurrently.

use crate::assembler::{Assembler, Mashup};
use crate::config::MashupConfig;
use crate::error::{InputStage, MashupError, SkipReason};
use crate::extractor::{Segment, SegmentExtractor};
use crate::locator::{locator_for, WindowLocator};
use crate::track::{Track, TrackSource};
use crate::validity::ValidityFilter;

/// Receiver of human-readable progress messages
pub trait ProgressSink {
    fn notify(&mut self, message: &str);
}

impl<F: FnMut(&str)> ProgressSink for F {
    fn notify(&mut self, message: &str) {
        self(message)
    }
}

/// Discards progress messages
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn notify(&mut self, _message: &str) {}
}

/// Forwards progress messages to the `log` facade
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn notify(&mut self, message: &str) {
        log::info!("{}", message);
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct MashupReport {
    pub mashup: Mashup,
    pub tracks_received: usize,
    pub tracks_valid: usize,
    pub segments_extracted: usize,
}

pub struct MashupPipeline {
    config: MashupConfig,
    filter: ValidityFilter,
    locator: Box<dyn WindowLocator>,
    extractor: SegmentExtractor,
    assembler: Assembler,
}

impl MashupPipeline {
    pub fn new(config: MashupConfig) -> Result<Self, MashupError> {
        config.validate()?;
        let locator = locator_for(&config);
        Ok(Self::with_locator(config, locator))
    }

    /// Pipeline with an explicit window strategy
    pub fn with_locator(config: MashupConfig, locator: Box<dyn WindowLocator>) -> Self {
        Self {
            filter: ValidityFilter::new(&config),
            extractor: SegmentExtractor::new(&config),
            assembler: Assembler::new(&config),
            locator,
            config,
        }
    }

    pub fn config(&self) -> &MashupConfig {
        &self.config
    }

    /// Filter, locate, extract and assemble
    ///
    /// Sources are admitted on their validity measurements first, so the
    /// track floor is checked before any location work. Each admitted source
    /// is then decoded again for its extraction and released before the next
    /// one; at most one decoded track is held at a time. Tracks that fail any
    /// per-track step are dropped. The run fails only when too few tracks or
    /// segments remain, or when assembly fails.
    pub fn run<S: TrackSource>(
        &self,
        sources: impl IntoIterator<Item = S>,
        progress: &mut dyn ProgressSink,
    ) -> Result<MashupReport, MashupError> {
        let thresholds = &self.config.thresholds;

        let mut tracks_received = 0;
        let mut valid = Vec::new();
        for source in sources {
            tracks_received += 1;
            match self.admit(&source) {
                Ok(()) => valid.push(source),
                Err(reason) => {
                    log::warn!("Skipping {}: {}", source.label(), reason);
                    progress.notify(&format!(
                        "Skipping invalid audio {}: {}",
                        source.label(),
                        reason
                    ));
                }
            }
        }

        if valid.len() < thresholds.min_valid_tracks {
            return Err(MashupError::InsufficientInput {
                stage: InputStage::Tracks,
                actual: valid.len(),
                required: thresholds.min_valid_tracks,
            });
        }
        let tracks_valid = valid.len();

        progress.notify(&format!("Extracting {} segments...", self.locator.name()));

        let mut segments = Vec::new();
        for (i, source) in valid.into_iter().enumerate() {
            progress.notify(&format!("Processing audio {}/{}...", i + 1, tracks_valid));

            match self.extract_from(&source) {
                Ok(segment) => {
                    segments.push(segment);
                    progress.notify(&format!("Valid segment {}", segments.len()));
                }
                Err(reason) => {
                    log::warn!("Skipping {}: {}", source.label(), reason);
                    progress.notify(&format!("Skipping {}: {}", source.label(), reason));
                }
            }
        }

        if segments.len() < thresholds.min_segments {
            return Err(MashupError::InsufficientInput {
                stage: InputStage::Segments,
                actual: segments.len(),
                required: thresholds.min_segments,
            });
        }
        let segments_extracted = segments.len();
        progress.notify(&format!("Extracted {} segments", segments_extracted));

        progress.notify(&format!(
            "Merging {} segments with crossfade...",
            segments_extracted
        ));
        let mashup = self.assembler.assemble_with_progress(&segments, |done, total| {
            if done % 3 == 0 {
                progress.notify(&format!("Merging... {}/{}", done, total));
            }
        })?;
        progress.notify(&format!("Mashup assembled: {:.1}s", mashup.duration_s()));

        Ok(MashupReport {
            mashup,
            tracks_received,
            tracks_valid,
            segments_extracted,
        })
    }

    /// Validity decision, decoding only sources that carry no measurements
    fn admit<S: TrackSource>(&self, source: &S) -> Result<(), SkipReason> {
        if let Some(summary) = source.summary() {
            return self.filter.check_summary(summary);
        }
        let track = source
            .load()
            .map_err(|e| SkipReason::Unreadable(format!("{:#}", e)))?;
        self.filter.check(&track)
    }

    /// Decode one source and cut its segment; the audio is released on return
    fn extract_from<S: TrackSource>(&self, source: &S) -> Result<Segment, SkipReason> {
        let track = source
            .load()
            .map_err(|e| SkipReason::Unreadable(format!("{:#}", e)))?;
        self.segment_for(&track)
    }

    /// Locate and extract the segment of one track
    pub fn segment_for(&self, track: &Track) -> Result<Segment, SkipReason> {
        self.extractor.check_length(track)?;

        let duration_s = self.config.extraction.segment_duration_s;
        let window = self
            .locator
            .locate(track, duration_s)
            .map_err(|e| SkipReason::Unreadable(e.to_string()))?;

        self.extractor.extract(track, &window)
    }
}
