//! Segment extraction: slice, level-check, normalize and fade a window

use crate::audio::{level, AudioData};
use crate::config::{ExtractionConfig, MashupConfig};
use crate::error::SkipReason;
use crate::locator::Window;
use crate::track::Track;
use serde::Serialize;

/// A processed, fixed-duration slice of one track
#[derive(Debug, Clone)]
pub struct Segment {
    /// Label of the track the segment came from
    pub source: String,
    /// Where in the source track the segment was taken
    pub window: Window,
    pub audio: AudioData,
    /// RMS of the slice before normalization
    pub source_rms: f32,
}

impl Segment {
    pub fn duration_s(&self) -> f64 {
        self.audio.duration_s()
    }

    pub fn info(&self) -> SegmentInfo {
        SegmentInfo {
            source: self.source.clone(),
            start_s: self.window.start_s,
            end_s: self.window.end_s,
            source_rms: self.source_rms,
        }
    }
}

/// Provenance of a segment, for reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentInfo {
    pub source: String,
    pub start_s: f64,
    pub end_s: f64,
    pub source_rms: f32,
}

pub struct SegmentExtractor {
    config: ExtractionConfig,
    silence_threshold: f32,
}

impl SegmentExtractor {
    pub fn new(config: &MashupConfig) -> Self {
        Self {
            config: config.extraction.clone(),
            silence_threshold: config.thresholds.silence_threshold,
        }
    }

    /// Track length needed for a segment: its duration plus the intro skip
    pub fn required_length_s(&self) -> f64 {
        self.config.segment_duration_s + self.config.intro_skip_s
    }

    /// Reject tracks too short to hold a segment past the intro
    pub fn check_length(&self, track: &Track) -> Result<(), SkipReason> {
        let available_s = track.duration_s();
        let required_s = self.required_length_s();
        if available_s < required_s {
            return Err(SkipReason::TooShort {
                available_s,
                required_s,
            });
        }
        Ok(())
    }

    /// Cut the segment for `window` out of `track`
    ///
    /// The result is exactly `segment_duration_s` long (to the sample), peak
    /// normalized and faded at both ends.
    pub fn extract(&self, track: &Track, window: &Window) -> Result<Segment, SkipReason> {
        if !track.is_readable() {
            return Err(SkipReason::Unreadable("no decodable audio".to_string()));
        }
        self.check_length(track)?;

        let duration_s = self.config.segment_duration_s;
        let length_s = track.duration_s();

        let mut start_s = window.start_s.max(0.0);
        if start_s + duration_s > length_s {
            start_s = (length_s - duration_s - self.config.tail_margin_s)
                .max(self.config.intro_skip_s);
        }
        let window = Window::new(start_s, duration_s);

        let audio = &track.audio;
        let start_frame = audio.frames_for(start_s);
        let segment_frames = audio.frames_for(duration_s);
        if start_frame + segment_frames > audio.num_frames() {
            return Err(SkipReason::TooShort {
                available_s: length_s,
                required_s: window.end_s,
            });
        }

        let mut slice = audio.slice_frames(start_frame, start_frame + segment_frames);

        let source_rms = level::rms(&slice);
        if source_rms < self.silence_threshold {
            return Err(SkipReason::Silent {
                rms: source_rms,
                threshold: self.silence_threshold,
            });
        }

        level::normalize_peak(&mut slice, self.config.headroom_db);
        level::fade_in(&mut slice, self.config.fade_ms);
        level::fade_out(&mut slice, self.config.fade_ms);

        log::debug!(
            "Extracted {:.1}s from {} at {:.2}s (rms {:.4})",
            duration_s,
            track.label,
            start_s,
            source_rms
        );

        Ok(Segment {
            source: track.label.clone(),
            window,
            audio: slice,
            source_rms,
        })
    }
}
