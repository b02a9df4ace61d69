//! Audio validity filter
//!
//! Rejects candidates that are too short to be useful or effectively silent
//! (a corrupted or failed decode usually looks like one of the two).

use crate::audio::level;
use crate::config::MashupConfig;
use crate::error::SkipReason;
use crate::track::Track;

/// What the filter measured on one track
///
/// Kept in place of the decoded audio, so a validated candidate costs a few
/// bytes until it is needed again for extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub label: String,
    pub duration_s: f64,
    pub rms: f32,
}

pub struct ValidityFilter {
    min_duration_s: f64,
    silence_threshold: f32,
}

impl ValidityFilter {
    pub fn new(config: &MashupConfig) -> Self {
        Self {
            min_duration_s: config.thresholds.min_source_duration_s,
            silence_threshold: config.thresholds.silence_threshold,
        }
    }

    pub fn is_valid(&self, track: &Track) -> bool {
        self.check(track).is_ok()
    }

    /// Same decision as [`is_valid`](Self::is_valid), with the reason for a rejection
    pub fn check(&self, track: &Track) -> Result<(), SkipReason> {
        self.validate(track).map(|_| ())
    }

    /// Measure and check a track, returning the measurements on success
    pub fn validate(&self, track: &Track) -> Result<TrackSummary, SkipReason> {
        let summary = Self::measure(track)?;
        self.check_summary(&summary)?;
        Ok(summary)
    }

    /// Duration and RMS of a readable track
    pub fn measure(track: &Track) -> Result<TrackSummary, SkipReason> {
        if !track.is_readable() {
            return Err(SkipReason::Unreadable("no decodable audio".to_string()));
        }
        if track.audio.samples.iter().any(|s| !s.is_finite()) {
            return Err(SkipReason::Unreadable("non-finite samples".to_string()));
        }

        Ok(TrackSummary {
            label: track.label.clone(),
            duration_s: track.duration_s(),
            rms: level::rms(&track.audio),
        })
    }

    /// Threshold decision on earlier measurements
    pub fn check_summary(&self, summary: &TrackSummary) -> Result<(), SkipReason> {
        if summary.duration_s < self.min_duration_s {
            return Err(SkipReason::Invalid(format!(
                "{:.1}s is shorter than {:.1}s",
                summary.duration_s, self.min_duration_s
            )));
        }

        if !(summary.rms >= self.silence_threshold) {
            return Err(SkipReason::Invalid(format!(
                "rms {:.5} below silence threshold {:.5}",
                summary.rms, self.silence_threshold
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioData;

    fn track(seconds: usize, value: f32) -> Track {
        Track::new("t", AudioData::new(vec![value; seconds * 1000], 1000, 1))
    }

    #[test]
    fn test_accepts_long_loud_track() {
        let filter = ValidityFilter::new(&MashupConfig::default());
        assert!(filter.is_valid(&track(30, 0.2)));
    }

    #[test]
    fn test_rejects_short_track() {
        let filter = ValidityFilter::new(&MashupConfig::default());
        assert!(!filter.is_valid(&track(29, 0.2)));
    }

    #[test]
    fn test_rejects_near_silence() {
        let filter = ValidityFilter::new(&MashupConfig::default());
        // 50 on a 16-bit scale, below the 100 threshold
        assert!(!filter.is_valid(&track(60, 50.0 / 32768.0)));
    }

    #[test]
    fn test_fails_closed_on_broken_audio() {
        let filter = ValidityFilter::new(&MashupConfig::default());

        let empty = Track::new("empty", AudioData::new(Vec::new(), 44100, 1));
        assert!(matches!(filter.check(&empty), Err(SkipReason::Unreadable(_))));

        let mut nan = track(40, 0.2);
        nan.audio.samples[10] = f32::NAN;
        assert!(!filter.is_valid(&nan));

        let no_rate = Track::new("bad", AudioData::new(vec![0.5; 100], 0, 1));
        assert!(!filter.is_valid(&no_rate));
    }

    #[test]
    fn test_summary_carries_measurements() {
        let filter = ValidityFilter::new(&MashupConfig::default());
        let summary = filter.validate(&track(45, 0.25)).unwrap();

        assert_eq!(summary.label, "t");
        assert!((summary.duration_s - 45.0).abs() < 1e-9);
        assert!((summary.rms - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_summary_check_matches_track_check() {
        let mut config = MashupConfig::default();
        let filter = ValidityFilter::new(&config);
        let summary = ValidityFilter::measure(&track(40, 0.2)).unwrap();
        assert!(filter.check_summary(&summary).is_ok());

        // Stricter thresholds apply to the stored measurements without decoding
        config.thresholds.min_source_duration_s = 60.0;
        let strict = ValidityFilter::new(&config);
        assert!(matches!(strict.check_summary(&summary), Err(SkipReason::Invalid(_))));
        assert!(!strict.is_valid(&track(40, 0.2)));
    }
}
