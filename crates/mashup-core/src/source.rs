//! Bounded supply of validated tracks
//!
//! Wraps an ordered list of candidate sources. Candidates are decoded one at
//! a time and checked by the validity filter; those that fail to load or fail
//! the filter are skipped. Valid candidates are yielded together with their
//! measurements, and their decoded audio is released straight away. The
//! supply stops once it has yielded the requested number of tracks or used up
//! its attempt budget.

use crate::config::MashupConfig;
use crate::track::{Track, TrackSource};
use crate::validity::{TrackSummary, ValidityFilter};
use std::borrow::Cow;

/// A source that already passed the validity filter
#[derive(Debug, Clone)]
pub struct CheckedSource<S> {
    pub source: S,
    pub summary: TrackSummary,
}

impl<S: TrackSource> TrackSource for CheckedSource<S> {
    fn label(&self) -> &str {
        self.source.label()
    }

    fn load(&self) -> anyhow::Result<Cow<'_, Track>> {
        self.source.load()
    }

    fn summary(&self) -> Option<&TrackSummary> {
        Some(&self.summary)
    }
}

pub struct TrackSupply<I> {
    candidates: I,
    filter: ValidityFilter,
    wanted: usize,
    max_attempts: usize,
    attempts: usize,
    yielded: usize,
    rejected: usize,
}

impl<S, I> TrackSupply<I>
where
    S: TrackSource,
    I: Iterator<Item = S>,
{
    pub fn new(candidates: impl IntoIterator<IntoIter = I>, config: &MashupConfig) -> Self {
        Self {
            candidates: candidates.into_iter(),
            filter: ValidityFilter::new(config),
            wanted: config.source.num_candidates,
            max_attempts: config.max_attempts(),
            attempts: 0,
            yielded: 0,
            rejected: 0,
        }
    }

    /// Candidates tried so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Candidates that failed to load or were invalid
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl<S, I> Iterator for TrackSupply<I>
where
    S: TrackSource,
    I: Iterator<Item = S>,
{
    type Item = CheckedSource<S>;

    fn next(&mut self) -> Option<CheckedSource<S>> {
        while self.yielded < self.wanted && self.attempts < self.max_attempts {
            let candidate = self.candidates.next()?;
            self.attempts += 1;

            let verdict = match candidate.load() {
                Ok(track) => self.filter.validate(&track),
                Err(e) => {
                    log::warn!("Candidate {} failed to load: {:#}", candidate.label(), e);
                    self.rejected += 1;
                    continue;
                }
            };

            let summary = match verdict {
                Ok(summary) => summary,
                Err(reason) => {
                    log::warn!("Skipping invalid audio {}: {}", candidate.label(), reason);
                    self.rejected += 1;
                    continue;
                }
            };

            self.yielded += 1;
            log::info!(
                "Valid audio {}/{}: {} ({:.1}s)",
                self.yielded,
                self.wanted,
                summary.label,
                summary.duration_s
            );
            return Some(CheckedSource {
                source: candidate,
                summary,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioData;
    use std::cell::Cell;

    fn config(wanted: usize, extra: usize) -> MashupConfig {
        let mut config = MashupConfig::default();
        config.source.num_candidates = wanted;
        config.source.extra_attempts = extra;
        config
    }

    /// Seconds of audio to produce, or `None` for a load failure
    struct Candidate {
        label: String,
        seconds: Option<f64>,
        loads: Cell<usize>,
    }

    fn candidates(lengths: &[Option<f64>]) -> Vec<Candidate> {
        lengths
            .iter()
            .map(|&seconds| Candidate {
                label: match seconds {
                    Some(s) => format!("{}s", s),
                    None => "broken".to_string(),
                },
                seconds,
                loads: Cell::new(0),
            })
            .collect()
    }

    impl TrackSource for Candidate {
        fn label(&self) -> &str {
            &self.label
        }

        fn load(&self) -> anyhow::Result<Cow<'_, Track>> {
            self.loads.set(self.loads.get() + 1);
            match self.seconds {
                Some(seconds) => {
                    let n = (seconds * 1000.0) as usize;
                    let audio = AudioData::new(vec![0.2; n], 1000, 1);
                    Ok(Cow::Owned(Track::new(self.label.clone(), audio)))
                }
                None => anyhow::bail!("download failed"),
            }
        }
    }

    #[test]
    fn test_stops_at_requested_count() {
        let mut supply = TrackSupply::new(candidates(&[Some(40.0); 10]), &config(3, 10));
        let valid: Vec<_> = supply.by_ref().collect();
        assert_eq!(valid.len(), 3);
        assert_eq!(supply.attempts(), 3);
    }

    #[test]
    fn test_skips_failures_and_invalid_audio() {
        let list = candidates(&[Some(40.0), None, Some(10.0), Some(50.0), Some(60.0)]);
        let mut supply = TrackSupply::new(list, &config(3, 10));
        let labels: Vec<_> = supply.by_ref().map(|c| c.summary.label).collect();

        assert_eq!(labels, vec!["40s", "50s", "60s"]);
        assert_eq!(supply.rejected(), 2);
        assert_eq!(supply.attempts(), 5);
    }

    #[test]
    fn test_yields_measurements_not_audio() {
        let mut supply = TrackSupply::new(candidates(&[Some(45.0)]), &config(1, 0));
        let checked = supply.next().unwrap();

        assert!((checked.summary.duration_s - 45.0).abs() < 1e-9);
        assert!((checked.summary.rms - 0.2).abs() < 1e-6);
        assert_eq!(checked.source.loads.get(), 1);
        assert!(checked.summary().is_some());
    }

    #[test]
    fn test_attempt_budget_is_bounded() {
        let mut lengths = vec![None; 5];
        lengths.extend(vec![Some(40.0); 5]);
        let mut supply = TrackSupply::new(candidates(&lengths), &config(2, 4));

        let valid: Vec<_> = supply.by_ref().collect();
        // 6 attempts allowed: 5 failures, then one good track
        assert_eq!(valid.len(), 1);
        assert_eq!(supply.attempts(), 6);
    }

    #[test]
    fn test_exhausted_candidates_end_supply() {
        let supply = TrackSupply::new(candidates(&[Some(45.0)]), &config(5, 10));
        assert_eq!(supply.count(), 1);
    }
}
