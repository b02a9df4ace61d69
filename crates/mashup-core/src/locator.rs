//! Window location: which part of a track becomes its segment
//!
//! Three strategies share the [`WindowLocator`] interface:
//!
//! - [`SpectralLocator`] slides a window over the track's energy profile and
//!   picks the most energetic span (the chorus, usually). If analysis fails it
//!   falls back to the proportional strategy.
//! - [`ProportionalLocator`] starts at a fixed fraction of the track (40%).
//! - [`FixedOffsetLocator`] starts right after the intro skip.
//!
//! All of them pass their raw start through the same [`WindowGuards`].

use crate::config::MashupConfig;
use crate::error::MashupError;
use crate::profile::{EnergyProfile, EnergyProfileBuilder};
use crate::track::Track;
use serde::Serialize;

/// Half-open time interval `[start_s, end_s)` within a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Window {
    pub start_s: f64,
    pub end_s: f64,
}

impl Window {
    pub fn new(start_s: f64, duration_s: f64) -> Self {
        Self {
            start_s,
            end_s: start_s + duration_s,
        }
    }

    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }

    pub fn start_ms(&self) -> u64 {
        (self.start_s * 1000.0).round() as u64
    }

    pub fn contains(&self, time_s: f64) -> bool {
        time_s >= self.start_s && time_s < self.end_s
    }
}

/// Boundary rules applied to every candidate start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowGuards {
    pub intro_skip_s: f64,
    pub tail_margin_s: f64,
}

impl WindowGuards {
    pub fn new(config: &MashupConfig) -> Self {
        Self {
            intro_skip_s: config.extraction.intro_skip_s,
            tail_margin_s: config.extraction.tail_margin_s,
        }
    }

    /// Pull a window that would overrun `available_s` back (keeping the tail
    /// margin), then push anything starting inside the intro forward.
    ///
    /// The intro rule wins, so on audio shorter than
    /// `intro_skip + duration + margin` the window may still overrun.
    pub fn apply(&self, start_s: f64, duration_s: f64, available_s: f64) -> f64 {
        let mut start = start_s;
        if start + duration_s > available_s {
            start = (available_s - duration_s - self.tail_margin_s).max(0.0);
        }
        if start < self.intro_skip_s {
            start = self.intro_skip_s;
        }
        start
    }
}

/// Strategy for choosing the window of a track
pub trait WindowLocator: Send + Sync {
    /// Short name used in logs and progress messages
    fn name(&self) -> &'static str;

    /// Choose a window of `duration_s` seconds
    ///
    /// Fails only with [`MashupError::UnreadableAudio`] for a track without
    /// decodable audio.
    fn locate(&self, track: &Track, duration_s: f64) -> Result<Window, MashupError>;
}

fn ensure_readable(track: &Track) -> Result<(), MashupError> {
    if track.is_readable() {
        Ok(())
    } else {
        Err(MashupError::UnreadableAudio(format!(
            "{} has no decodable audio",
            track.label
        )))
    }
}

/// Energy-peak search over the track's profile
pub struct SpectralLocator {
    builder: EnergyProfileBuilder,
    guards: WindowGuards,
    fallback: ProportionalLocator,
}

impl SpectralLocator {
    pub fn new(config: &MashupConfig) -> Self {
        Self {
            builder: EnergyProfileBuilder::new(config),
            guards: WindowGuards::new(config),
            fallback: ProportionalLocator::new(config),
        }
    }

    /// Start time of the most energetic window in a profile, before guards
    pub fn peak_start(profile: &EnergyProfile, duration_s: f64) -> f64 {
        let window_frames = profile.frames_for(duration_s);
        let start_frame = loudest_window(&profile.energies, window_frames);
        start_frame as f64 * profile.hop_duration_s
    }
}

impl WindowLocator for SpectralLocator {
    fn name(&self) -> &'static str {
        "intelligent"
    }

    fn locate(&self, track: &Track, duration_s: f64) -> Result<Window, MashupError> {
        ensure_readable(track)?;

        match self.builder.build(track) {
            Ok(profile) => {
                let raw = Self::peak_start(&profile, duration_s);
                let start = self.guards.apply(raw, duration_s, profile.analyzed_duration_s);
                log::debug!(
                    "{}: energy peak at {:.2}s, window starts at {:.2}s",
                    track.label,
                    raw,
                    start
                );
                Ok(Window::new(start, duration_s))
            }
            Err(e) => {
                log::warn!(
                    "Chorus detection failed for {}, using proportional fallback: {}",
                    track.label,
                    e
                );
                self.fallback.locate(track, duration_s)
            }
        }
    }
}

/// Start offset of the highest-mean window of `window_frames` frames
///
/// Candidate starts are `0..len - window_frames`; the window flush with the
/// last frame is not considered. The scan runs left to right and only
/// replaces the best on a strictly greater mean, so the earliest of equal
/// windows wins. A window as long as the profile or longer (or an empty one)
/// yields 0.
pub fn loudest_window(energies: &[f32], window_frames: usize) -> usize {
    if window_frames == 0 || window_frames > energies.len() {
        return 0;
    }

    let mut prefix = Vec::with_capacity(energies.len() + 1);
    prefix.push(0.0f64);
    for &e in energies {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + e as f64);
    }

    let mut best_start = 0;
    let mut best_mean = f64::NEG_INFINITY;
    for start in 0..(energies.len() - window_frames) {
        let mean = (prefix[start + window_frames] - prefix[start]) / window_frames as f64;
        if mean > best_mean {
            best_mean = mean;
            best_start = start;
        }
    }
    best_start
}

/// Start at a fixed fraction of the track
pub struct ProportionalLocator {
    position: f64,
    guards: WindowGuards,
}

impl ProportionalLocator {
    pub fn new(config: &MashupConfig) -> Self {
        Self {
            position: config.extraction.heuristic_position,
            guards: WindowGuards::new(config),
        }
    }
}

impl WindowLocator for ProportionalLocator {
    fn name(&self) -> &'static str {
        "proportional"
    }

    fn locate(&self, track: &Track, duration_s: f64) -> Result<Window, MashupError> {
        ensure_readable(track)?;

        let length_s = track.duration_s();
        if !length_s.is_finite() {
            return Ok(Window::new(self.guards.intro_skip_s, duration_s));
        }

        let start = self.guards.apply(length_s * self.position, duration_s, length_s);
        Ok(Window::new(start, duration_s))
    }
}

/// Start right after the intro, the non-analyzing "standard" mode
pub struct FixedOffsetLocator {
    guards: WindowGuards,
}

impl FixedOffsetLocator {
    pub fn new(config: &MashupConfig) -> Self {
        Self {
            guards: WindowGuards::new(config),
        }
    }
}

impl WindowLocator for FixedOffsetLocator {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn locate(&self, track: &Track, duration_s: f64) -> Result<Window, MashupError> {
        ensure_readable(track)?;

        let start = self
            .guards
            .apply(self.guards.intro_skip_s, duration_s, track.duration_s());
        Ok(Window::new(start, duration_s))
    }
}

/// Locator selected by `use_intelligent_extraction`
pub fn locator_for(config: &MashupConfig) -> Box<dyn WindowLocator> {
    if config.extraction.use_intelligent_extraction {
        Box::new(SpectralLocator::new(config))
    } else {
        Box::new(FixedOffsetLocator::new(config))
    }
}
