//! Energy profile: per-frame loudness and brightness curve
//!
//! Each frame's energy is the mean of its spectral centroid and its RMS
//! amplitude, each divided by its maximum over the analyzed audio. Frames are
//! centered on multiples of the hop size, with the signal zero-padded by half
//! a frame on both sides.

use crate::audio::resample_to_target;
use crate::config::{AnalysisConfig, MashupConfig};
use crate::error::MashupError;
use crate::track::Track;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Frame-level energy curve of one track
#[derive(Debug, Clone)]
pub struct EnergyProfile {
    /// Combined energy per frame, each in `[0, 1]`
    pub energies: Vec<f32>,
    /// Seconds between consecutive frames
    pub hop_duration_s: f64,
    /// Length of the audio the profile covers
    pub analyzed_duration_s: f64,
}

impl EnergyProfile {
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// Number of frames spanning `seconds`
    pub fn frames_for(&self, seconds: f64) -> usize {
        (seconds / self.hop_duration_s) as usize
    }
}

/// Raw per-frame features before normalization
#[derive(Debug, Clone, Default)]
pub struct FrameFeatures {
    pub centroids: Vec<f32>,
    pub rms: Vec<f32>,
}

pub struct EnergyProfileBuilder {
    config: AnalysisConfig,
}

impl EnergyProfileBuilder {
    pub fn new(config: &MashupConfig) -> Self {
        Self {
            config: config.analysis.clone(),
        }
    }

    /// Build the energy profile of the first `max_duration_s` of a track
    pub fn build(&self, track: &Track) -> Result<EnergyProfile, MashupError> {
        if !track.is_readable() {
            return Err(MashupError::AnalysisFailed(format!(
                "{} has no decodable audio",
                track.label
            )));
        }

        let analyzed = self.prepare(track)?;
        let features = self.compute_features(&analyzed);
        let energies = combine_features(&features)?;

        let sample_rate = self.config.sample_rate as f64;
        let profile = EnergyProfile {
            energies,
            hop_duration_s: self.config.hop_size as f64 / sample_rate,
            analyzed_duration_s: analyzed.len() as f64 / sample_rate,
        };

        log::debug!(
            "Energy profile for {}: {} frames over {:.1}s",
            track.label,
            profile.len(),
            profile.analyzed_duration_s
        );

        Ok(profile)
    }

    /// Mono, truncated to the analysis span and resampled to the analysis rate
    fn prepare(&self, track: &Track) -> Result<Vec<f32>, MashupError> {
        let source_rate = track.audio.sample_rate;
        let max_frames = track.audio.frames_for(self.config.max_duration_s);
        let head = track.audio.slice_frames(0, max_frames);

        let mono = head.to_mono();
        if mono.iter().any(|s| !s.is_finite()) {
            return Err(MashupError::AnalysisFailed(format!(
                "{} contains non-finite samples",
                track.label
            )));
        }

        resample_to_target(&mono, source_rate, self.config.sample_rate)
            .map_err(|e| MashupError::AnalysisFailed(e.to_string()))
    }

    /// Spectral centroid (Hz) and RMS for every centered frame
    pub fn compute_features(&self, samples: &[f32]) -> FrameFeatures {
        let hop_size = self.config.hop_size;
        let frame_size = self.config.frame_size;
        let pad = frame_size / 2;

        let num_frames = 1 + samples.len() / hop_size;

        let mut padded = vec![0.0f32; pad];
        padded.extend_from_slice(samples);
        padded.resize(padded.len() + pad, 0.0);

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);
        let window = create_hann_window(frame_size);
        let bin_hz = self.config.sample_rate as f32 / frame_size as f32;
        let num_bins = frame_size / 2 + 1;

        let mut features = FrameFeatures {
            centroids: Vec::with_capacity(num_frames),
            rms: Vec::with_capacity(num_frames),
        };
        let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];

        for frame_idx in 0..num_frames {
            let start = frame_idx * hop_size;
            let end = (start + frame_size).min(padded.len());
            let frame = &padded[start..end];

            let sum_sq: f32 = frame.iter().map(|s| s * s).sum();
            features.rms.push((sum_sq / frame_size as f32).sqrt());

            for (i, slot) in buffer.iter_mut().enumerate() {
                let s = frame.get(i).copied().unwrap_or(0.0);
                *slot = Complex::new(s * window[i], 0.0);
            }
            fft.process(&mut buffer);

            let mut weighted = 0.0f32;
            let mut total = 0.0f32;
            for (bin, value) in buffer.iter().take(num_bins).enumerate() {
                let magnitude = value.norm();
                weighted += bin as f32 * bin_hz * magnitude;
                total += magnitude;
            }
            features
                .centroids
                .push(if total > 0.0 { weighted / total } else { 0.0 });
        }

        features
    }
}

/// Normalize each feature by its maximum and average the two per frame
pub fn combine_features(features: &FrameFeatures) -> Result<Vec<f32>, MashupError> {
    if features.centroids.is_empty() || features.centroids.len() != features.rms.len() {
        return Err(MashupError::AnalysisFailed(
            "no analysis frames".to_string(),
        ));
    }

    let max_centroid = max_value(&features.centroids);
    let max_rms = max_value(&features.rms);
    if !(max_centroid > 0.0) || !(max_rms > 0.0) {
        return Err(MashupError::AnalysisFailed(
            "audio has no measurable energy".to_string(),
        ));
    }

    Ok(features
        .centroids
        .iter()
        .zip(&features.rms)
        .map(|(&c, &r)| ((c / max_centroid).max(0.0) + (r / max_rms).max(0.0)) / 2.0)
        .collect())
}

fn max_value(values: &[f32]) -> f32 {
    values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// Create a periodic Hann window, as used for STFT analysis
fn create_hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioData;

    fn sine(freq: f32, amplitude: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_hann_window() {
        let window = create_hann_window(512);
        assert_eq!(window.len(), 512);
        assert!((window[0] - 0.0).abs() < 0.001);
        assert!((window[256] - 1.0).abs() < 1e-6);
        // Periodic: the last sample is not a second zero
        assert!(window[511] > 0.0);
        assert!((window[511] - window[1]).abs() < 1e-6);
    }

    #[test]
    fn test_frame_count_and_hop_duration() {
        let config = MashupConfig::default();
        let track = Track::new("tone", AudioData::new(sine(440.0, 0.5, 10.0, 22050), 22050, 1));

        let profile = EnergyProfileBuilder::new(&config).build(&track).unwrap();
        assert_eq!(profile.len(), 1 + 220500 / 512);
        assert!((profile.hop_duration_s - 512.0 / 22050.0).abs() < 1e-12);
        assert!((profile.analyzed_duration_s - 10.0).abs() < 1e-6);
        assert!(profile.energies.iter().all(|&e| (0.0..=1.0).contains(&e)));
    }

    #[test]
    fn test_analysis_is_bounded() {
        let mut config = MashupConfig::default();
        config.analysis.max_duration_s = 4.0;
        let track = Track::new("tone", AudioData::new(sine(440.0, 0.5, 10.0, 22050), 22050, 1));

        let profile = EnergyProfileBuilder::new(&config).build(&track).unwrap();
        assert!((profile.analyzed_duration_s - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_centroid_tracks_frequency() {
        let config = MashupConfig::default();
        let builder = EnergyProfileBuilder::new(&config);

        let low = builder.compute_features(&sine(200.0, 0.5, 1.0, 22050));
        let high = builder.compute_features(&sine(4000.0, 0.5, 1.0, 22050));
        let mid = low.centroids.len() / 2;
        assert!(low.centroids[mid] < 400.0, "low centroid {}", low.centroids[mid]);
        assert!(high.centroids[mid] > 3500.0, "high centroid {}", high.centroids[mid]);
    }

    #[test]
    fn test_louder_frames_score_higher() {
        let config = MashupConfig::default();
        let mut samples = sine(440.0, 0.1, 5.0, 22050);
        samples.extend(sine(440.0, 0.8, 5.0, 22050));
        let track = Track::new("step", AudioData::new(samples, 22050, 1));

        let profile = EnergyProfileBuilder::new(&config).build(&track).unwrap();
        let quarter = profile.len() / 4;
        assert!(profile.energies[3 * quarter] > profile.energies[quarter]);
    }

    #[test]
    fn test_silence_fails_analysis() {
        let config = MashupConfig::default();
        let track = Track::new("silence", AudioData::new(vec![0.0; 22050 * 3], 22050, 1));

        let result = EnergyProfileBuilder::new(&config).build(&track);
        assert!(matches!(result, Err(MashupError::AnalysisFailed(_))));
    }

    #[test]
    fn test_deterministic() {
        let config = MashupConfig::default();
        let track = Track::new("tone", AudioData::new(sine(330.0, 0.4, 3.0, 44100), 44100, 1));
        let builder = EnergyProfileBuilder::new(&config);

        let a = builder.build(&track).unwrap();
        let b = builder.build(&track).unwrap();
        assert_eq!(a.energies, b.energies);
    }
}
