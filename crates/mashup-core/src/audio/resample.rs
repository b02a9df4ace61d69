//! Mono resampling with rubato's FFT resampler

use anyhow::Result;
use rubato::{FftFixedIn, Resampler};

/// Input frames handed to the resampler per call
const CHUNK_SIZE: usize = 1024;

/// Resample mono audio from `from_rate` to `to_rate`
///
/// The resampler's startup delay is trimmed, so the output is time-aligned
/// with the input and holds `len * to_rate / from_rate` samples (rounded).
pub fn resample_to_target(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        anyhow::bail!("Cannot resample from {}Hz to {}Hz", from_rate, to_rate);
    }

    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 2, 1)?;

    let expected_len =
        (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected_len + delay + CHUNK_SIZE);

    let mut position = 0;
    while samples.len() - position >= resampler.input_frames_next() {
        let needed = resampler.input_frames_next();
        let wave_in = vec![samples[position..position + needed].to_vec()];
        let wave_out = resampler.process(&wave_in, None)?;
        output.extend_from_slice(&wave_out[0]);
        position += needed;
    }

    if position < samples.len() {
        let wave_in = vec![samples[position..].to_vec()];
        let wave_out = resampler.process_partial(Some(wave_in.as_slice()), None)?;
        output.extend_from_slice(&wave_out[0]);
    }

    // Flush the delay line with silence
    while output.len() < expected_len + delay {
        let wave_out = resampler.process_partial(None::<&[Vec<f32>]>, None)?;
        if wave_out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&wave_out[0]);
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected_len, 0.0);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_same_rate_is_identity() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_to_target(&input, 44100, 44100).unwrap(), input);
    }

    #[test]
    fn test_downsample_length() {
        let input = vec![0.0f32; 44100];
        let output = resample_to_target(&input, 44100, 22050).unwrap();
        assert_eq!(output.len(), 22050);
    }

    #[test]
    fn test_downsample_keeps_tone_level() {
        let input: Vec<f32> = (0..48000)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 48000.0).sin())
            .collect();
        let output = resample_to_target(&input, 48000, 22050).unwrap();
        assert_eq!(output.len(), 22050);

        // Skip the edges, compare the steady-state peak
        let peak = output[2000..20000]
            .iter()
            .fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.05, "peak was {}", peak);
    }
}
