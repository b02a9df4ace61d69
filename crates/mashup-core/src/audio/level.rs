//! Loudness measurement and gain shaping
//!
//! All functions work on interleaved buffers; fades are applied per frame so
//! every channel of a frame gets the same gain.

use super::AudioData;

/// Root-mean-square over every sample of the buffer
pub fn rms(audio: &AudioData) -> f32 {
    if audio.samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = audio.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / audio.samples.len() as f64).sqrt() as f32
}

/// Largest absolute sample value
pub fn peak(audio: &AudioData) -> f32 {
    audio.samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

/// Convert a level in decibels to a linear amplitude factor
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Scale the buffer so its peak sits `headroom_db` below full scale
///
/// Silent buffers are left untouched.
pub fn normalize_peak(audio: &mut AudioData, headroom_db: f32) {
    let current = peak(audio);
    if current <= 0.0 || !current.is_finite() {
        return;
    }
    let gain = db_to_gain(-headroom_db) / current;
    for sample in &mut audio.samples {
        *sample *= gain;
    }
}

/// Linear ramp from silence over the first `duration_ms`
pub fn fade_in(audio: &mut AudioData, duration_ms: u32) {
    let channels = audio.channels.max(1) as usize;
    let fade_frames = fade_length(audio, duration_ms);
    if fade_frames == 0 {
        return;
    }
    for (i, frame) in audio.samples.chunks_mut(channels).take(fade_frames).enumerate() {
        let gain = i as f32 / fade_frames as f32;
        frame.iter_mut().for_each(|s| *s *= gain);
    }
}

/// Linear ramp to silence over the last `duration_ms`
pub fn fade_out(audio: &mut AudioData, duration_ms: u32) {
    let channels = audio.channels.max(1) as usize;
    let fade_frames = fade_length(audio, duration_ms);
    if fade_frames == 0 {
        return;
    }
    let first = audio.num_frames() - fade_frames;
    for (i, frame) in audio.samples.chunks_mut(channels).skip(first).enumerate() {
        let gain = 1.0 - (i + 1) as f32 / fade_frames as f32;
        frame.iter_mut().for_each(|s| *s *= gain);
    }
}

fn fade_length(audio: &AudioData, duration_ms: u32) -> usize {
    audio
        .frames_for(duration_ms as f64 / 1000.0)
        .min(audio.num_frames())
}
