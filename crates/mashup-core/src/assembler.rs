//! Mashup assembly: crossfaded concatenation of segments
//!
//! Segments are merged pairwise into an accumulator. At each join the last
//! `crossfade_ms` of the accumulator fades out while the first `crossfade_ms`
//! of the incoming segment fades in, and the two ramps are summed. The
//! finished buffer is peak normalized once more.

use crate::audio::{level, AudioData};
use crate::config::{AssemblyConfig, MashupConfig};
use crate::error::MashupError;
use crate::extractor::{Segment, SegmentInfo};
use std::io::Cursor;
use std::path::Path;

/// The final concatenated track
#[derive(Debug, Clone)]
pub struct Mashup {
    pub audio: AudioData,
    /// Segment provenance in playback order
    pub segments: Vec<SegmentInfo>,
    bits_per_sample: u16,
}

impl Mashup {
    pub fn duration_s(&self) -> f64 {
        self.audio.duration_s()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Encode as a 16- or 24-bit PCM WAV file
    pub fn encode_wav(&self) -> Result<Vec<u8>, MashupError> {
        let max_val = match self.bits_per_sample {
            16 => i16::MAX as f32,
            24 => ((1i32 << 23) - 1) as f32,
            other => {
                return Err(MashupError::AssemblyFailure(format!(
                    "unsupported bit depth: {}",
                    other
                )))
            }
        };
        let spec = hound::WavSpec {
            channels: self.audio.channels,
            sample_rate: self.audio.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(encode_error)?;
            for &sample in &self.audio.samples {
                let value = (sample.clamp(-1.0, 1.0) * max_val).round();
                if self.bits_per_sample == 16 {
                    writer.write_sample(value as i16).map_err(encode_error)?;
                } else {
                    writer.write_sample(value as i32).map_err(encode_error)?;
                }
            }
            writer.finalize().map_err(encode_error)?;
        }

        Ok(cursor.into_inner())
    }

    /// Write the mashup as WAV and return the number of bytes written
    pub fn write_wav(&self, path: &Path) -> Result<u64, MashupError> {
        let bytes = self.encode_wav()?;
        std::fs::write(path, &bytes)?;
        Ok(bytes.len() as u64)
    }
}

fn encode_error(e: hound::Error) -> MashupError {
    MashupError::AssemblyFailure(format!("WAV encoding failed: {}", e))
}

pub struct Assembler {
    config: AssemblyConfig,
}

impl Assembler {
    pub fn new(config: &MashupConfig) -> Self {
        Self {
            config: config.assembly.clone(),
        }
    }

    /// Merge segments in order; any malformed segment aborts the whole merge
    pub fn assemble(&self, segments: &[Segment]) -> Result<Mashup, MashupError> {
        self.assemble_with_progress(segments, |_, _| {})
    }

    /// Like [`assemble`](Self::assemble), calling `on_merge(done, total)`
    /// after every join
    pub fn assemble_with_progress(
        &self,
        segments: &[Segment],
        mut on_merge: impl FnMut(usize, usize),
    ) -> Result<Mashup, MashupError> {
        let (first, rest) = segments
            .split_first()
            .ok_or(MashupError::InsufficientSegments)?;

        let mut mashup = first.audio.clone();
        for (i, segment) in rest.iter().enumerate() {
            crossfade_append(&mut mashup, &segment.audio, self.config.crossfade_ms).map_err(
                |e| MashupError::AssemblyFailure(format!("segment {} ({}): {}", i + 2, segment.source, e)),
            )?;
            on_merge(i + 1, rest.len());
        }

        level::normalize_peak(&mut mashup, self.config.headroom_db);

        log::info!(
            "Assembled {} segments into {:.1}s mashup",
            segments.len(),
            mashup.duration_s()
        );

        Ok(Mashup {
            audio: mashup,
            segments: segments.iter().map(Segment::info).collect(),
            bits_per_sample: self.config.bits_per_sample,
        })
    }
}

/// Overlap-add `next` onto the tail of `acc` with complementary linear ramps
pub fn crossfade_append(acc: &mut AudioData, next: &AudioData, crossfade_ms: u32) -> Result<(), String> {
    if !acc.same_format(next) {
        return Err(format!(
            "format mismatch: {}Hz/{}ch vs {}Hz/{}ch",
            acc.sample_rate, acc.channels, next.sample_rate, next.channels
        ));
    }
    if acc.channels == 0 || acc.samples.len() % acc.channels as usize != 0 {
        return Err("malformed sample buffer".to_string());
    }

    let channels = acc.channels as usize;
    let fade_frames = acc.frames_for(crossfade_ms as f64 / 1000.0);
    if fade_frames > acc.num_frames() || fade_frames > next.num_frames() {
        return Err(format!(
            "crossfade of {} frames is longer than the audio ({} / {} frames)",
            fade_frames,
            acc.num_frames(),
            next.num_frames()
        ));
    }

    let overlap_start = (acc.num_frames() - fade_frames) * channels;
    for frame in 0..fade_frames {
        let alpha = frame as f32 / fade_frames as f32;
        for ch in 0..channels {
            let idx = frame * channels + ch;
            let tail = &mut acc.samples[overlap_start + idx];
            *tail = *tail * (1.0 - alpha) + next.samples[idx] * alpha;
        }
    }
    acc.samples
        .extend_from_slice(&next.samples[fade_frames * channels..]);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Window;
    use approx::assert_relative_eq;

    const RATE: u32 = 1000;

    fn segment(name: &str, value: f32, seconds: f64) -> Segment {
        let frames = (seconds * RATE as f64) as usize;
        Segment {
            source: name.to_string(),
            window: Window::new(20.0, seconds),
            audio: AudioData::new(vec![value; frames], RATE, 1),
            source_rms: value,
        }
    }

    #[test]
    fn test_crossfade_length_conservation() {
        let assembler = Assembler::new(&MashupConfig::default());
        for k in 1..=6 {
            let segments: Vec<_> = (0..k).map(|i| segment(&i.to_string(), 0.5, 20.0)).collect();
            let mashup = assembler.assemble(&segments).unwrap();

            let expected = k as f64 * 20.0 - (k - 1) as f64 * 0.5;
            assert_relative_eq!(mashup.duration_s(), expected, epsilon = 1.0 / RATE as f64);
        }
    }

    #[test]
    fn test_crossfade_blends_linearly() {
        let mut acc = AudioData::new(vec![1.0; 2000], RATE, 1);
        let next = AudioData::new(vec![0.0; 2000], RATE, 1);
        crossfade_append(&mut acc, &next, 500).unwrap();

        assert_eq!(acc.num_frames(), 3500);
        assert_eq!(acc.samples[1499], 1.0);
        assert_eq!(acc.samples[1500], 1.0);
        assert_relative_eq!(acc.samples[1750], 0.5, epsilon = 1e-6);
        assert!(acc.samples[1999] < 0.01);
        assert_eq!(acc.samples[2000], 0.0);
    }

    #[test]
    fn test_order_is_preserved() {
        let assembler = Assembler::new(&MashupConfig::default());
        let segments = vec![
            segment("quiet", 0.1, 5.0),
            segment("loud", 0.9, 5.0),
            segment("medium", 0.4, 5.0),
        ];
        let mashup = assembler.assemble(&segments).unwrap();

        let names: Vec<_> = mashup.segments.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["quiet", "loud", "medium"]);

        // Audio order too: the middle of each part keeps its relative level
        let at = |t: f64| mashup.audio.samples[(t * RATE as f64) as usize];
        assert!(at(2.0) < at(6.5));
        assert!(at(11.0) < at(6.5));
        assert!(at(2.0) < at(11.0));
    }

    #[test]
    fn test_final_normalization() {
        let config = MashupConfig::default();
        let assembler = Assembler::new(&config);
        let mashup = assembler
            .assemble(&[segment("a", 0.2, 5.0), segment("b", 0.4, 5.0)])
            .unwrap();
        assert_relative_eq!(
            level::peak(&mashup.audio),
            level::db_to_gain(-config.assembly.headroom_db),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let assembler = Assembler::new(&MashupConfig::default());
        assert!(matches!(
            assembler.assemble(&[]),
            Err(MashupError::InsufficientSegments)
        ));
    }

    #[test]
    fn test_malformed_segment_aborts() {
        let assembler = Assembler::new(&MashupConfig::default());

        let mut wrong_rate = segment("b", 0.3, 5.0);
        wrong_rate.audio.sample_rate = 2000;
        let result = assembler.assemble(&[segment("a", 0.3, 5.0), wrong_rate]);
        assert!(matches!(result, Err(MashupError::AssemblyFailure(_))));

        let too_short = segment("c", 0.3, 0.2);
        let result = assembler.assemble(&[segment("a", 0.3, 5.0), too_short]);
        assert!(matches!(result, Err(MashupError::AssemblyFailure(_))));
    }

    #[test]
    fn test_progress_callback_counts_merges() {
        let assembler = Assembler::new(&MashupConfig::default());
        let segments: Vec<_> = (0..4).map(|i| segment(&i.to_string(), 0.5, 2.0)).collect();

        let mut calls = Vec::new();
        assembler
            .assemble_with_progress(&segments, |done, total| calls.push((done, total)))
            .unwrap();
        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_wav_encoding() {
        let assembler = Assembler::new(&MashupConfig::default());
        let mashup = assembler
            .assemble(&[segment("a", 0.5, 1.0), segment("b", -0.5, 1.0)])
            .unwrap();

        let bytes = mashup.encode_wav().unwrap();
        let reader = hound::WavReader::new(Cursor::new(&bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len() as usize, mashup.audio.samples.len());
        assert_eq!(bytes.len(), 44 + 2 * mashup.audio.samples.len());
    }

    #[test]
    fn test_unsupported_bit_depth_is_an_error() {
        let mut config = MashupConfig::default();
        config.assembly.bits_per_sample = 0;
        // Built without validate(); encoding must fail cleanly
        let assembler = Assembler::new(&config);
        let mashup = assembler.assemble(&[segment("a", 0.5, 1.0)]).unwrap();

        assert!(matches!(
            mashup.encode_wav(),
            Err(MashupError::AssemblyFailure(_))
        ));
    }

    #[test]
    fn test_wav_encoding_24_bit() {
        let mut config = MashupConfig::default();
        config.assembly.bits_per_sample = 24;
        let mashup = Assembler::new(&config)
            .assemble(&[segment("a", 0.5, 1.0)])
            .unwrap();

        let bytes = mashup.encode_wav().unwrap();
        let reader = hound::WavReader::new(Cursor::new(&bytes)).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 24);
        assert_eq!(reader.len() as usize, mashup.audio.samples.len());
    }
}
