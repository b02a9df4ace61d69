//! Decoded source tracks and where they come from

use crate::audio::{self, AudioData};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// One decoded candidate for the mashup
///
/// Tracks are immutable once decoded; the label only identifies the source
/// in logs and reports.
#[derive(Debug, Clone)]
pub struct Track {
    pub label: String,
    pub audio: AudioData,
}

impl Track {
    pub fn new(label: impl Into<String>, audio: AudioData) -> Self {
        Self {
            label: label.into(),
            audio,
        }
    }

    /// Decode a local file, labelling the track with its file name
    pub fn from_file(path: &Path, sample_rate: u32) -> anyhow::Result<Self> {
        let audio = audio::decode_audio(path, sample_rate)?;
        Ok(Self::new(label_for(path), audio))
    }

    pub fn duration_s(&self) -> f64 {
        self.audio.duration_s()
    }

    /// A track can only be analyzed if it has a format and at least one frame
    pub fn is_readable(&self) -> bool {
        self.audio.sample_rate > 0 && self.audio.channels > 0 && self.audio.num_frames() > 0
    }
}

fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Anything the pipeline can obtain a [`Track`] from
///
/// `load` may be called more than once; file-backed sources decode on every
/// call and hold no audio in between.
pub trait TrackSource {
    fn label(&self) -> &str;

    fn load(&self) -> anyhow::Result<Cow<'_, Track>>;

    /// Validity measurements taken earlier, if this source carries them
    fn summary(&self) -> Option<&crate::validity::TrackSummary> {
        None
    }
}

impl TrackSource for Track {
    fn label(&self) -> &str {
        &self.label
    }

    fn load(&self) -> anyhow::Result<Cow<'_, Track>> {
        Ok(Cow::Borrowed(self))
    }
}

/// A track on disk, decoded on demand
#[derive(Debug, Clone)]
pub struct TrackFile {
    path: PathBuf,
    label: String,
    sample_rate: u32,
}

impl TrackFile {
    pub fn new(path: impl Into<PathBuf>, sample_rate: u32) -> Self {
        let path = path.into();
        Self {
            label: label_for(&path),
            path,
            sample_rate,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackSource for TrackFile {
    fn label(&self) -> &str {
        &self.label
    }

    fn load(&self) -> anyhow::Result<Cow<'_, Track>> {
        Track::from_file(&self.path, self.sample_rate).map(Cow::Owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, seconds: usize) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..seconds * 8000 * 2 {
            writer.write_sample(if i % 20 < 10 { 8000i16 } else { -8000 }).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_in_memory_track_is_its_own_source() {
        let track = Track::new("mem", AudioData::new(vec![0.1; 100], 1000, 1));
        let loaded = track.load().unwrap();

        assert!(matches!(loaded, Cow::Borrowed(_)));
        assert_eq!(track.label(), "mem");
        assert!(track.summary().is_none());
    }

    #[test]
    fn test_track_file_decodes_on_each_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.wav");
        write_wav(&path, 2);

        let file = TrackFile::new(&path, 8000);
        assert_eq!(file.label(), "song.wav");

        let first = file.load().unwrap();
        assert_eq!(first.label, "song.wav");
        assert_eq!(first.audio.channels, 1);
        assert_eq!(first.audio.num_frames(), 16000);
        drop(first);

        // The file is read again, not cached
        std::fs::remove_file(&path).unwrap();
        assert!(file.load().is_err());
    }
}
