//! Audio decoding, resampling and level utilities
//!
//! Supports WAV, MP3, FLAC, OGG, and the audio track of video containers
//! (MP4, MKV, MOV, WebM) using pure Rust decoders.

mod decoder;
pub mod level;
mod resample;
mod video;

pub use decoder::{decode_audio, AudioData};
pub use resample::resample_to_target;
pub use video::extract_audio_from_video;

use std::path::Path;

/// Supported audio and video formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    // Pure audio formats
    Wav,
    Mp3,
    Flac,
    Ogg,

    // Video container formats (extract audio)
    Mp4,
    Mkv,
    Mov,
    Webm,

    Unknown,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            // Audio formats
            Some("wav") | Some("wave") => AudioFormat::Wav,
            Some("mp3") => AudioFormat::Mp3,
            Some("flac") => AudioFormat::Flac,
            Some("ogg") => AudioFormat::Ogg,

            // Video formats
            Some("mp4") | Some("m4a") | Some("m4v") => AudioFormat::Mp4,
            Some("mkv") => AudioFormat::Mkv,
            Some("mov") => AudioFormat::Mov,
            Some("webm") => AudioFormat::Webm,

            _ => AudioFormat::Unknown,
        }
    }

    /// Check if format is a video container
    pub fn is_video_container(&self) -> bool {
        matches!(
            self,
            AudioFormat::Mp4 | AudioFormat::Mkv | AudioFormat::Mov | AudioFormat::Webm
        )
    }

    /// Whether a file with this format can be decoded at all
    pub fn is_supported(&self) -> bool {
        *self != AudioFormat::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioFormat::from_path(Path::new("a/song.MP3")), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_path(Path::new("clip.m4a")), AudioFormat::Mp4);
        assert!(AudioFormat::from_path(Path::new("clip.webm")).is_video_container());
        assert!(!AudioFormat::from_path(Path::new("notes.txt")).is_supported());
    }
}
