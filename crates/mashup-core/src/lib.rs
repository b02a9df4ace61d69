//! Mashup Core - chorus-window selection and crossfaded assembly
//!
//! Takes decoded tracks of one performer, picks the most energetic window of
//! each, and joins the resulting segments into a single crossfaded mashup.
//!
//! ```no_run
//! use mashup_core::{LogProgress, MashupConfig, MashupPipeline, TrackFile};
//! use std::path::Path;
//!
//! let config = MashupConfig::default();
//! let rate = config.assembly.output_sample_rate;
//! // Files are decoded when needed, one at a time
//! let tracks: Vec<_> = ["a.mp3", "b.mp3", "c.mp3", "d.mp3", "e.mp3"]
//!     .iter()
//!     .map(|p| TrackFile::new(*p, rate))
//!     .collect();
//!
//! let report = MashupPipeline::new(config)?.run(tracks, &mut LogProgress)?;
//! report.mashup.write_wav(Path::new("mashup.wav"))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod assembler;
pub mod audio;
pub mod config;
pub mod error;
pub mod extractor;
pub mod locator;
pub mod pipeline;
pub mod profile;
pub mod source;
pub mod track;
pub mod validity;

pub use assembler::{Assembler, Mashup};
pub use config::MashupConfig;
pub use error::{InputStage, MashupError, SkipReason};
pub use extractor::{Segment, SegmentExtractor, SegmentInfo};
pub use locator::{
    locator_for, FixedOffsetLocator, ProportionalLocator, SpectralLocator, Window, WindowLocator,
};
pub use pipeline::{LogProgress, MashupPipeline, MashupReport, NoProgress, ProgressSink};
pub use profile::{EnergyProfile, EnergyProfileBuilder};
pub use source::{CheckedSource, TrackSupply};
pub use track::{Track, TrackFile, TrackSource};
pub use validity::{TrackSummary, ValidityFilter};
