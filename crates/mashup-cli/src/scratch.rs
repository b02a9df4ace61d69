//! Per-run scratch storage
//!
//! Every run writes its result into its own temporary directory and only
//! moves the finished file to the requested path. The directory is removed
//! when the run ends, whatever the outcome; removal problems are logged and
//! otherwise ignored.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("mashup_")
            .tempdir()
            .context("Failed to create scratch directory")?;
        log::debug!("Scratch directory: {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::debug!("Could not remove scratch directory {}: {}", path.display(), e);
            }
        }
    }
}

/// Move a finished file to its final location
///
/// Falls back to a copy when the rename crosses file systems. The copy goes
/// through a temporary file next to `to`, so the final path only ever holds
/// the complete file.
pub fn persist(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let source = File::open(from)
        .with_context(|| format!("Failed to open staged file: {}", from.display()))?;
    copy_into_place(source, to)?;
    let _ = std::fs::remove_file(from);
    Ok(())
}

/// Write everything from `reader` to `to`, or leave `to` untouched on error
fn copy_into_place(mut reader: impl Read, to: &Path) -> Result<()> {
    let dir = match to.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".mashup_")
        .suffix(".part")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    std::io::copy(&mut reader, staged.as_file_mut())
        .with_context(|| format!("Failed to write output file: {}", to.display()))?;
    staged
        .as_file()
        .sync_all()
        .with_context(|| format!("Failed to write output file: {}", to.display()))?;

    staged
        .persist(to)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write output file: {}", to.display()))?;
    Ok(())
}
