//! Log writer with rotation support

use logrot_core::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::rotation::{FileRotator, Rotate};

/// Appends to a log file and rotates it once it grows past the threshold.
///
/// The size is read from the filesystem after every write so that bytes
/// appended by other processes count too.
pub struct LogWriter<R: Rotate = FileRotator> {
    path: PathBuf,
    writer: BufWriter<File>,
    rotator: R,
    rotations: u64,
}

impl<R: Rotate> LogWriter<R> {
    /// Create a new log writer
    pub fn new(path: PathBuf, rotator: R) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let writer = BufWriter::new(open_append(&path)?);

        Ok(Self {
            path,
            writer,
            rotator,
            rotations: 0,
        })
    }

    /// Write a line to the log
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.rotate_if_needed()?;
        Ok(())
    }

    /// Write raw bytes
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        self.rotate_if_needed()?;
        Ok(())
    }

    /// Rotate when the file on disk exceeds the threshold.
    /// Returns whether a rotation happened.
    pub fn rotate_if_needed(&mut self) -> Result<bool> {
        if self.current_size() <= self.rotator.threshold_bytes() {
            return Ok(false);
        }

        self.writer.flush()?;
        let report = self.rotator.rotate_file(&self.path);
        for step in report.failures() {
            warn!(
                "Rotation step {:?} for generation {} of {} failed: {:?}",
                step.action,
                step.generation,
                self.path.display(),
                step.outcome
            );
        }

        // A rename leaves our handle on the backup, so always reopen the path
        self.writer = BufWriter::new(open_append(&self.path)?);
        self.rotations += 1;
        debug!(
            "Rotated {} ({} rotations so far)",
            self.path.display(),
            self.rotations
        );

        Ok(true)
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the file on disk, 0 if it is gone
    pub fn current_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Rotations performed by this writer
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    pub fn rotator(&self) -> &R {
        &self.rotator
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
