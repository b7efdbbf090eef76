//! logrot - Size-triggered log file rotation
//!
//! A [`FileRotator`] shifts the numbered backups of a log file (`app.log.1`,
//! `app.log.2`, ...) forward by one generation, drops the oldest one, and leaves
//! an empty active file behind. [`LogWriter`] appends to a log file and calls the
//! rotator once the file grows past the configured threshold.

mod platform;
mod rotation;
mod strategy;
mod writer;

pub use platform::Platform;
pub use rotation::{
    generation_path, Action, FileRotator, Rotate, RotationReport, Step, StepOutcome,
};
pub use strategy::Strategy;
pub use writer::LogWriter;

pub use logrot_core::{ConfigFile, Error, Result, RotatorConfig};
