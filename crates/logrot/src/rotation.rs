//! Size-triggered rotation of a numbered backup chain
//!
//! For a base path `app.log` the chain is `app.log` (generation 0, the active
//! file), `app.log.1`, `app.log.2`, ... `app.log.<max_files>`. A higher number
//! holds older content.

use logrot_core::{ConfigFile, Result, RotatorConfig, GENERATION_SEPARATOR};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::platform::Platform;
use crate::strategy::{self, Strategy};

/// Something that can rotate the file a log writer appends to
pub trait Rotate {
    /// Shift the chain rooted at `path` by one generation.
    /// Filesystem failures are reported, never returned as errors.
    fn rotate_file(&self, path: &Path) -> RotationReport;

    /// Size in bytes past which the active file should be rotated
    fn threshold_bytes(&self) -> u64;
}

/// Path of a generation: the base path itself for 0, `<base>.<n>` otherwise
pub fn generation_path(base: &Path, generation: usize) -> PathBuf {
    if generation == 0 {
        return base.to_path_buf();
    }
    let mut name = base.as_os_str().to_owned();
    name.push(format!("{}{}", GENERATION_SEPARATOR, generation));
    PathBuf::from(name)
}

/// Filesystem action a rotation step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Remove the oldest generation
    Delete,
    /// Move the generation into the next slot
    Advance(Strategy),
    /// Empty the active file after it was advanced
    Truncate,
}

/// What happened to a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The file was not there, nothing was attempted
    Missing,
    Done,
    /// The step failed and was skipped
    Failed(io::ErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub generation: usize,
    pub action: Action,
    pub outcome: StepOutcome,
}

/// Per-step record of one rotation, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationReport {
    pub steps: Vec<Step>,
}

impl RotationReport {
    fn record(&mut self, generation: usize, action: Action, outcome: StepOutcome) {
        self.steps.push(Step {
            generation,
            action,
            outcome,
        });
    }

    /// Steps that were attempted and failed
    pub fn failures(&self) -> impl Iterator<Item = &Step> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Failed(_)))
    }

    /// True when every attempted step succeeded
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Number of generations that were actually moved
    pub fn advanced(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.action, Action::Advance(_)) && s.outcome == StepOutcome::Done)
            .count()
    }

    /// Whether the oldest generation was removed
    pub fn deleted_oldest(&self) -> bool {
        self.steps
            .iter()
            .any(|s| s.action == Action::Delete && s.outcome == StepOutcome::Done)
    }
}

impl From<io::Result<()>> for StepOutcome {
    fn from(result: io::Result<()>) -> Self {
        match result {
            Ok(()) => StepOutcome::Done,
            Err(e) => StepOutcome::Failed(e.kind()),
        }
    }
}

/// Rotates a log file once it grew past the configured size.
///
/// The rotator holds no state besides its settings; everything else lives in the
/// filesystem. Several processes may rotate the same chain at the same time, so
/// missing files and failing steps are expected and never abort a rotation.
#[derive(Debug, Clone)]
pub struct FileRotator {
    config: RotatorConfig,
    strategy: Strategy,
}

impl Default for FileRotator {
    fn default() -> Self {
        Self::new(RotatorConfig::default())
    }
}

impl FileRotator {
    /// Create a rotator for the platform this binary runs on
    pub fn new(config: RotatorConfig) -> Self {
        Self::with_platform(config, Platform::current())
    }

    /// Create a rotator, resolving the default strategy from `platform`
    pub fn with_platform(config: RotatorConfig, platform: Platform) -> Self {
        let rotate_by_copy = config
            .rotate_by_copy()
            .unwrap_or_else(|| platform.default_rotate_by_copy());
        Self {
            strategy: Strategy::from_rotate_by_copy(rotate_by_copy),
            config,
        }
    }

    /// Create a rotator from a logrot.toml/yaml/json file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = ConfigFile::load(path)?.into_config()?;
        Ok(Self::new(config))
    }

    pub fn set_max_file_size(&mut self, max_file_size: u64) -> Result<()> {
        self.config.set_max_file_size(max_file_size)
    }

    pub fn set_max_files(&mut self, max_files: usize) -> Result<()> {
        self.config.set_max_files(max_files)
    }

    /// Size threshold in kilobytes
    pub fn max_file_size(&self) -> u64 {
        self.config.max_file_size()
    }

    pub fn max_files(&self) -> usize {
        self.config.max_files()
    }

    pub fn file_mode(&self) -> Option<u32> {
        self.config.file_mode()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn config(&self) -> &RotatorConfig {
        &self.config
    }

    /// Rotate the chain rooted at `path`.
    ///
    /// Walks generations from `max_files` down to 0 so every destination slot is
    /// freed before the next younger file moves into it. The oldest generation is
    /// deleted; generation 0 is advanced and then emptied in place.
    pub fn rotate(&self, path: &Path) -> RotationReport {
        debug!("Rotating log file: {}", path.display());

        let max_files = self.config.max_files();
        let mut report = RotationReport::default();

        for generation in (0..=max_files).rev() {
            let rotate_file = generation_path(path, generation);
            let action = if generation == max_files {
                Action::Delete
            } else {
                Action::Advance(self.strategy)
            };

            if !rotate_file.is_file() {
                report.record(generation, action, StepOutcome::Missing);
                continue;
            }

            let result = match action {
                Action::Delete => strategy::remove(&rotate_file),
                _ => {
                    let new_file = generation_path(path, generation + 1);
                    self.strategy
                        .advance(&rotate_file, &new_file, self.config.file_mode())
                }
            };
            log_failure(&rotate_file, action, &result);
            report.record(generation, action, result.into());

            if generation == 0 {
                let result = strategy::clear_file(&rotate_file);
                log_failure(&rotate_file, Action::Truncate, &result);
                report.record(generation, Action::Truncate, result.into());
            }
        }

        report
    }
}

impl Rotate for FileRotator {
    fn rotate_file(&self, path: &Path) -> RotationReport {
        self.rotate(path)
    }

    fn threshold_bytes(&self) -> u64 {
        self.config.max_file_size_bytes()
    }
}

fn log_failure(path: &Path, action: Action, result: &io::Result<()>) {
    if let Err(e) = result {
        debug!("Skipping {:?} of {}: {}", action, path.display(), e);
    }
}
