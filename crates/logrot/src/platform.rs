//! Host filesystem capabilities that pick the default rotation strategy

/// What the host filesystem allows while a log file is held open by a writer.
///
/// Resolved once when a rotator is built, never per rotation. Tests and callers
/// can construct one explicitly to force either behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    renames_open_files: bool,
}

impl Platform {
    pub const fn new(renames_open_files: bool) -> Self {
        Self { renames_open_files }
    }

    /// Capabilities of the platform this binary was built for.
    /// Windows refuses to rename files another process has open.
    pub const fn current() -> Self {
        Self::new(!cfg!(windows))
    }

    pub fn renames_open_files(&self) -> bool {
        self.renames_open_files
    }

    /// Copy-and-truncate is the safe choice when renaming open files fails
    pub fn default_rotate_by_copy(&self) -> bool {
        !self.renames_open_files
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_follows_capability() {
        assert!(Platform::new(false).default_rotate_by_copy());
        assert!(!Platform::new(true).default_rotate_by_copy());
    }

    #[test]
    fn test_current_platform() {
        let platform = Platform::current();
        assert_eq!(platform.renames_open_files(), !cfg!(windows));
        assert_eq!(Platform::default(), platform);
    }
}
