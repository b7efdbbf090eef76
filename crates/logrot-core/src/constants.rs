//! Constants and default values for logrot

/// Default maximum active file size in kilobytes (10MB)
pub const DEFAULT_MAX_FILE_SIZE_KB: u64 = 10240;

/// Default number of backup generations to keep
pub const DEFAULT_MAX_FILES: usize = 5;

/// Multiplier from the configured size unit to bytes
pub const BYTES_PER_KB: u64 = 1024;

/// Separator between the base path and the generation number
pub const GENERATION_SEPARATOR: char = '.';

/// Default config file names to search for (in priority order)
pub const CONFIG_FILES: &[&str] = &[
    "logrot.toml",
    "logrot.yaml",
    "logrot.yml",
    "logrot.json",
];

/// Convert a size in kilobytes to bytes, saturating on overflow
pub fn kb_to_bytes(kb: u64) -> u64 {
    kb.saturating_mul(BYTES_PER_KB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_size_is_ten_megabytes() {
        assert_eq!(kb_to_bytes(DEFAULT_MAX_FILE_SIZE_KB), 10 * 1024 * 1024);
    }

    #[test]
    fn test_kb_to_bytes_saturates() {
        assert_eq!(kb_to_bytes(u64::MAX), u64::MAX);
    }
}
