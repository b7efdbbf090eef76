//! Rotation configuration and config file parsing for logrot
//!
//! Supports multiple configuration file formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::{Error, Result};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Validated rotation settings.
///
/// `max_file_size` and `max_files` are always at least 1. The setters check the new
/// value before storing it, so a rejected value leaves the previous one in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatorConfig {
    max_file_size: u64,
    max_files: usize,
    file_mode: Option<u32>,
    rotate_by_copy: Option<bool>,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE_KB,
            max_files: DEFAULT_MAX_FILES,
            file_mode: None,
            rotate_by_copy: None,
        }
    }
}

impl RotatorConfig {
    pub fn new(max_file_size: u64, max_files: usize) -> Result<Self> {
        let mut config = Self::default();
        config.set_max_file_size(max_file_size)?;
        config.set_max_files(max_files)?;
        Ok(config)
    }

    /// Permission bits for backups created by copying
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = Some(mode);
        self
    }

    /// Force a strategy instead of the platform default
    pub fn with_rotate_by_copy(mut self, rotate_by_copy: bool) -> Self {
        self.rotate_by_copy = Some(rotate_by_copy);
        self
    }

    pub fn set_max_file_size(&mut self, max_file_size: u64) -> Result<()> {
        if max_file_size < 1 {
            return Err(Error::invalid_config(
                "max_file_size cannot be lower than 1",
            ));
        }
        self.max_file_size = max_file_size;
        Ok(())
    }

    pub fn set_max_files(&mut self, max_files: usize) -> Result<()> {
        if max_files < 1 {
            return Err(Error::invalid_config("max_files cannot be lower than 1"));
        }
        self.max_files = max_files;
        Ok(())
    }

    pub fn set_file_mode(&mut self, mode: Option<u32>) {
        self.file_mode = mode;
    }

    pub fn set_rotate_by_copy(&mut self, rotate_by_copy: Option<bool>) {
        self.rotate_by_copy = rotate_by_copy;
    }

    /// Size threshold in kilobytes
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Size threshold in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        kb_to_bytes(self.max_file_size)
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn file_mode(&self) -> Option<u32> {
        self.file_mode
    }

    /// The explicitly requested strategy, if any
    pub fn rotate_by_copy(&self) -> Option<bool> {
        self.rotate_by_copy
    }
}

/// Permission bits as written in a config file: `416` or `"0640"`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FileModeValue {
    Bits(u32),
    Octal(String),
}

impl FileModeValue {
    pub fn to_bits(&self) -> Result<u32> {
        match self {
            FileModeValue::Bits(bits) => Ok(*bits),
            FileModeValue::Octal(text) => {
                let digits = text.trim();
                let digits = digits
                    .strip_prefix("0o")
                    .or_else(|| digits.strip_prefix("0O"))
                    .unwrap_or(digits);
                u32::from_str_radix(digits, 8).map_err(|_| {
                    Error::invalid_config(format!("file_mode is not an octal number: {}", text))
                })
            }
        }
    }
}

/// `[rotation]` section of a config file.
///
/// Numeric bounds are signed so that negative input is reported as an invalid
/// configuration rather than a parse error.
#[derive(Debug, Deserialize, Default)]
pub struct RotationSection {
    pub max_file_size: Option<i64>,
    pub max_files: Option<i64>,
    pub file_mode: Option<FileModeValue>,
    pub rotate_by_copy: Option<bool>,
}

impl RotationSection {
    /// Validate and convert to a RotatorConfig
    pub fn into_config(self) -> Result<RotatorConfig> {
        let mut config = RotatorConfig::default();

        if let Some(size) = self.max_file_size {
            let size = u64::try_from(size).map_err(|_| {
                Error::invalid_config("max_file_size cannot be lower than 1")
            })?;
            config.set_max_file_size(size)?;
        }

        if let Some(files) = self.max_files {
            let files = usize::try_from(files)
                .map_err(|_| Error::invalid_config("max_files cannot be lower than 1"))?;
            config.set_max_files(files)?;
        }

        if let Some(mode) = &self.file_mode {
            config.set_file_mode(Some(mode.to_bits()?));
        }
        config.set_rotate_by_copy(self.rotate_by_copy);

        Ok(config)
    }
}

/// Configuration file structure (logrot.toml/yaml/json)
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub rotation: RotationSection,
}

impl ConfigFile {
    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Toml => Ok(toml::from_str(content)?),
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            ConfigFormat::Json => Ok(serde_json::from_str(content)?),
        }
    }

    /// Find and load the first known config file in a directory
    pub fn find_and_load(dir: &Path) -> Result<(Self, PathBuf)> {
        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, path));
            }
        }
        Err(Error::ConfigError(format!(
            "No config file found in {}. Expected one of: {:?}",
            dir.display(),
            CONFIG_FILES
        )))
    }

    pub fn into_config(self) -> Result<RotatorConfig> {
        self.rotation.into_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_config_format_detection() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("YAML"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_defaults() {
        let config = RotatorConfig::default();
        assert_eq!(config.max_file_size(), 10240);
        assert_eq!(config.max_files(), 5);
        assert_eq!(config.max_file_size_bytes(), 10 * 1024 * 1024);
        assert!(config.file_mode().is_none());
        assert!(config.rotate_by_copy().is_none());
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(matches!(
            RotatorConfig::new(0, 3),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            RotatorConfig::new(10, 0),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejected_setter_keeps_previous_value() {
        let mut config = RotatorConfig::new(100, 3).unwrap();

        assert!(config.set_max_file_size(0).is_err());
        assert_eq!(config.max_file_size(), 100);

        assert!(config.set_max_files(0).is_err());
        assert_eq!(config.max_files(), 3);

        config.set_max_files(7).unwrap();
        assert_eq!(config.max_files(), 7);
    }

    #[test]
    fn test_file_mode_octal_string() {
        assert_eq!(FileModeValue::Octal("0640".into()).to_bits().unwrap(), 0o640);
        assert_eq!(FileModeValue::Octal("0o600".into()).to_bits().unwrap(), 0o600);
        assert_eq!(FileModeValue::Bits(420).to_bits().unwrap(), 0o644);
        assert!(FileModeValue::Octal("rw-r--r--".into()).to_bits().is_err());
    }

    #[test]
    fn test_config_parse_toml() {
        let content = r#"
[rotation]
max_file_size = 512
max_files = 3
file_mode = "0640"
rotate_by_copy = true
"#;
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let config = ConfigFile::load(file.path()).unwrap().into_config().unwrap();
        assert_eq!(config.max_file_size(), 512);
        assert_eq!(config.max_files(), 3);
        assert_eq!(config.file_mode(), Some(0o640));
        assert_eq!(config.rotate_by_copy(), Some(true));
    }

    #[test]
    fn test_config_parse_yaml() {
        let content = r#"
rotation:
  max_file_size: 64
  max_files: 2
  file_mode: 384
"#;
        let config = ConfigFile::parse(content, ConfigFormat::Yaml)
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.max_file_size(), 64);
        assert_eq!(config.max_files(), 2);
        assert_eq!(config.file_mode(), Some(0o600));
        assert_eq!(config.rotate_by_copy(), None);
    }

    #[test]
    fn test_config_parse_json() {
        let content = r#"{ "rotation": { "max_files": 9, "rotate_by_copy": false } }"#;
        let config = ConfigFile::parse(content, ConfigFormat::Json)
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.max_file_size(), DEFAULT_MAX_FILE_SIZE_KB);
        assert_eq!(config.max_files(), 9);
        assert_eq!(config.rotate_by_copy(), Some(false));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ConfigFile::parse("", ConfigFormat::Toml)
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config, RotatorConfig::default());
    }

    #[test]
    fn test_negative_values_are_invalid() {
        let size = ConfigFile::parse("[rotation]\nmax_file_size = -5\n", ConfigFormat::Toml)
            .unwrap()
            .into_config();
        assert!(matches!(size, Err(Error::InvalidConfiguration(_))));

        let files = ConfigFile::parse("[rotation]\nmax_files = 0\n", ConfigFormat::Toml)
            .unwrap()
            .into_config();
        assert!(matches!(files, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_config_not_found() {
        let result = ConfigFile::load(Path::new("/nonexistent/logrot.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = NamedTempFile::with_suffix(".ini").unwrap();
        let result = ConfigFile::load(file.path());
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_find_and_load() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("logrot.yml"), "rotation:\n  max_files: 4\n").unwrap();

        let (config, path) = ConfigFile::find_and_load(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("logrot.yml"));
        assert_eq!(config.into_config().unwrap().max_files(), 4);

        let empty = TempDir::new().unwrap();
        assert!(ConfigFile::find_and_load(empty.path()).is_err());
    }
}
