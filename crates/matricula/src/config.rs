//! Configuration management for matricula.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "matricula";

/// Pattern an artifact prefix must match to be safe inside a file name.
const ARTIFACT_PREFIX_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MATRICULA_`, sections split on `__`)
/// 2. TOML config file at `~/.config/matricula/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Record defaults.
    pub records: RecordsConfig,
    /// PDF receipt text.
    pub receipt: ReceiptConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the backing file and the artifact directory.
    /// Defaults to `~/.local/share/matricula`
    pub data_dir: Option<PathBuf>,
    /// File name of the backing file inside `data_dir`.
    pub records_file: String,
    /// Name of the artifact directory inside `data_dir`.
    pub artifacts_dir: String,
    /// Prefix for per-record artifact file names.
    pub artifact_prefix: String,
    /// Write the backing file through a temporary file and rename.
    pub atomic_writes: bool,
}

/// Defaults applied to records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Status given to new records that arrive without one.
    pub default_status: String,
}

/// Fixed text printed on every PDF receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    /// Page header.
    pub title: String,
    /// Heading above the field block.
    pub heading: String,
    /// Page footer.
    pub footer: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None, // Will be resolved to default at runtime
            records_file: "matriculas.json".to_string(),
            artifacts_dir: "Matriculas".to_string(),
            artifact_prefix: "matricula".to_string(),
            atomic_writes: true,
        }
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            default_status: "Active".to_string(),
        }
    }
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            title: "ENROLLMENT SYSTEM".to_string(),
            heading: "ENROLLMENT RECEIPT".to_string(),
            footer: "National Training Service".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("MATRICULA_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        validate_file_name("records_file", &self.storage.records_file)?;
        validate_file_name("artifacts_dir", &self.storage.artifacts_dir)?;

        let prefix = Regex::new(ARTIFACT_PREFIX_PATTERN).map_err(|e| Error::ConfigValidation {
            message: e.to_string(),
        })?;
        if !prefix.is_match(&self.storage.artifact_prefix) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "artifact_prefix '{}' may only contain letters, digits, '_' and '-'",
                    self.storage.artifact_prefix
                ),
            });
        }

        if self.records.default_status.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "default_status must not be empty".to_string(),
            });
        }

        if self.receipt.title.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "receipt title must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the backing file path.
    #[must_use]
    pub fn records_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.records_file)
    }

    /// Get the artifact directory path.
    #[must_use]
    pub fn artifacts_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.artifacts_dir)
    }
}

fn validate_file_name(key: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: format!("{key} must not be empty"),
        });
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::ConfigValidation {
            message: format!("{key} must be a plain name, got '{name}'"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.data_dir.is_none());
        assert_eq!(config.storage.records_file, "matriculas.json");
        assert_eq!(config.storage.artifacts_dir, "Matriculas");
        assert_eq!(config.storage.artifact_prefix, "matricula");
        assert!(config.storage.atomic_writes);
        assert_eq!(config.records.default_status, "Active");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_prefix() {
        let mut config = Config::default();
        config.storage.artifact_prefix = "../escape".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("artifact_prefix"));
    }

    #[test]
    fn test_validate_empty_prefix() {
        let mut config = Config::default();
        config.storage.artifact_prefix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_records_file_with_separator() {
        let mut config = Config::default();
        config.storage.records_file = "nested/matriculas.json".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("records_file"));
    }

    #[test]
    fn test_validate_empty_artifacts_dir() {
        let mut config = Config::default();
        config.storage.artifacts_dir = " ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("artifacts_dir"));
    }

    #[test]
    fn test_validate_empty_default_status() {
        let mut config = Config::default();
        config.records.default_status = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_status"));
    }

    #[test]
    fn test_validate_empty_title() {
        let mut config = Config::default();
        config.receipt.title = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_paths_from_custom_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from("/srv/enrollment"));

        assert_eq!(config.data_dir(), PathBuf::from("/srv/enrollment"));
        assert_eq!(
            config.records_path(),
            PathBuf::from("/srv/enrollment/matriculas.json")
        );
        assert_eq!(
            config.artifacts_path(),
            PathBuf::from("/srv/enrollment/Matriculas")
        );
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("matricula"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("matricula"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[storage]
data_dir = "/srv/enrollment"
artifact_prefix = "enrollment"

[records]
default_status = "Pending"
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.data_dir(), PathBuf::from("/srv/enrollment"));
        assert_eq!(config.storage.artifact_prefix, "enrollment");
        assert_eq!(config.records.default_status, "Pending");
        assert_eq!(config.storage.records_file, "matriculas.json");
    }

    #[test]
    fn test_load_rejects_invalid_toml_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nartifact_prefix = \"a b\"").unwrap();

        let result = Config::load_from(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("artifact_prefix"));
        assert!(json.contains("default_status"));
    }
}
