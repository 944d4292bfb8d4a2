//! Store configuration.
//!
//! Defines the YAML-serializable configuration that controls where the
//! store file lives and how connections to it are tuned. Every section is
//! optional; missing values fall back to the defaults below.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! database:
//!   directory: Database
//!   file_name: records.sqlite
//! connection:
//!   busy_timeout_ms: 5000
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration format version written by [`StoreConfig::default`].
pub const CONFIG_VERSION: &str = "1.0";
/// Directory holding the store file, relative to the working directory.
pub const DEFAULT_DATABASE_DIR: &str = "Database";
/// File name of the store.
pub const DEFAULT_DATABASE_FILE: &str = "records.sqlite";
/// Conventional name of the configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "record-store.yml";
/// Busy timeout applied to every connection.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Location of the store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Directory containing the store file.
    pub directory: PathBuf,
    /// Store file name within `directory`.
    pub file_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DATABASE_DIR),
            file_name: DEFAULT_DATABASE_FILE.to_string(),
        }
    }
}

/// Connection tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Top-level store configuration.
///
/// # Examples
///
/// ```
/// use record_store_db::StoreConfig;
/// use std::path::Path;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.file_path(), Path::new("Database").join("records.sqlite"));
///
/// let config = StoreConfig::default().with_file_path("/tmp/items.sqlite");
/// assert_eq!(config.file_path(), Path::new("/tmp/items.sqlite"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Store file location.
    pub database: DatabaseConfig,
    /// Connection tuning.
    pub connection: ConnectionConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            database: DatabaseConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::ConfigError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Loads configuration if the file exists.
    ///
    /// Returns `Ok(None)` when there is no file at `path`, leaving the
    /// choice of fallback to the caller.
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::ConfigError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Points the configuration at an explicit store file.
    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.database.directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.database.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self
    }

    /// Full path of the store file.
    pub fn file_path(&self) -> PathBuf {
        self.database.directory.join(&self.database.file_name)
    }

    /// Busy timeout as a [`Duration`].
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.connection.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
database:
  directory: data/store
  file_name: items.sqlite
connection:
  busy_timeout_ms: 250
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: StoreConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.database.directory, PathBuf::from("data/store"));
        assert_eq!(config.database.file_name, "items.sqlite");
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));
        assert_eq!(
            config.file_path(),
            Path::new("data/store").join("items.sqlite")
        );
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: StoreConfig = serde_yaml::from_str("database:\n  file_name: x.sqlite\n").unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.database.directory, PathBuf::from(DEFAULT_DATABASE_DIR));
        assert_eq!(config.database.file_name, "x.sqlite");
        assert_eq!(config.connection.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_default_file_path() {
        let config = StoreConfig::default();
        assert_eq!(
            config.file_path(),
            Path::new(DEFAULT_DATABASE_DIR).join(DEFAULT_DATABASE_FILE)
        );
    }

    #[test]
    fn test_with_file_path_bare_name() {
        let config = StoreConfig::default().with_file_path("store.sqlite");
        assert_eq!(config.file_path(), PathBuf::from("store.sqlite"));
    }

    #[test]
    fn test_load_optional_missing_file() {
        let path = std::env::temp_dir().join("rs_db_test_missing_config.yml");
        std::fs::remove_file(&path).ok();
        assert!(StoreConfig::load_optional(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = std::env::temp_dir().join(format!("rs_db_test_config_rt_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(DEFAULT_CONFIG_FILE);

        let original: StoreConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = StoreConfig::load_optional(&path).unwrap().unwrap();
        assert_eq!(loaded, original);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = std::env::temp_dir().join(format!("rs_db_test_config_bad_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.yml");
        std::fs::write(&path, "connection: [not, a, map]\n").unwrap();

        let err = StoreConfig::load(&path).unwrap_err();
        assert!(matches!(err, crate::ConfigError::YamlError(_)));

        std::fs::remove_dir_all(&dir).ok();
    }
}
