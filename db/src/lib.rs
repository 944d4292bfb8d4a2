//! Store configuration and file layout for record-store.
//!
//! The engine targets a single embedded store file at a fixed relative
//! path (`Database/records.sqlite` by default). This crate owns that
//! layout and the optional YAML configuration that overrides it.
//!
//! # Quick start
//!
//! ```no_run
//! use record_store_db::{StoreConfig, DEFAULT_CONFIG_FILE};
//!
//! // Fall back to defaults when no configuration file is present
//! let config = StoreConfig::load_optional(DEFAULT_CONFIG_FILE)
//!     .unwrap()
//!     .unwrap_or_default();
//! println!("store file: {}", config.file_path().display());
//! ```

mod config;
mod error;

pub use config::{
    CONFIG_VERSION, ConnectionConfig, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_CONFIG_FILE,
    DEFAULT_DATABASE_DIR, DEFAULT_DATABASE_FILE, DatabaseConfig, StoreConfig,
};
pub use error::{ConfigError, Result};
