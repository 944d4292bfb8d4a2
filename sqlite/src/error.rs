//! Error types for the mapping engine.
//!
//! Provides a unified error type covering storage, schema derivation, row
//! decoding, and precondition failures.

use std::path::PathBuf;

use record_store_core::{FieldType, ModelError, ValidationError};
use thiserror::Error;

/// Errors that can occur inside the mapping engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection or driver failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A field type has no column affinity.
    #[error("unsupported field type {field_type} for field '{field}' on '{shape}'")]
    UnsupportedFieldType {
        shape: String,
        field: String,
        field_type: FieldType,
    },

    /// A result row could not be mapped onto a record.
    #[error("decode error: {0}")]
    Decode(#[from] ModelError),

    /// A record without a primary key was passed to insert or update.
    #[error("{operation} on '{shape}' requires a primary key")]
    PreconditionViolation {
        operation: &'static str,
        shape: String,
    },

    /// The shape would produce invalid SQL.
    #[error("invalid shape '{shape}': {reason}")]
    InvalidShape {
        shape: String,
        reason: ValidationError,
    },

    /// The shape has no fields besides the primary key.
    #[error("nothing to update on '{0}': shape has no fields besides Id")]
    NothingToUpdate(String),

    /// The store file does not exist and could not be created.
    #[error("store file not found: {}", .0.display())]
    StoreFileMissing(PathBuf),

    /// File system failure while preparing the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] record_store_db::ConfigError),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
