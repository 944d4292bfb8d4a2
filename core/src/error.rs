//! Value-level conversion errors.

use thiserror::Error;

use crate::types::FieldType;

/// Errors raised while moving values between records and rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A declared field has no matching column in the result row.
    #[error("no column named '{field}' in result row for '{shape}'")]
    MissingColumn { shape: String, field: String },

    /// A value has a variant the field cannot hold.
    #[error("field '{field}' expects {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    /// The number of values does not match the shape.
    #[error("'{shape}' has {expected} fields, got {found} values")]
    ArityMismatch {
        shape: String,
        expected: usize,
        found: usize,
    },

    /// Stored text could not be parsed as a datetime.
    #[error("field '{field}' holds an invalid datetime: {value}")]
    InvalidDateTime { field: String, value: String },
}
