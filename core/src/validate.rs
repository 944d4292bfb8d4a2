//! Shape and catalog validation.
//!
//! Table and column names are spliced into statement text (they cannot be
//! bound as parameters), so every name must be a plain SQL identifier and
//! must not be a keyword SQLite refuses as a bare name.
//! Validation also enforces the primary-key invariant: exactly one key
//! field, named `Id`, of integer type.
//!
//! # Examples
//!
//! ```
//! use record_store_core::*;
//!
//! let shape = RecordShape::new("Item")
//!     .with_primary_key()
//!     .with_field("Action", FieldType::Integer);
//! assert!(validate_shape(&shape).is_empty());
//!
//! // Invalid: no primary key
//! let bad = RecordShape::new("Item").with_field("Action", FieldType::Integer);
//! assert_eq!(validate_shape(&bad), vec![ValidationError::MissingPrimaryKey("Item".into())]);
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Catalog, FieldType, PRIMARY_KEY, RecordShape};

/// Structural problems found in a shape or catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Shape name is empty or whitespace-only.
    #[error("shape name cannot be empty")]
    EmptyShapeName,
    /// A table or column name is not a plain identifier.
    #[error("invalid identifier '{0}': must be alphanumerics and underscores, not starting with a digit")]
    InvalidIdentifier(String),
    /// A table or column name is a reserved SQL keyword.
    #[error("'{0}' is a reserved SQL keyword and cannot be used as a name")]
    ReservedWord(String),
    /// No field is marked as primary key.
    #[error("shape '{0}' has no primary key")]
    MissingPrimaryKey(String),
    /// More than one field is marked as primary key.
    #[error("shape '{0}' has more than one primary key")]
    MultiplePrimaryKeys(String),
    /// The primary key is not named `Id`.
    #[error("primary key must be named 'Id', found '{0}'")]
    PrimaryKeyName(String),
    /// The primary key is not an integer.
    #[error("primary key must be integer, found {0}")]
    PrimaryKeyType(FieldType),
    /// Two fields share a name.
    #[error("duplicate field in shape: {0}")]
    DuplicateField(String),
    /// Two shapes in a catalog share a name.
    #[error("duplicate shape in catalog: {0}")]
    DuplicateShape(String),
}

/// SQLite keywords that cannot stand in for a table or column name in every
/// statement position. Keywords the parser falls back to names for
/// (`ACTION`, `KEY`, `REPLACE`, ...) are not listed. Sorted for lookup.
const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "AUTOINCREMENT", "BETWEEN", "CASE", "CHECK",
    "COLLATE", "COMMIT", "CONSTRAINT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "DEFAULT", "DEFERRABLE", "DELETE", "DISTINCT", "DROP", "ELSE",
    "ESCAPE", "EXCEPT", "EXISTS", "FILTER", "FOREIGN", "FROM", "FULL", "GLOB", "GROUP",
    "HAVING", "IN", "INDEX", "INDEXED", "INNER", "INSERT", "INTERSECT", "INTO", "IS",
    "ISNULL", "JOIN", "LEFT", "LIKE", "LIMIT", "MATCH", "NATURAL", "NOT", "NOTHING",
    "NOTNULL", "NULL", "ON", "OR", "ORDER", "OUTER", "OVER", "PRIMARY", "REFERENCES",
    "REGEXP", "RETURNING", "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TO", "TRANSACTION",
    "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "WHEN", "WHERE", "WINDOW",
];

/// Returns `true` if `name` is a reserved SQL keyword, ignoring case.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS
        .binary_search(&name.to_ascii_uppercase().as_str())
        .is_ok()
}

/// Returns `true` if `name` is usable as an unquoted SQL identifier.
///
/// This is a lexical check only; see [`is_reserved_word`].
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates a single shape.
///
/// Returns every problem found; an empty vector means the shape is valid.
pub fn validate_shape(shape: &RecordShape) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if shape.name().trim().is_empty() {
        errors.push(ValidationError::EmptyShapeName);
    } else if let Some(err) = check_name(shape.name()) {
        errors.push(err);
    }

    let mut seen = HashSet::new();
    for field in shape.fields() {
        if let Some(err) = check_name(&field.name) {
            errors.push(err);
        }
        if !seen.insert(field.name.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateField(field.name.clone()));
        }
    }

    let keys: Vec<_> = shape.fields().iter().filter(|f| f.primary_key).collect();
    match keys.as_slice() {
        [] => errors.push(ValidationError::MissingPrimaryKey(shape.name().to_string())),
        [key] => {
            if key.name != PRIMARY_KEY {
                errors.push(ValidationError::PrimaryKeyName(key.name.clone()));
            }
            if key.field_type != FieldType::Integer {
                errors.push(ValidationError::PrimaryKeyType(key.field_type));
            }
        }
        _ => errors.push(ValidationError::MultiplePrimaryKeys(shape.name().to_string())),
    }

    errors
}

fn check_name(name: &str) -> Option<ValidationError> {
    if !is_identifier(name) {
        Some(ValidationError::InvalidIdentifier(name.to_string()))
    } else if is_reserved_word(name) {
        Some(ValidationError::ReservedWord(name.to_string()))
    } else {
        None
    }
}

/// Validates every shape in a catalog and checks for duplicate names.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for shape in catalog.shapes() {
        if !seen.insert(shape.name().to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateShape(shape.name().to_string()));
        }
        errors.extend(validate_shape(shape));
    }
    errors
}
