//! Record shape and value definitions.
//!
//! A [`RecordShape`] is the ordered field layout of a model type. The
//! declaration order of its fields is the canonical column order used for
//! table creation, inserts, and row decoding, so every consumer walks
//! `fields()` front to back and never reorders.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Name of the primary-key field every shape carries.
pub const PRIMARY_KEY: &str = "Id";

/// Text format used to store and compare datetime values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Kind of value a field holds.
///
/// `Integer`, `Text`, `Boolean`, and `DateTime` are the kinds the storage
/// layer knows how to map to a column affinity. `Real` and `Blob` can be
/// carried by values but are rejected when a table is derived from a shape.
///
/// # Examples
///
/// ```
/// use record_store_core::FieldType;
///
/// assert_eq!(FieldType::Boolean.as_str(), "boolean");
/// assert!(FieldType::Text.is_quoted());
/// assert!(!FieldType::Integer.is_quoted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Optional 64-bit integer.
    Integer,
    /// String.
    Text,
    /// Optional boolean.
    Boolean,
    /// Optional naive datetime.
    DateTime,
    /// Floating point number.
    Real,
    /// Raw bytes.
    Blob,
}

impl FieldType {
    /// Returns the lowercase name of this field type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "datetime",
            FieldType::Real => "real",
            FieldType::Blob => "blob",
        }
    }

    /// Returns `true` if literals of this type are rendered single-quoted.
    pub fn is_quoted(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::DateTime)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single, possibly null, field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Unset.
    #[default]
    Null,
    Integer(i64),
    Text(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Real(f64),
    Blob(Vec<u8>),
}

impl FieldValue {
    /// Returns `true` for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns a short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Integer(_) => "integer",
            FieldValue::Text(_) => "text",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Real(_) => "real",
            FieldValue::Blob(_) => "blob",
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// One declared field of a [`RecordShape`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field (and column) name.
    pub name: String,
    /// Declared kind.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary_key: bool,
}

impl FieldDef {
    /// Creates a non-key field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            primary_key: false,
        }
    }
}

/// Ordered field layout of a model type.
///
/// Build shapes with [`RecordShape::new`], then chain
/// [`with_primary_key`](RecordShape::with_primary_key) and
/// [`with_field`](RecordShape::with_field) in declaration order.
///
/// # Examples
///
/// ```
/// use record_store_core::{FieldType, RecordShape};
///
/// let shape = RecordShape::new("Item")
///     .with_primary_key()
///     .with_field("Action", FieldType::Integer);
///
/// assert_eq!(shape.name(), "Item");
/// assert_eq!(shape.len(), 2);
/// assert_eq!(shape.primary_key_index(), Some(0));
/// assert_eq!(shape.field("Action").unwrap().field_type, FieldType::Integer);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordShape {
    name: String,
    fields: Vec<FieldDef>,
}

impl RecordShape {
    /// Creates an empty shape with the given table name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends the `Id` integer primary-key field.
    pub fn with_primary_key(mut self) -> Self {
        self.fields.push(FieldDef {
            name: PRIMARY_KEY.to_string(),
            field_type: FieldType::Integer,
            primary_key: true,
        });
        self
    }

    /// Appends a non-key field.
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDef::new(name, field_type));
        self
    }

    /// Appends an arbitrary field definition.
    pub fn with_field_def(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Table name of this shape.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of the primary-key field, if one is declared.
    pub fn primary_key_index(&self) -> Option<usize> {
        self.fields.iter().position(|f| f.primary_key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the shape has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}
