//! Conversion between record values and SQLite rows.
//!
//! Outbound, [`FieldValue`]s are turned into driver values for binding.
//! Inbound, each row is captured as a [`ResultRow`] of loosely typed values
//! keyed by column name, then coerced field by field against the model's
//! shape. Columns are matched by name, never by position.

use std::sync::Arc;

use chrono::NaiveDateTime;
use record_store_core::{DATETIME_FORMAT, FieldDef, FieldType, FieldValue, Model, ModelError};
use rusqlite::types::{Value, ValueRef};

use crate::error::Result;
use crate::query::{self, Statement};

/// Converts a field value into a driver value for binding.
///
/// Booleans bind as `1`/`0` and datetimes as text in the storage format.
pub(crate) fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(v) => Value::Integer(*v),
        FieldValue::Boolean(v) => Value::Integer(i64::from(*v)),
        FieldValue::Real(v) => Value::Real(*v),
        FieldValue::Text(v) => Value::Text(v.clone()),
        FieldValue::DateTime(v) => Value::Text(v.format(DATETIME_FORMAT).to_string()),
        FieldValue::Blob(v) => Value::Blob(v.clone()),
    }
}

/// Captures a driver value without interpreting it.
pub(crate) fn from_value_ref(value: ValueRef<'_>) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(v) => FieldValue::Integer(v),
        ValueRef::Real(v) => FieldValue::Real(v),
        ValueRef::Text(bytes) => FieldValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => FieldValue::Blob(bytes.to_vec()),
    }
}

/// One result row, with values keyed by column name.
///
/// Rows of the same result set share their column list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    columns: Arc<[String]>,
    values: Vec<FieldValue>,
}

impl ResultRow {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<FieldValue>) -> Self {
        Self { columns, values }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw values in result order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Looks up a value by column name.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }
}

/// Coerces a stored value into the variant a field declares.
///
/// Integers become booleans (nonzero is `true`) and text becomes a datetime.
/// Nulls stay null. Any other mismatch is a [`ModelError::TypeMismatch`].
pub(crate) fn coerce(field: &FieldDef, raw: FieldValue) -> std::result::Result<FieldValue, ModelError> {
    let mismatch = |found: &FieldValue| ModelError::TypeMismatch {
        field: field.name.clone(),
        expected: field.field_type,
        found: found.kind_name(),
    };
    match (field.field_type, raw) {
        (_, FieldValue::Null) => Ok(FieldValue::Null),
        (FieldType::Integer, v @ FieldValue::Integer(_)) => Ok(v),
        (FieldType::Text, v @ FieldValue::Text(_)) => Ok(v),
        (FieldType::Real, v @ FieldValue::Real(_)) => Ok(v),
        (FieldType::Real, FieldValue::Integer(v)) => Ok(FieldValue::Real(v as f64)),
        (FieldType::Blob, v @ FieldValue::Blob(_)) => Ok(v),
        (FieldType::Boolean, FieldValue::Integer(v)) => Ok(FieldValue::Boolean(v != 0)),
        (FieldType::Boolean, v @ FieldValue::Boolean(_)) => Ok(v),
        (FieldType::DateTime, FieldValue::Text(text)) => parse_datetime(&text)
            .map(FieldValue::DateTime)
            .ok_or_else(|| ModelError::InvalidDateTime {
                field: field.name.clone(),
                value: text,
            }),
        (FieldType::DateTime, v @ FieldValue::DateTime(_)) => Ok(v),
        (_, other) => Err(mismatch(&other)),
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Maps one result row onto a fresh record of type `M`.
///
/// Every declared field is looked up by name and coerced to its type.
/// Extra columns are ignored.
///
/// # Errors
///
/// Returns [`ModelError::MissingColumn`] if a declared field has no column
/// in the row, or a conversion error from [`coerce`].
pub(crate) fn decode<M: Model>(row: &ResultRow) -> Result<M> {
    let shape = M::shape();
    let values = shape
        .fields()
        .iter()
        .map(|field| {
            let raw = row
                .get(&field.name)
                .cloned()
                .ok_or_else(|| ModelError::MissingColumn {
                    shape: shape.name().to_string(),
                    field: field.name.clone(),
                })?;
            coerce(field, raw)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(M::from_values(values)?)
}

/// Builds the query-by-example select for `example`.
pub(crate) fn encode_for_select<M: Model>(example: &M) -> Result<Statement> {
    query::build_select(M::shape(), &example.to_values())
}

/// Builds the insert for `record`.
pub(crate) fn encode_for_insert<M: Model>(record: &M) -> Result<Statement> {
    query::build_insert(M::shape(), &record.to_values())
}

/// Builds the update for `record`. Only its non-null fields are assigned.
pub(crate) fn encode_for_update<M: Model>(record: &M) -> Result<Statement> {
    query::build_update(M::shape(), &record.to_values())
}
