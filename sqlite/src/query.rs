//! Statement synthesis from record shapes and values.
//!
//! Builders are pure functions of a shape and a declaration-ordered value
//! list; they perform no I/O. Values are never spliced into the statement
//! text. Each value becomes a numbered placeholder (`?1`, `?2`, ...) bound
//! at execution time, so the statement shapes are:
//!
//! ```text
//! SELECT * FROM <Table> WHERE 1=1 [AND <field> = ?n]*
//! INSERT INTO <Table> VALUES (?1,?2,...)
//! UPDATE <Table> SET <field>=?1[,<field>=?n]* WHERE Id = ?n
//! ```
//!
//! Table and column names are spliced in, so every builder validates the
//! shape first.
//! [`Statement::display_sql`] renders the literal form for diagnostics.

use std::fmt::Write as _;

use record_store_core::{DATETIME_FORMAT, FieldValue, PRIMARY_KEY, RecordShape};

use crate::error::{Result, StoreError};
use crate::schema::ensure_valid;

/// Statement text plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<FieldValue>,
}

impl Statement {
    /// Creates a statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a statement with parameters bound to `?1..?n`.
    pub fn with_params(sql: impl Into<String>, params: Vec<FieldValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Statement text with placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> &[FieldValue] {
        &self.params
    }

    /// Renders the statement with every placeholder replaced by its literal.
    ///
    /// Intended for logs and display only; execution always binds.
    ///
    /// # Examples
    ///
    /// ```
    /// use record_store_core::FieldValue;
    /// use record_store_sqlite::Statement;
    ///
    /// let stmt = Statement::with_params(
    ///     "SELECT * FROM Item WHERE 1=1 AND Name = ?1 AND Action = ?2",
    ///     vec![FieldValue::Text("O'Brien".into()), FieldValue::Integer(5)],
    /// );
    /// assert_eq!(
    ///     stmt.display_sql(),
    ///     "SELECT * FROM Item WHERE 1=1 AND Name = 'O''Brien' AND Action = 5"
    /// );
    /// ```
    pub fn display_sql(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut chars = self.sql.char_indices().peekable();
        while let Some((start, c)) = chars.next() {
            if c != '?' {
                out.push(c);
                continue;
            }
            let mut end = start + 1;
            while let Some(&(idx, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                end = idx + 1;
                chars.next();
            }
            let literal = self.sql[start + 1..end]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| self.params.get(idx));
            match literal {
                Some(value) => out.push_str(&render_literal(value)),
                None => out.push_str(&self.sql[start..end]),
            }
        }
        out
    }
}

/// Renders a value as an SQL literal.
///
/// Text and datetimes are single-quoted with embedded quotes doubled,
/// numbers are bare, booleans are `1`/`0`, nulls are `null`.
pub fn render_literal(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "null".to_string(),
        FieldValue::Integer(v) => v.to_string(),
        FieldValue::Real(v) => v.to_string(),
        FieldValue::Boolean(v) => i64::from(*v).to_string(),
        FieldValue::Text(v) => quote(v),
        FieldValue::DateTime(v) => quote(&v.format(DATETIME_FORMAT).to_string()),
        FieldValue::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2 + 3);
            hex.push_str("X'");
            for b in bytes {
                let _ = write!(hex, "{b:02X}");
            }
            hex.push('\'');
            hex
        }
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Builds a query-by-example select.
///
/// Every non-null value contributes one `AND <field> = ?n` filter in field
/// order. An all-null example selects every row.
///
/// # Errors
///
/// Returns [`StoreError::InvalidShape`] if a table or column name is not
/// safe to splice into the statement.
pub fn build_select(shape: &RecordShape, values: &[FieldValue]) -> Result<Statement> {
    ensure_valid(shape)?;
    let mut sql = format!("SELECT * FROM {} WHERE 1=1", shape.name());
    let mut params = Vec::new();
    for (field, value) in shape.fields().iter().zip(values) {
        if value.is_null() {
            continue;
        }
        params.push(value.clone());
        let _ = write!(sql, " AND {} = ?{}", field.name, params.len());
    }
    Ok(Statement::with_params(sql, params))
}

/// Builds a positional insert with one placeholder per field.
///
/// Relies on the table's column order matching the shape's field order,
/// which holds for tables created from the same shape.
///
/// # Errors
///
/// Returns [`StoreError::InvalidShape`] for a shape with unsafe names.
pub fn build_insert(shape: &RecordShape, values: &[FieldValue]) -> Result<Statement> {
    ensure_valid(shape)?;
    let placeholders: Vec<String> = (1..=shape.len()).map(|n| format!("?{n}")).collect();
    let mut params: Vec<FieldValue> = values.iter().take(shape.len()).cloned().collect();
    params.resize(shape.len(), FieldValue::Null);
    Ok(Statement::with_params(
        format!(
            "INSERT INTO {} VALUES ({})",
            shape.name(),
            placeholders.join(",")
        ),
        params,
    ))
}

/// Builds an update keyed on `Id` that assigns every non-null, non-key
/// value. Null fields leave the stored column untouched.
///
/// The caller is responsible for ensuring the record has a primary key;
/// a null `Id` binds as NULL and matches no row.
///
/// # Errors
///
/// Returns [`StoreError::NothingToUpdate`] if no non-key value is set,
/// and [`StoreError::InvalidShape`] for a shape with unsafe names.
pub fn build_update(shape: &RecordShape, values: &[FieldValue]) -> Result<Statement> {
    ensure_valid(shape)?;
    let mut assignments = Vec::new();
    let mut params = Vec::new();
    let mut id = FieldValue::Null;
    for (field, value) in shape.fields().iter().zip(values) {
        if field.primary_key {
            id = value.clone();
            continue;
        }
        if value.is_null() {
            continue;
        }
        params.push(value.clone());
        assignments.push(format!("{}=?{}", field.name, params.len()));
    }
    if assignments.is_empty() {
        return Err(StoreError::NothingToUpdate(shape.name().to_string()));
    }
    params.push(id);
    Ok(Statement::with_params(
        format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            shape.name(),
            assignments.join(","),
            PRIMARY_KEY,
            params.len()
        ),
        params,
    ))
}
