//! Table definitions derived from record shapes.
//!
//! Each field maps to one column through a closed affinity table:
//!
//! | Field type | Column affinity |
//! |------------|-----------------|
//! | `Integer`  | `integer`       |
//! | `Text`     | `varchar`       |
//! | `Boolean`  | `integer`       |
//! | `DateTime` | `text`          |
//!
//! Any other field type is rejected with
//! [`StoreError::UnsupportedFieldType`]. Columns are emitted in field
//! declaration order, which is the order inserts rely on, and the `Id`
//! column always carries `PRIMARY KEY`.

use record_store_core::{FieldType, RecordShape, validate_shape};

use crate::error::{Result, StoreError};

/// Returns the column affinity for a field type, if it has one.
pub fn affinity(field_type: FieldType) -> Option<&'static str> {
    match field_type {
        FieldType::Integer | FieldType::Boolean => Some("integer"),
        FieldType::Text => Some("varchar"),
        FieldType::DateTime => Some("text"),
        FieldType::Real | FieldType::Blob => None,
    }
}

/// Rejects shapes that would produce invalid or unsafe SQL.
pub(crate) fn ensure_valid(shape: &RecordShape) -> Result<()> {
    match validate_shape(shape).into_iter().next() {
        Some(reason) => Err(StoreError::InvalidShape {
            shape: shape.name().to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Derives the column definitions of a shape.
///
/// Each entry has the form `name affinity [PRIMARY KEY]`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidShape`] for a structurally invalid shape
/// and [`StoreError::UnsupportedFieldType`] for a field outside the
/// affinity table.
pub fn columns_for(shape: &RecordShape) -> Result<Vec<String>> {
    ensure_valid(shape)?;
    shape
        .fields()
        .iter()
        .map(|field| {
            let affinity =
                affinity(field.field_type).ok_or_else(|| StoreError::UnsupportedFieldType {
                    shape: shape.name().to_string(),
                    field: field.name.clone(),
                    field_type: field.field_type,
                })?;
            Ok(if field.primary_key {
                format!("{} {} PRIMARY KEY", field.name, affinity)
            } else {
                format!("{} {}", field.name, affinity)
            })
        })
        .collect()
}

/// Generates the `CREATE TABLE` statement for a shape.
///
/// # Errors
///
/// See [`columns_for`].
pub fn create_table_sql(shape: &RecordShape) -> Result<String> {
    let columns = columns_for(shape)?;
    Ok(format!(
        "CREATE TABLE {} ( {} )",
        shape.name(),
        columns.join(", ")
    ))
}

/// Lists user tables present in a store.
pub(crate) const LIST_TABLES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";

#[cfg(test)]
mod tests {
    use record_store_core::FieldDef;

    use super::*;

    fn profile() -> RecordShape {
        RecordShape::new("Profile")
            .with_primary_key()
            .with_field("Name", FieldType::Text)
            .with_field("Active", FieldType::Boolean)
    }

    #[test]
    fn test_affinity_table() {
        assert_eq!(affinity(FieldType::Integer), Some("integer"));
        assert_eq!(affinity(FieldType::Text), Some("varchar"));
        assert_eq!(affinity(FieldType::Boolean), Some("integer"));
        assert_eq!(affinity(FieldType::DateTime), Some("text"));
        assert_eq!(affinity(FieldType::Real), None);
        assert_eq!(affinity(FieldType::Blob), None);
    }

    #[test]
    fn test_columns_in_declaration_order() {
        assert_eq!(
            columns_for(&profile()).unwrap(),
            vec!["Id integer PRIMARY KEY", "Name varchar", "Active integer"]
        );
    }

    #[test]
    fn test_create_table_sql() {
        let shape = RecordShape::new("Item")
            .with_primary_key()
            .with_field("Action", FieldType::Integer)
            .with_field("Seen", FieldType::DateTime);
        assert_eq!(
            create_table_sql(&shape).unwrap(),
            "CREATE TABLE Item ( Id integer PRIMARY KEY, Action integer, Seen text )"
        );
    }

    #[test]
    fn test_unsupported_field_type() {
        let shape = profile().with_field("Ratio", FieldType::Real);
        match columns_for(&shape).unwrap_err() {
            StoreError::UnsupportedFieldType {
                shape,
                field,
                field_type,
            } => {
                assert_eq!(shape, "Profile");
                assert_eq!(field, "Ratio");
                assert_eq!(field_type, FieldType::Real);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let shape = profile().with_field_def(FieldDef::new("Name; DROP TABLE x", FieldType::Text));
        assert!(matches!(
            create_table_sql(&shape).unwrap_err(),
            StoreError::InvalidShape { .. }
        ));
    }

    #[test]
    fn test_missing_primary_key_rejected() {
        let shape = RecordShape::new("Loose").with_field("Name", FieldType::Text);
        assert!(matches!(
            columns_for(&shape).unwrap_err(),
            StoreError::InvalidShape { .. }
        ));
    }

    #[test]
    fn test_generated_sql_executes() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(&create_table_sql(&profile()).unwrap())
            .unwrap();

        let mut stmt = conn.prepare("PRAGMA table_info(Profile)").unwrap();
        let columns: Vec<(String, String, i64)> = stmt
            .query_map([], |row| Ok((row.get(1)?, row.get(2)?, row.get(5)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(
            columns,
            vec![
                ("Id".to_string(), "integer".to_string(), 1),
                ("Name".to_string(), "varchar".to_string(), 0),
                ("Active".to_string(), "integer".to_string(), 0),
            ]
        );
    }
}
