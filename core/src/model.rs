//! The model capability and its declarative descriptor macro.
//!
//! Every record type that the storage layer can map implements [`Model`].
//! The trait exposes the type's [`RecordShape`] together with conversions
//! to and from declaration-ordered [`FieldValue`]s, which is all the schema,
//! query, and row-mapping code needs; none of it inspects the concrete type.
//!
//! Most models are declared with [`define_model!`](crate::define_model),
//! which generates the struct and the `Model` impl from a field list.

use chrono::NaiveDateTime;

use crate::error::ModelError;
use crate::types::{FieldType, FieldValue, RecordShape};

/// A record type with a declared shape.
///
/// `to_values` and `from_values` use the field order of
/// [`shape`](Model::shape), primary key included.
pub trait Model: Sized {
    /// Returns the shape of this type. Derived once and cached.
    fn shape() -> &'static RecordShape;

    /// Primary key, or `None` for a transient record.
    fn id(&self) -> Option<i64>;

    /// Field values in declaration order.
    fn to_values(&self) -> Vec<FieldValue>;

    /// Rebuilds a record from declaration-ordered, already-typed values.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the number of values does not match the
    /// shape or a value has the wrong variant for its field.
    fn from_values(values: Vec<FieldValue>) -> Result<Self, ModelError>;

    /// Table name of this type.
    fn table_name() -> &'static str {
        Self::shape().name()
    }
}

/// Maps a declared field kind to its Rust value type.
pub trait FieldKind {
    /// Rust type stored in the record (wrapped in `Option`).
    type Value;

    /// Declared field type.
    const FIELD_TYPE: FieldType;

    /// Converts a record field into a value.
    fn to_value(value: &Option<Self::Value>) -> FieldValue;

    /// Converts a value back into a record field.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] for a non-null value of the
    /// wrong variant.
    fn from_value(field: &str, value: FieldValue) -> Result<Option<Self::Value>, ModelError>;
}

/// Marker types naming the field kinds usable in [`define_model!`](crate::define_model).
pub mod kind {
    use super::*;

    /// `Option<i64>` field.
    pub struct Integer;
    /// `Option<String>` field.
    pub struct Text;
    /// `Option<bool>` field.
    pub struct Boolean;
    /// `Option<NaiveDateTime>` field.
    pub struct DateTime;

    fn mismatch(field: &str, expected: FieldType, found: &FieldValue) -> ModelError {
        ModelError::TypeMismatch {
            field: field.to_string(),
            expected,
            found: found.kind_name(),
        }
    }

    impl FieldKind for Integer {
        type Value = i64;
        const FIELD_TYPE: FieldType = FieldType::Integer;

        fn to_value(value: &Option<i64>) -> FieldValue {
            value.map_or(FieldValue::Null, FieldValue::Integer)
        }

        fn from_value(field: &str, value: FieldValue) -> Result<Option<i64>, ModelError> {
            match value {
                FieldValue::Null => Ok(None),
                FieldValue::Integer(v) => Ok(Some(v)),
                other => Err(mismatch(field, Self::FIELD_TYPE, &other)),
            }
        }
    }

    impl FieldKind for Text {
        type Value = String;
        const FIELD_TYPE: FieldType = FieldType::Text;

        fn to_value(value: &Option<String>) -> FieldValue {
            value
                .as_ref()
                .map_or(FieldValue::Null, |v| FieldValue::Text(v.clone()))
        }

        fn from_value(field: &str, value: FieldValue) -> Result<Option<String>, ModelError> {
            match value {
                FieldValue::Null => Ok(None),
                FieldValue::Text(v) => Ok(Some(v)),
                other => Err(mismatch(field, Self::FIELD_TYPE, &other)),
            }
        }
    }

    impl FieldKind for Boolean {
        type Value = bool;
        const FIELD_TYPE: FieldType = FieldType::Boolean;

        fn to_value(value: &Option<bool>) -> FieldValue {
            value.map_or(FieldValue::Null, FieldValue::Boolean)
        }

        fn from_value(field: &str, value: FieldValue) -> Result<Option<bool>, ModelError> {
            match value {
                FieldValue::Null => Ok(None),
                FieldValue::Boolean(v) => Ok(Some(v)),
                other => Err(mismatch(field, Self::FIELD_TYPE, &other)),
            }
        }
    }

    impl FieldKind for DateTime {
        type Value = NaiveDateTime;
        const FIELD_TYPE: FieldType = FieldType::DateTime;

        fn to_value(value: &Option<NaiveDateTime>) -> FieldValue {
            value.map_or(FieldValue::Null, FieldValue::DateTime)
        }

        fn from_value(
            field: &str,
            value: FieldValue,
        ) -> Result<Option<NaiveDateTime>, ModelError> {
            match value {
                FieldValue::Null => Ok(None),
                FieldValue::DateTime(v) => Ok(Some(v)),
                other => Err(mismatch(field, Self::FIELD_TYPE, &other)),
            }
        }
    }
}

/// Declares a record struct and its [`Model`] implementation.
///
/// The generated struct always starts with `pub id: Option<i64>` (the `Id`
/// primary key), followed by the listed fields in order. Each field names a
/// [`kind`] marker and the column it maps to. The table is named after the
/// struct, and the shape is built once on first use.
///
/// # Examples
///
/// ```
/// use record_store_core::{FieldValue, Model, define_model};
///
/// define_model! {
///     #[derive(Debug, Clone, PartialEq, Default)]
///     pub struct Item {
///         action: Integer => "Action",
///     }
/// }
///
/// let item = Item { id: Some(44), action: Some(5) };
/// assert_eq!(Item::table_name(), "Item");
/// assert_eq!(Item::shape().field_names(), vec!["Id", "Action"]);
/// assert_eq!(
///     item.to_values(),
///     vec![FieldValue::Integer(44), FieldValue::Integer(5)]
/// );
/// assert_eq!(Item::from_values(item.to_values()).unwrap(), item);
/// ```
#[macro_export]
macro_rules! define_model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $kind:ident => $column:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            /// Primary key.
            pub id: ::core::option::Option<i64>,
            $(
                $(#[$field_meta])*
                pub $field: ::core::option::Option<
                    <$crate::kind::$kind as $crate::FieldKind>::Value
                >,
            )*
        }

        impl $crate::Model for $name {
            fn shape() -> &'static $crate::RecordShape {
                static SHAPE: ::std::sync::OnceLock<$crate::RecordShape> =
                    ::std::sync::OnceLock::new();
                SHAPE.get_or_init(|| {
                    $crate::RecordShape::new(stringify!($name))
                        .with_primary_key()
                        $(
                            .with_field(
                                $column,
                                <$crate::kind::$kind as $crate::FieldKind>::FIELD_TYPE,
                            )
                        )*
                })
            }

            fn id(&self) -> ::core::option::Option<i64> {
                self.id
            }

            fn to_values(&self) -> ::std::vec::Vec<$crate::FieldValue> {
                ::std::vec![
                    <$crate::kind::Integer as $crate::FieldKind>::to_value(&self.id),
                    $(
                        <$crate::kind::$kind as $crate::FieldKind>::to_value(&self.$field),
                    )*
                ]
            }

            fn from_values(
                values: ::std::vec::Vec<$crate::FieldValue>,
            ) -> ::core::result::Result<Self, $crate::ModelError> {
                let expected = <Self as $crate::Model>::shape().len();
                if values.len() != expected {
                    return ::core::result::Result::Err($crate::ModelError::ArityMismatch {
                        shape: stringify!($name).to_string(),
                        expected,
                        found: values.len(),
                    });
                }
                let mut values = values.into_iter();
                ::core::result::Result::Ok(Self {
                    id: <$crate::kind::Integer as $crate::FieldKind>::from_value(
                        $crate::PRIMARY_KEY,
                        values.next().unwrap_or_default(),
                    )?,
                    $(
                        $field: <$crate::kind::$kind as $crate::FieldKind>::from_value(
                            $column,
                            values.next().unwrap_or_default(),
                        )?,
                    )*
                })
            }
        }
    };
}
