//! Core record-shape types and the model capability.
//!
//! This crate defines what the storage layer needs to know about a record
//! type, without any I/O:
//!
//! - [`RecordShape`]: the ordered `(name, type, primary key)` field layout
//!   of a model type; every shape has exactly one `Id` integer key.
//! - [`FieldValue`]: a nullable value for one field.
//! - [`Model`]: the capability a record type implements so schemas,
//!   statements, and row decoding can be derived from its shape.
//! - [`define_model!`]: declares a record struct and its `Model` impl
//!   from a field list.
//! - [`Catalog`]: the set of known shapes, enumerated when tables are
//!   created for a fresh store.
//!
//! Validation ([`validate_shape`], [`validate_catalog`]) catches shapes that
//! would produce invalid SQL or break the primary-key invariant.
//!
//! # Example
//!
//! ```
//! use record_store_core::*;
//!
//! define_model! {
//!     #[derive(Debug, Clone, PartialEq, Default)]
//!     pub struct Character {
//!         name: Text => "Name",
//!         active: Boolean => "Active",
//!     }
//! }
//!
//! let catalog = Catalog::new().register::<Character>();
//! assert!(validate_catalog(&catalog).is_empty());
//!
//! let example = Character { active: Some(true), ..Default::default() };
//! assert_eq!(example.id(), None);
//! assert_eq!(Character::shape().field_names(), vec!["Id", "Name", "Active"]);
//! ```

mod catalog;
mod error;
mod model;
mod types;
mod validate;

pub use catalog::Catalog;
pub use error::ModelError;
pub use model::{FieldKind, Model, kind};
pub use types::*;
pub use validate::{
    ValidationError, is_identifier, is_reserved_word, validate_catalog, validate_shape,
};
