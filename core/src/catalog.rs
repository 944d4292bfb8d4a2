use serde::{Deserialize, Serialize};

use crate::{Model, RecordShape};

/// Ordered set of the record shapes an application knows about.
///
/// The storage layer enumerates the catalog when it creates tables for a
/// fresh store, so every model that will be read or written should be
/// registered before the store is opened.
///
/// # Examples
///
/// ```
/// use record_store_core::*;
///
/// define_model! {
///     #[derive(Debug, Default)]
///     pub struct Item {
///         action: Integer => "Action",
///     }
/// }
///
/// let catalog = Catalog::new().register::<Item>().register::<Item>();
/// assert_eq!(catalog.len(), 1);
/// assert!(catalog.get("Item").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    shapes: Vec<RecordShape>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the shape of model `M`.
    pub fn register<M: Model>(self) -> Self {
        self.with_shape(M::shape().clone())
    }

    /// Registers a shape. A shape whose name is already registered is ignored.
    pub fn with_shape(mut self, shape: RecordShape) -> Self {
        if self.get(shape.name()).is_none() {
            self.shapes.push(shape);
        }
        self
    }

    /// Registered shapes in registration order.
    pub fn shapes(&self) -> &[RecordShape] {
        &self.shapes
    }

    /// Looks up a shape by table name.
    pub fn get(&self, name: &str) -> Option<&RecordShape> {
        self.shapes.iter().find(|s| s.name() == name)
    }

    /// Number of registered shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if no shapes are registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Serializes the catalog as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
