//! Normalization of domain objects into GraphQL payloads.
//!
//! Domain objects reach the GraphQL layer as JSON maps. The [`ItemNormalizer`]
//! turns them into payloads the field resolvers can consume: to-many relations
//! are left for per-field resolution, and every payload carries an identity
//! clone under [`ITEM_KEY`] plus its resource class under
//! [`ITEM_RESOURCE_CLASS_KEY`].

mod iri;
mod normalizer;

pub use iri::IriConverter;
pub use normalizer::{ItemNormalizer, Normalizer, ObjectNormalizer, decode_item};

/// Payload key holding the serialized identity clone of the item.
pub const ITEM_KEY: &str = "#item";

/// Payload key holding the resource class of the item.
pub const ITEM_RESOURCE_CLASS_KEY: &str = "#itemResourceClass";

/// Context of one (de)normalization call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializerContext {
    pub resource_class: String,
    /// GraphQL operation being served, if any.
    pub operation_name: Option<String>,
    /// Whether the call builds an object from input.
    pub denormalize: bool,
}

impl SerializerContext {
    pub fn new(resource_class: impl Into<String>) -> Self {
        Self {
            resource_class: resource_class.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn operation(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    #[must_use]
    pub fn denormalizing(mut self) -> Self {
        self.denormalize = true;
        self
    }

    /// The same context for a related resource.
    #[must_use]
    pub fn for_resource(&self, resource_class: impl Into<String>) -> Self {
        Self {
            resource_class: resource_class.into(),
            operation_name: None,
            denormalize: self.denormalize,
        }
    }
}
