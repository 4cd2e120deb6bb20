//! Resource metadata consumed by the type builder and the item normalizer.
//!
//! Metadata replaces runtime class introspection: every fact the GraphQL core
//! needs about a resource (names, operations, properties, identifiers) is
//! declared up front and read through a [`ResourceMetadataFactory`].

mod factory;
mod resource;

pub use factory::{DynMetadataFactory, InMemoryMetadataFactory, ResourceMetadataFactory};
pub use resource::{
    ArgumentMetadata, BuiltinType, COLLECTION_QUERY, GraphQlOperation, ITEM_QUERY, IoMetadata,
    OperationKind, PropertyMetadata, PropertyType, ResourceMetadata, lcfirst, short_class_name,
    ucfirst,
};
