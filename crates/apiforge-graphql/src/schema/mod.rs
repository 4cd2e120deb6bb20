//! GraphQL schema building and lazy loading.
//!
//! This module turns resource metadata into a GraphQL schema. The
//! [`TypeBuilder`] constructs the resource types into a
//! [`TypeRegistry`](crate::types::TypeRegistry), [`ResourceSchemaBuilder`] assembles the root
//! fields and converts the registry into `async_graphql::dynamic` types, and
//! [`LazySchema`] defers the whole build until first access.
//!
//! ## Components
//!
//! - [`TypeBuilder`] - Resource object, interface, input and connection types
//! - [`FieldsBuilder`] - Field lists of resource types, derived from metadata by default
//! - [`Pagination`] - Cursor or page based connection shapes
//! - [`ResourceSchemaBuilder`] - Query and mutation roots over every resource
//! - [`LazySchema`] - Thread-safe lazy schema holder with rebuild support

mod builder;
mod dynamic;
mod fields;
mod lazy;
mod naming;
mod pagination;
mod type_builder;

pub use builder::{ResourceSchemaBuilder, SchemaBuilderConfig};
pub use fields::{
    CLIENT_MUTATION_ID, CLIENT_SUBSCRIPTION_ID, FieldsBuilder, MetadataFieldsBuilder,
    parse_type_expression,
};
pub use lazy::{LazySchema, SchemaState};
pub use naming::{TypeRequest, generated_type_name};
pub use pagination::{MetadataPagination, Pagination, PaginationType};
pub use type_builder::{NODE_INTERFACE, TypeBuilder};
