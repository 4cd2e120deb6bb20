//! # apiforge-graphql
//!
//! GraphQL layer for metadata-driven resource APIs.
//!
//! This crate derives a GraphQL schema from declarative resource metadata and
//! serves it through `async-graphql`'s dynamic schema. It supports:
//!
//! - Object, interface, input and connection types generated per resource and operation
//! - Item and collection queries, Relay `node` lookup and cursor or page pagination
//! - `create`/`update`/`delete` and custom mutations with `clientMutationId` payloads
//! - Subscription payload types for mercure-enabled resources
//! - Normalization of domain objects into payloads with deferred to-many relations
//! - Query shape predicates that decide how a database paginator must run
//!
//! ## Overview
//!
//! Every resource is described by a [`ResourceMetadata`](metadata::ResourceMetadata)
//! served by a [`ResourceMetadataFactory`](metadata::ResourceMetadataFactory).
//! The [`TypeBuilder`] caches each generated type in a [`TypeRegistry`] by its
//! generated name, so asking for the same type twice returns the same handle.
//! Data access is delegated to a [`ResourceResolver`](resolvers::ResourceResolver).
//!
//! ## Configuration
//!
//! ```toml
//! [graphql]
//! enabled = true
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! default_pagination_type = "cursor"
//! items_per_page = 30
//! iri_prefix = "/api"
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`metadata`] - Resource metadata model and factories
//! - [`types`] - Schema type model and the type registry
//! - [`schema`] - Type building, schema assembly and lazy loading
//! - [`serializer`] - Item normalizer and IRIs
//! - [`resolvers`] - Field resolvers and the data resolver seam
//! - [`query`] - Query shape checker and paginator strategy
//! - [`context`] - GraphQL execution context
//! - [`error`] - Error types for GraphQL operations

pub mod config;
pub mod context;
pub mod error;
pub mod metadata;
pub mod query;
pub mod resolvers;
pub mod schema;
pub mod serializer;
pub mod types;

// Re-export main types
pub use config::GraphQLConfig;
pub use context::{GraphQLContext, GraphQLContextBuilder};
pub use error::GraphQLError;
pub use metadata::{InMemoryMetadataFactory, ResourceMetadata};
pub use resolvers::{InMemoryResourceResolver, ResourceResolver};
pub use schema::{LazySchema, ResourceSchemaBuilder, SchemaBuilderConfig, TypeBuilder};
pub use serializer::ItemNormalizer;
pub use types::TypeRegistry;

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
