//! GraphQL execution context.
//!
//! Holds everything the field resolvers need at request time: the type
//! builder (and through it the type registry and metadata), the item
//! normalizer, the IRI converter and the data resolver. The schema builder
//! attaches one context to the schema as shared data.
//!
//! # Example
//!
//! ```ignore
//! use apiforge_graphql::GraphQLContextBuilder;
//!
//! let context = GraphQLContextBuilder::new()
//!     .with_type_builder(type_builder)
//!     .with_resolver(resolver)
//!     .with_iri_prefix("/api")
//!     .build()?;
//! ```

use std::sync::Arc;

use crate::resolvers::DynResourceResolver;
use crate::schema::TypeBuilder;
use crate::serializer::{IriConverter, ItemNormalizer};

/// Default page size of collection queries.
pub const DEFAULT_ITEMS_PER_PAGE: u64 = 30;

/// GraphQL execution context.
///
/// Cheap to clone; every component is shared.
#[derive(Clone)]
pub struct GraphQLContext {
    /// Type builder holding the registry the schema was built from.
    pub type_builder: TypeBuilder,

    /// Normalizer applied to every item returned by the resolver.
    pub normalizer: Arc<ItemNormalizer>,

    /// Data access collaborator.
    pub resolver: DynResourceResolver,

    pub iri: IriConverter,

    /// Page size used when a collection query sets none.
    pub items_per_page: u64,
}

impl GraphQLContext {
    /// Creates a new context builder.
    #[must_use]
    pub fn builder() -> GraphQLContextBuilder {
        GraphQLContextBuilder::new()
    }
}

impl std::fmt::Debug for GraphQLContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLContext")
            .field("type_builder", &self.type_builder)
            .field("iri", &self.iri)
            .field("items_per_page", &self.items_per_page)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing GraphQLContext.
#[derive(Default)]
pub struct GraphQLContextBuilder {
    type_builder: Option<TypeBuilder>,
    normalizer: Option<Arc<ItemNormalizer>>,
    resolver: Option<DynResourceResolver>,
    iri_prefix: String,
    items_per_page: Option<u64>,
}

impl GraphQLContextBuilder {
    /// Creates a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type_builder(mut self, type_builder: TypeBuilder) -> Self {
        self.type_builder = Some(type_builder);
        self
    }

    /// Overrides the default item normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Arc<ItemNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: DynResourceResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn with_iri_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.iri_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_items_per_page(mut self, items_per_page: u64) -> Self {
        self.items_per_page = Some(items_per_page);
        self
    }

    /// Builds the GraphQLContext.
    ///
    /// The normalizer defaults to an [`ItemNormalizer`] over the type
    /// builder's metadata factory.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<GraphQLContext, ContextBuilderError> {
        let type_builder = self
            .type_builder
            .ok_or(ContextBuilderError::MissingField("type_builder"))?;

        let resolver = self
            .resolver
            .ok_or(ContextBuilderError::MissingField("resolver"))?;

        let metadata = Arc::clone(type_builder.metadata_factory());
        let normalizer = self
            .normalizer
            .unwrap_or_else(|| Arc::new(ItemNormalizer::new(Arc::clone(&metadata))));

        Ok(GraphQLContext {
            iri: IriConverter::new(metadata, self.iri_prefix),
            type_builder,
            normalizer,
            resolver,
            items_per_page: self.items_per_page.unwrap_or(DEFAULT_ITEMS_PER_PAGE),
        })
    }
}

/// Errors that can occur when building a GraphQLContext.
#[derive(Debug, thiserror::Error)]
pub enum ContextBuilderError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
