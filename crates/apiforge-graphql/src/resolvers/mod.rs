//! GraphQL resolvers for resources.
//!
//! This module provides the resolver implementations for the generated schema:
//! - `query`: item, collection and `node` root fields
//! - `mutation`: `create`/`update`/`delete` and custom mutations
//! - `field`: fields of resource, payload and connection objects
//! - `connection`: cursor- and page-based connection payloads
//!
//! Data access goes through the [`ResourceResolver`] collaborator.

mod connection;
mod field;
mod memory;
mod mutation;
mod query;

pub use connection::{
    CollectionWindow, CursorData, cursor_connection, cursor_window, page_connection, page_window,
};
pub use field::{FieldResolver, resolve_field_value};
pub use memory::InMemoryResourceResolver;
pub use mutation::MutationResolver;
pub use query::{CollectionResolver, ItemResolver, NodeResolver};

pub(crate) use connection::connection_pagination;
pub(crate) use field::to_field_value;

use std::sync::Arc;

use async_graphql::dynamic::ResolverContext;
use async_graphql::Value;
use async_trait::async_trait;

use crate::Result;
use crate::context::GraphQLContext;

/// The owner of a to-many relation being resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRef {
    pub resource_class: String,
    /// Identifier of the owner, as stored in its identity clone.
    pub identifier: serde_json::Value,
    /// Name of the to-many property.
    pub property: String,
}

/// A page of a resource collection to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRequest {
    pub resource_class: String,
    /// Set when fetching the items of a to-many relation.
    pub parent: Option<ParentRef>,
    pub offset: u64,
    pub limit: u64,
}

/// One page of a collection plus the total item count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionPage {
    pub items: Vec<serde_json::Value>,
    pub total: u64,
}

/// A write operation on a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub resource_class: String,
    /// Mutation name (`create`, `update`, `delete` or a custom one).
    pub operation: String,
    /// Identifier of the target item, for operations on existing items.
    pub id: Option<String>,
    /// Denormalized input data.
    pub data: serde_json::Value,
}

/// Data access for the generated schema.
///
/// Implemented by the persistence layer. Returned objects are plain JSON
/// maps that the item normalizer turns into payloads.
#[async_trait]
pub trait ResourceResolver: Send + Sync {
    /// Fetches one item by its identifier.
    async fn item(&self, resource_class: &str, id: &str) -> Result<Option<serde_json::Value>>;

    /// Fetches a page of a collection.
    async fn collection(&self, request: &CollectionRequest) -> Result<CollectionPage>;

    /// Applies a mutation and returns the resulting item.
    ///
    /// `delete` returns the removed item; `None` means the target does not exist.
    async fn mutate(&self, request: &MutationRequest) -> Result<Option<serde_json::Value>>;
}

/// Dynamic resource resolver type alias.
pub type DynResourceResolver = Arc<dyn ResourceResolver>;

/// Helper to extract the GraphQL context from the resolver context.
pub(crate) fn get_graphql_context<'a>(
    ctx: &'a ResolverContext<'_>,
) -> std::result::Result<&'a GraphQLContext, async_graphql::Error> {
    ctx.data::<GraphQLContext>()
        .map_err(|_| async_graphql::Error::new("GraphQL context not available"))
}

/// Convert a serde_json::Value to async_graphql::Value.
pub(crate) fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(
                    async_graphql::Number::from_f64(f)
                        .unwrap_or_else(|| async_graphql::Number::from(0)),
                )
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::List(arr.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(obj) => {
            let map: async_graphql::indexmap::IndexMap<async_graphql::Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (async_graphql::Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}
