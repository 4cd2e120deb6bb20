//! Query root resolvers.
//!
//! Implements the item (`dummy(id: ID!)`), collection (`dummies(first: ...)`)
//! and `node(id: ID!)` root fields. Items are addressed by IRI.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ObjectAccessor, ResolverContext};
use serde_json::Value;
use tracing::{debug, warn};

use super::connection::{
    connection_pagination, cursor_connection, cursor_window, page_connection, page_window,
};
use super::{CollectionRequest, ParentRef, get_graphql_context, to_field_value};
use crate::Result;
use crate::context::GraphQLContext;
use crate::error::GraphQLError;
use crate::metadata::ITEM_QUERY;
use crate::schema::PaginationType;
use crate::serializer::{ITEM_RESOURCE_CLASS_KEY, SerializerContext};
use crate::types::TypeHandle;

/// Resolver for item queries.
pub struct ItemResolver;

impl ItemResolver {
    /// Creates a resolver fetching one `resource_class` item by IRI.
    ///
    /// Returns null when the IRI points at another resource.
    pub fn resolve(
        resource_class: String,
        item_type: TypeHandle,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let resource_class = resource_class.clone();
            let item_type = Arc::clone(&item_type);
            FieldFuture::new(async move {
                let iri = required_id(&ctx)?;
                let gql_ctx = get_graphql_context(&ctx)?;

                debug!(resource_class = %resource_class, iri = %iri, "Resolving item query");

                let item = fetch_item(gql_ctx, Some(&resource_class), iri)
                    .await
                    .map_err(GraphQLError::into_graphql_error)?;
                match item {
                    Some(payload) => to_field_value(payload, &item_type, gql_ctx)
                        .map_err(GraphQLError::into_graphql_error),
                    None => Ok(None),
                }
            })
        }
    }
}

/// Resolver for the `node` root field.
pub struct NodeResolver;

impl NodeResolver {
    /// Creates a resolver fetching any resource by IRI.
    pub fn resolve(
        node_type: TypeHandle,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let node_type = Arc::clone(&node_type);
            FieldFuture::new(async move {
                let iri = required_id(&ctx)?;
                let gql_ctx = get_graphql_context(&ctx)?;

                debug!(iri = %iri, "Resolving node query");

                let item = fetch_item(gql_ctx, None, iri)
                    .await
                    .map_err(GraphQLError::into_graphql_error)?;
                match item {
                    Some(payload) => to_field_value(payload, &node_type, gql_ctx)
                        .map_err(GraphQLError::into_graphql_error),
                    None => Ok(None),
                }
            })
        }
    }
}

/// Resolver for collection queries.
pub struct CollectionResolver;

impl CollectionResolver {
    /// Creates a resolver returning a page of `resource_class` as a connection.
    pub fn resolve(
        resource_class: String,
        operation: String,
        connection_type: TypeHandle,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let resource_class = resource_class.clone();
            let operation = operation.clone();
            let connection_type = Arc::clone(&connection_type);
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;

                debug!(
                    resource_class = %resource_class,
                    operation = %operation,
                    "Resolving collection query"
                );

                let payload = collection_payload(
                    gql_ctx,
                    &ctx.args,
                    &resource_class,
                    None,
                    &connection_type,
                    &operation,
                )
                .await
                .map_err(|e| {
                    warn!(error = %e, resource_class = %resource_class, "Collection query failed");
                    e.into_graphql_error()
                })?;

                to_field_value(payload, &connection_type, gql_ctx)
                    .map_err(GraphQLError::into_graphql_error)
            })
        }
    }
}

fn required_id<'a>(ctx: &'a ResolverContext<'_>) -> std::result::Result<&'a str, async_graphql::Error> {
    ctx.args
        .get("id")
        .and_then(|v| v.string().ok())
        .ok_or_else(|| async_graphql::Error::new("Missing required argument 'id'"))
}

/// Fetches and normalizes the item behind an IRI.
///
/// With `expected_class` set, items of other resources (that do not
/// implement it) are treated as missing.
async fn fetch_item(
    gql_ctx: &GraphQLContext,
    expected_class: Option<&str>,
    iri: &str,
) -> Result<Option<Value>> {
    let (metadata, id) = match gql_ctx.iri.parse(iri) {
        Ok(parsed) => parsed,
        Err(GraphQLError::NotFound(reason)) => {
            debug!(iri = %iri, reason = %reason, "IRI does not match any resource");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if let Some(expected) = expected_class {
        let matches = metadata.resource_class == expected
            || metadata.implements.iter().any(|class| class == expected);
        if !matches {
            debug!(
                iri = %iri,
                expected = %expected,
                actual = %metadata.resource_class,
                "IRI points at another resource"
            );
            return Ok(None);
        }
    }

    let Some(object) = gql_ctx.resolver.item(&metadata.resource_class, &id).await? else {
        debug!(iri = %iri, "Resource not found");
        return Ok(None);
    };

    let context = SerializerContext::new(metadata.resource_class.clone()).operation(ITEM_QUERY);
    gql_ctx.normalizer.normalize_item(&object, &context).map(Some)
}

/// Fetches one page of a collection and builds its connection payload.
///
/// The connection shape (cursor or page) is read from `connection_type`.
pub(crate) async fn collection_payload(
    gql_ctx: &GraphQLContext,
    args: &ObjectAccessor<'_>,
    resource_class: &str,
    parent: Option<ParentRef>,
    connection_type: &TypeHandle,
    operation: &str,
) -> Result<Value> {
    let pagination = connection_pagination(connection_type, &gql_ctx.type_builder)?;
    let int_arg = |name: &str| args.get(name).and_then(|v| v.i64().ok());

    let window = match pagination {
        PaginationType::Cursor => {
            let before = args.get("before").and_then(|v| v.string().ok());
            let after = args.get("after").and_then(|v| v.string().ok());
            let last = int_arg("last");

            let total = if last.is_some() && before.is_none() {
                let request = CollectionRequest {
                    resource_class: resource_class.to_string(),
                    parent: parent.clone(),
                    offset: 0,
                    limit: 0,
                };
                Some(gql_ctx.resolver.collection(&request).await?.total)
            } else {
                None
            };

            cursor_window(
                int_arg("first"),
                last,
                before,
                after,
                gql_ctx.items_per_page,
                total,
            )?
        }
        PaginationType::Page => page_window(int_arg("page"), gql_ctx.items_per_page),
    };

    let request = CollectionRequest {
        resource_class: resource_class.to_string(),
        parent,
        offset: window.offset,
        limit: window.limit,
    };
    let page = gql_ctx.resolver.collection(&request).await?;

    let items = page
        .items
        .iter()
        .map(|object| {
            // Interface collections hold items of the implementing resources.
            let class = object
                .get(ITEM_RESOURCE_CLASS_KEY)
                .and_then(Value::as_str)
                .unwrap_or(resource_class);
            let context = SerializerContext::new(class).operation(operation);
            gql_ctx.normalizer.normalize_item(object, &context)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(match pagination {
        PaginationType::Cursor => cursor_connection(items, window.offset, page.total),
        PaginationType::Page => page_connection(items, window.limit, page.total),
    })
}
