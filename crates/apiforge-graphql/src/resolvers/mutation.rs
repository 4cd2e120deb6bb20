//! Mutation resolver.
//!
//! Handles `{mutation}{Short}(input: {mutation}{Short}Input!)` fields for the
//! built-in `create`/`update`/`delete` mutations and custom ones. The input
//! is denormalized through the item normalizer before it reaches the
//! [`ResourceResolver`](super::ResourceResolver); the result is normalized
//! back into the `{mutation}{Short}Payload` shape.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use super::{MutationRequest, get_graphql_context, to_field_value};
use crate::Result;
use crate::context::GraphQLContext;
use crate::error::GraphQLError;
use crate::metadata::{ResourceMetadata, lcfirst};
use crate::schema::CLIENT_MUTATION_ID;
use crate::serializer::SerializerContext;
use crate::types::TypeHandle;

/// Resolver for resource mutations.
///
/// Handles mutations like:
/// ```graphql
/// mutation {
///   createDummy(input: {name: "Foo", clientMutationId: "1"}) {
///     dummy { id name }
///     clientMutationId
///   }
/// }
/// ```
pub struct MutationResolver;

impl MutationResolver {
    /// Creates a resolver for one mutation of a resource.
    ///
    /// # Arguments
    /// * `resource_class` - The resource class being mutated
    /// * `operation` - The mutation name (`create`, `update`, `delete`, ...)
    /// * `short_name` - The resource short name, used as payload field name
    /// * `payload_type` - The `{mutation}{Short}Payload` type
    pub fn resolve(
        resource_class: String,
        operation: String,
        short_name: String,
        payload_type: TypeHandle,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let resource_class = resource_class.clone();
            let operation = operation.clone();
            let short_name = short_name.clone();
            let payload_type = Arc::clone(&payload_type);

            FieldFuture::new(async move {
                debug!(
                    resource_class = %resource_class,
                    operation = %operation,
                    "Processing mutation"
                );

                let gql_ctx = get_graphql_context(&ctx)?;

                let input = ctx
                    .args
                    .get("input")
                    .ok_or_else(|| async_graphql::Error::new("Missing required argument 'input'"))?
                    .as_value()
                    .clone()
                    .into_json()?;

                let payload = execute(gql_ctx, &resource_class, &operation, &short_name, input)
                    .await
                    .map_err(|e| {
                        warn!(
                            error = %e,
                            resource_class = %resource_class,
                            operation = %operation,
                            "Mutation failed"
                        );
                        e.into_graphql_error()
                    })?;

                to_field_value(payload, &payload_type, gql_ctx)
                    .map_err(GraphQLError::into_graphql_error)
            })
        }
    }
}

async fn execute(
    gql_ctx: &GraphQLContext,
    resource_class: &str,
    operation: &str,
    short_name: &str,
    input: Value,
) -> Result<Value> {
    let Value::Object(mut input) = input else {
        return Err(GraphQLError::UnexpectedValue(
            "Mutation input must be an object".to_string(),
        ));
    };

    let client_mutation_id = input.remove(CLIENT_MUTATION_ID).unwrap_or(Value::Null);
    let iri = match input.remove("id") {
        Some(Value::String(iri)) => Some(iri),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(GraphQLError::UnexpectedValue(format!(
                "\"id\" must be an IRI string, got {other}"
            )));
        }
    };

    let id = match &iri {
        Some(iri) => {
            let (metadata, id) = gql_ctx.iri.parse(iri)?;
            let matches = metadata.resource_class == resource_class
                || metadata.implements.iter().any(|class| class == resource_class);
            if !matches {
                return Err(GraphQLError::NotFound(format!(
                    "Item \"{iri}\" is not a \"{short_name}\""
                )));
            }
            Some(id)
        }
        None => None,
    };

    let serializer_context = SerializerContext::new(resource_class).operation(operation);
    let metadata = gql_ctx.type_builder.metadata_factory().create(resource_class)?;
    // Explicit mutation arguments are not resource properties.
    let data = if metadata.mutation_args(operation).is_some() {
        Value::Object(input)
    } else {
        gql_ctx
            .normalizer
            .denormalize_item(&Value::Object(input), &serializer_context.clone().denormalizing())?
    };
    let data = relation_identifiers(gql_ctx, &metadata, data)?;

    trace!(
        resource_class = %resource_class,
        operation = %operation,
        id = ?id,
        "Applying mutation via resolver"
    );

    let request = MutationRequest {
        resource_class: resource_class.to_string(),
        operation: operation.to_string(),
        id,
        data,
    };
    let result = gql_ctx.resolver.mutate(&request).await?.ok_or_else(|| {
        GraphQLError::NotFound(match &iri {
            Some(iri) => format!("Item \"{iri}\" not found."),
            None => format!("Mutation \"{operation}\" on \"{short_name}\" returned no item."),
        })
    })?;

    let item = gql_ctx.normalizer.normalize_item(&result, &serializer_context)?;

    debug!(
        resource_class = %resource_class,
        operation = %operation,
        "Mutation applied"
    );

    let mut payload = Map::new();
    payload.insert(lcfirst(short_name), item);
    payload.insert(CLIENT_MUTATION_ID.to_string(), client_mutation_id);
    Ok(Value::Object(payload))
}

/// Replaces relation IRIs in denormalized data with the related identifiers.
fn relation_identifiers(
    gql_ctx: &GraphQLContext,
    metadata: &ResourceMetadata,
    data: Value,
) -> Result<Value> {
    let Value::Object(mut data) = data else {
        return Ok(data);
    };
    let identifier = |value: &Value| -> Result<Value> {
        match value {
            Value::String(iri) if iri.starts_with('/') || iri.contains("://") => {
                let (_, id) = gql_ctx.iri.parse(iri)?;
                Ok(Value::String(id))
            }
            other => Ok(other.clone()),
        }
    };

    for property in &metadata.properties {
        let is_relation = property.is_to_many() || property.property_type.class_name.is_some();
        if !is_relation {
            continue;
        }
        let Some(value) = data.get_mut(&property.name) else {
            continue;
        };
        *value = match &*value {
            Value::Array(items) => Value::Array(items.iter().map(identifier).collect::<Result<_>>()?),
            other => identifier(other)?,
        };
    }
    Ok(Value::Object(data))
}
