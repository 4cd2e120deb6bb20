//! Field resolution over normalized payloads.
//!
//! Objects travel through the executor as `serde_json::Value` payloads. A field
//! reads the same-named payload key, except on resource types where `id` is
//! the IRI computed from the identity clone and `_id` is the domain identifier.
//! To-many relations, omitted by the normalizer, are fetched per field.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use serde_json::Value;
use tracing::trace;

use super::query::collection_payload;
use super::{ParentRef, get_graphql_context, json_to_graphql_value};
use crate::Result;
use crate::context::GraphQLContext;
use crate::error::GraphQLError;
use crate::metadata::{COLLECTION_QUERY, DynMetadataFactory};
use crate::serializer::{IriConverter, decode_item};
use crate::types::{SchemaType, TypeHandle};

/// Resolver for fields of object and interface types.
pub struct FieldResolver;

impl FieldResolver {
    /// Creates a resolver function for one field.
    ///
    /// `resource_class` is set on resource object types and enables the
    /// `id`/`_id` mapping and the lazy to-many resolution.
    pub fn resolve(
        field_name: String,
        field_type: TypeHandle,
        resource_class: Option<String>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let field_name = field_name.clone();
            let field_type = Arc::clone(&field_type);
            let resource_class = resource_class.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let parent = ctx.parent_value.try_downcast_ref::<Value>()?;

                let value = resolve_field_value(parent, &field_name, resource_class.is_some(), &gql_ctx.iri)
                    .map_err(GraphQLError::into_graphql_error)?;

                let value = match (value, resource_class.as_deref()) {
                    (Some(value), _) => value,
                    (None, Some(class)) => {
                        let related =
                            related_collection(gql_ctx, &ctx, parent, class, &field_name, &field_type)
                                .await
                                .map_err(GraphQLError::into_graphql_error)?;
                        match related {
                            Some(value) => value,
                            None => return Ok(None),
                        }
                    }
                    (None, None) => return Ok(None),
                };

                to_field_value(value, &field_type, gql_ctx).map_err(GraphQLError::into_graphql_error)
            })
        }
    }
}

/// Reads the value of `field_name` from a payload.
///
/// # Errors
///
/// Returns an error if the IRI of a resource payload cannot be computed.
pub fn resolve_field_value(
    parent: &Value,
    field_name: &str,
    resource_type: bool,
    iri: &IriConverter,
) -> Result<Option<Value>> {
    if resource_type {
        match field_name {
            "id" => {
                if let Some(iri) = iri.iri_from_payload(parent)? {
                    return Ok(Some(Value::String(iri)));
                }
            }
            "_id" => {
                return Ok(parent.get("_id").or_else(|| parent.get("id")).cloned());
            }
            _ => {}
        }
    }
    Ok(parent.get(field_name).cloned())
}

/// Fetches the connection payload of a to-many relation of `parent`.
///
/// Returns `None` when the field is not a to-many relation of a resource, for
/// instance on output classes that only share the resource's shape.
async fn related_collection(
    gql_ctx: &GraphQLContext,
    ctx: &ResolverContext<'_>,
    parent: &Value,
    resource_class: &str,
    field_name: &str,
    field_type: &TypeHandle,
) -> Result<Option<Value>> {
    let Some((target_class, parent_ref)) =
        related_parent(gql_ctx.type_builder.metadata_factory(), parent, resource_class, field_name)?
    else {
        return Ok(None);
    };

    trace!(
        resource_class = %resource_class,
        property = %field_name,
        target = %target_class,
        "Resolving to-many relation"
    );

    collection_payload(
        gql_ctx,
        &ctx.args,
        &target_class,
        Some(parent_ref),
        field_type,
        COLLECTION_QUERY,
    )
    .await
    .map(Some)
}

/// Target class of a to-many relation and the reference to its owner.
///
/// # Errors
///
/// Returns `GraphQLError::UnexpectedValue` if the parent payload has no
/// identity clone carrying the identifier.
fn related_parent(
    factory: &DynMetadataFactory,
    parent: &Value,
    resource_class: &str,
    field_name: &str,
) -> Result<Option<(String, ParentRef)>> {
    if !factory.is_resource_class(resource_class) {
        return Ok(None);
    }
    let metadata = factory.create(resource_class)?;
    let Some(property) = metadata.property(field_name).filter(|p| p.is_to_many()) else {
        return Ok(None);
    };
    let Some(target_class) = property.property_type.collection_value_class() else {
        return Ok(None);
    };

    let item = decode_item(parent)?;
    let identifier_name = metadata
        .identifier_property()
        .map_or("id", |p| p.name.as_str());
    let identifier = item.get(identifier_name).cloned().ok_or_else(|| {
        GraphQLError::UnexpectedValue(format!(
            "Item of \"{}\" has no \"{identifier_name}\" identifier",
            metadata.short_name
        ))
    })?;

    let parent_ref = ParentRef {
        resource_class: resource_class.to_string(),
        identifier,
        property: field_name.to_string(),
    };
    Ok(Some((target_class.to_string(), parent_ref)))
}

/// Converts a payload value into the executor value of the declared type.
///
/// Objects stay JSON payloads; interface values are tagged with the concrete
/// type their interface resolves them to.
pub(crate) fn to_field_value(
    value: Value,
    ty: &TypeHandle,
    gql_ctx: &GraphQLContext,
) -> Result<Option<FieldValue<'static>>> {
    match ty.as_ref() {
        SchemaType::NonNull(inner) => to_field_value(value, inner, gql_ctx),
        _ if value.is_null() => Ok(None),
        SchemaType::List(inner) => {
            let Value::Array(items) = value else {
                return Err(GraphQLError::UnexpectedValue(format!(
                    "Expected a list for \"{ty}\""
                )));
            };
            let values = items
                .into_iter()
                .map(|item| Ok(to_field_value(item, inner, gql_ctx)?.unwrap_or(FieldValue::NULL)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(FieldValue::list(values)))
        }
        SchemaType::Scalar(_) => Ok(Some(FieldValue::value(json_to_graphql_value(value)))),
        SchemaType::Object(_) => Ok(Some(FieldValue::owned_any(value))),
        SchemaType::Interface(interface) => {
            let concrete = interface
                .resolve_type(&value, ty, gql_ctx.type_builder.registry())?
                .ok_or_else(|| {
                    GraphQLError::UnexpectedValue(format!(
                        "Could not resolve the concrete type of \"{}\"",
                        interface.name
                    ))
                })?;
            Ok(Some(
                FieldValue::owned_any(value).with_type(concrete.name().to_string()),
            ))
        }
        SchemaType::InputObject(input) => Err(GraphQLError::Logic(format!(
            "Input type \"{}\" cannot be used as an output type.",
            input.name
        ))),
    }
}
