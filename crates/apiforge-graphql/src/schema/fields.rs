//! Field enumeration for resource types.
//!
//! The type builder delegates the field list of non-wrapped resource types to
//! a [`FieldsBuilder`]. [`MetadataFieldsBuilder`] derives fields from the
//! property metadata of the resource.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use super::naming::TypeRequest;
use super::type_builder::TypeBuilder;
use crate::Result;
use crate::error::GraphQLError;
use crate::metadata::{
    ArgumentMetadata, BuiltinType, COLLECTION_QUERY, PropertyMetadata, PropertyType,
    ResourceMetadata,
};
use crate::types::{self, FieldDefinition, SchemaType, TypeHandle};

/// Name of the field echoing the client mutation id.
pub const CLIENT_MUTATION_ID: &str = "clientMutationId";
/// Name of the field echoing the client subscription id.
pub const CLIENT_SUBSCRIPTION_ID: &str = "clientSubscriptionId";

/// Builds the fields of resource object, interface and input types.
pub trait FieldsBuilder: Send + Sync {
    /// Returns the fields of the resource type described by `request`.
    ///
    /// `io_class` is the input/output class override of the operation, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if a related type cannot be built.
    fn resource_object_type_fields(
        &self,
        builder: &TypeBuilder,
        resource_class: Option<&str>,
        metadata: &ResourceMetadata,
        request: &TypeRequest,
        io_class: Option<&str>,
    ) -> Result<Vec<FieldDefinition>>;

    /// Resolves raw mutation arguments into field definitions.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::UnexpectedValue` if an argument type cannot be resolved.
    fn resolve_resource_args(
        &self,
        builder: &TypeBuilder,
        args: &IndexMap<String, ArgumentMetadata>,
        mutation_name: &str,
        short_name: &str,
    ) -> Result<Vec<FieldDefinition>>;
}

/// Derives resource fields from property metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataFieldsBuilder;

impl MetadataFieldsBuilder {
    pub fn new() -> Self {
        Self
    }

    fn property_field(
        &self,
        builder: &TypeBuilder,
        property: &PropertyMetadata,
        request: &TypeRequest,
    ) -> Result<Option<FieldDefinition>> {
        let Some(ty) = self.convert_type(builder, &property.property_type, request)? else {
            return Ok(None);
        };

        let non_null = if request.input {
            property.required && request.mutation_name.as_deref() != Some("update")
        } else {
            property.required
        };
        let ty = if non_null { types::non_null(ty) } else { ty };

        // The domain identifier is exposed as `_id`; `id` is the IRI.
        let name = if property.name == "id" {
            "_id".to_string()
        } else {
            property.name.clone()
        };

        let mut field = FieldDefinition::new(name, ty);
        if let Some(description) = &property.description {
            field = field.description(description.clone());
        }
        Ok(Some(field))
    }

    fn convert_type(
        &self,
        builder: &TypeBuilder,
        property_type: &PropertyType,
        request: &TypeRequest,
    ) -> Result<Option<TypeHandle>> {
        if builder.is_collection(property_type) {
            let Some(class) = property_type.collection_value_class() else {
                return Ok(None);
            };
            if request.input {
                return Ok(Some(types::list_of(types::string())));
            }
            if !builder.metadata_factory().is_resource_class(class) {
                return Ok(Some(types::iterable()));
            }
            let target = builder.metadata_factory().create(class)?;
            let item_type = builder.get_resource_object_type(
                Some(class),
                &target,
                &TypeRequest::query(COLLECTION_QUERY).depth(request.depth + 1),
            )?;
            let connection =
                builder.get_resource_paginated_collection_type(&item_type, class, COLLECTION_QUERY)?;
            return Ok(Some(connection));
        }

        let ty = match property_type.builtin {
            BuiltinType::Int => types::int(),
            BuiltinType::Float => types::float(),
            BuiltinType::String => types::string(),
            BuiltinType::Bool => types::boolean(),
            BuiltinType::Array | BuiltinType::Iterable => types::iterable(),
            BuiltinType::Object => {
                let Some(class) = property_type.class_name.as_deref() else {
                    return Ok(Some(types::iterable()));
                };
                if !builder.metadata_factory().is_resource_class(class) {
                    // Embedded value objects are passed through as-is.
                    return Ok(Some(types::iterable()));
                }
                if request.input {
                    types::string()
                } else {
                    let target = builder.metadata_factory().create(class)?;
                    builder.get_resource_object_type(Some(class), &target, &request.nested())?
                }
            }
        };
        Ok(Some(ty))
    }
}

impl FieldsBuilder for MetadataFieldsBuilder {
    fn resource_object_type_fields(
        &self,
        builder: &TypeBuilder,
        _resource_class: Option<&str>,
        metadata: &ResourceMetadata,
        request: &TypeRequest,
        io_class: Option<&str>,
    ) -> Result<Vec<FieldDefinition>> {
        let mutation = request.mutation_name.as_deref();
        let mut fields = Vec::new();

        let id_field = FieldDefinition::new("id", types::non_null(types::id()));
        if !request.input || mutation != Some("create") {
            fields.push(id_field);
        }

        if request.input && request.subscription_name.is_some() {
            fields.push(FieldDefinition::new(CLIENT_SUBSCRIPTION_ID, types::string()));
            return Ok(fields);
        }

        if request.input && mutation == Some("delete") {
            fields.push(FieldDefinition::new(CLIENT_MUTATION_ID, types::string()));
            return Ok(fields);
        }

        // An input/output class that is itself described by metadata supplies the properties.
        let io_metadata = io_class.and_then(|class| builder.metadata_factory().create(class).ok());
        let properties = io_metadata
            .as_deref()
            .map_or(&metadata.properties, |io| &io.properties);

        for property in properties {
            let skip = if request.input {
                !property.writable
            } else {
                !property.readable
            };
            if skip {
                continue;
            }
            if let Some(field) = self.property_field(builder, property, request)? {
                fields.push(field);
            }
        }

        if request.input && mutation.is_some() {
            fields.push(FieldDefinition::new(CLIENT_MUTATION_ID, types::string()));
        }

        trace!(
            short_name = %metadata.short_name,
            count = fields.len(),
            input = request.input,
            "Built resource fields"
        );
        Ok(fields)
    }

    fn resolve_resource_args(
        &self,
        builder: &TypeBuilder,
        args: &IndexMap<String, ArgumentMetadata>,
        mutation_name: &str,
        short_name: &str,
    ) -> Result<Vec<FieldDefinition>> {
        args.iter()
            .map(|(name, arg)| {
                let ty = parse_type_expression(builder, &arg.type_name).map_err(|e| {
                    GraphQLError::UnexpectedValue(format!(
                        "Argument \"{name}\" of mutation \"{mutation_name}\" on \"{short_name}\": {e}"
                    ))
                })?;
                let mut field = FieldDefinition::new(name.clone(), ty);
                if let Some(description) = &arg.description {
                    field = field.description(description.clone());
                }
                Ok(field)
            })
            .collect()
    }
}

/// Parses a GraphQL type expression such as `[ID!]!` into a type handle.
///
/// Named types must be built-in scalars or already registered.
///
/// # Errors
///
/// Returns `GraphQLError::UnexpectedValue` for malformed expressions or unknown types.
pub fn parse_type_expression(builder: &TypeBuilder, expression: &str) -> Result<TypeHandle> {
    let expression = expression.trim();
    if let Some(inner) = expression.strip_suffix('!') {
        return Ok(types::non_null(parse_type_expression(builder, inner)?));
    }
    if let Some(inner) = expression
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return Ok(types::list_of(parse_type_expression(builder, inner)?));
    }
    if expression.is_empty() || expression.contains(['[', ']', '!']) {
        return Err(GraphQLError::UnexpectedValue(format!(
            "malformed type expression \"{expression}\""
        )));
    }
    if let Some(scalar) = types::builtin_scalar(expression) {
        return Ok(scalar);
    }
    // Input types are registered wrapped in a non-null modifier.
    match builder.registry().find(expression) {
        Some(handle) => match handle.as_ref() {
            SchemaType::NonNull(inner) => Ok(Arc::clone(inner)),
            _ => Ok(handle),
        },
        None => Err(GraphQLError::UnexpectedValue(format!(
            "the type \"{expression}\" was not resolved"
        ))),
    }
}
