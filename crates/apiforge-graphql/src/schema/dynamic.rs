//! Conversion of built types into `async_graphql::dynamic` types.
//!
//! Every named type reachable from the registry is converted once. Converting
//! a type forces its lazy fields, which may register further types, so the
//! walk repeats until the registry stops growing.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_graphql::dynamic::{
    Field, InputObject, InputValue, Interface, InterfaceField, Object, Scalar, SchemaBuilder,
    TypeRef,
};
use tracing::{debug, trace};

use super::pagination::PaginationType;
use super::type_builder::{NODE_INTERFACE, TypeBuilder};
use crate::Result;
use crate::resolvers::{FieldResolver, connection_pagination};
use crate::types::{
    self, FieldDefinition, InputObjectType, InterfaceType, ObjectType, SchemaType, TypeHandle,
};

/// Converts a type handle into a type reference, collapsing doubled non-null wrappers.
pub(crate) fn type_ref(ty: &SchemaType) -> TypeRef {
    match ty {
        SchemaType::NonNull(inner) => match inner.as_ref() {
            SchemaType::NonNull(_) => type_ref(inner),
            other => TypeRef::NonNull(Box::new(type_ref(other))),
        },
        SchemaType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
        named => TypeRef::named(named.name().to_string()),
    }
}

/// Registers every type of the builder's registry on `schema`.
///
/// `roots` are types referenced by root fields that may not be registered.
///
/// # Errors
///
/// Propagates errors raised while computing lazy fields.
pub(crate) fn register_types(
    mut schema: SchemaBuilder,
    builder: &TypeBuilder,
    roots: &[TypeHandle],
) -> Result<SchemaBuilder> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut visited_entries: HashSet<String> = HashSet::new();
    let mut pending: VecDeque<TypeHandle> = roots.iter().cloned().collect();
    let mut iterable_registered = false;

    loop {
        for (name, handle) in builder.registry().entries() {
            if visited_entries.insert(name) {
                pending.push_back(handle);
            }
        }
        if pending.is_empty() {
            break;
        }

        while let Some(handle) = pending.pop_front() {
            let named = handle.named_type();
            if !seen.insert(named.name().to_string()) {
                continue;
            }

            match named {
                SchemaType::Object(object) => {
                    let fields = object.fields.get(builder)?;
                    enqueue_field_types(&mut pending, fields);
                    schema = schema.register(convert_object(builder, object)?);
                }
                SchemaType::Interface(interface) => {
                    let fields = interface.fields.get(builder)?;
                    enqueue_field_types(&mut pending, fields);
                    schema = schema.register(convert_interface(builder, interface)?);
                }
                SchemaType::InputObject(input) => {
                    let fields = input.fields.get(builder)?;
                    enqueue_field_types(&mut pending, fields);
                    schema = schema.register(convert_input_object(builder, input)?);
                }
                SchemaType::Scalar(scalar) => {
                    if scalar.name == types::ITERABLE {
                        iterable_registered = true;
                    } else if types::builtin_scalar(&scalar.name).is_some() {
                        continue;
                    }
                    let mut custom = Scalar::new(scalar.name.clone());
                    if let Some(description) = &scalar.description {
                        custom = custom.description(description.clone());
                    }
                    schema = schema.register(custom);
                }
                SchemaType::NonNull(_) | SchemaType::List(_) => {}
            }
            trace!(type_name = %named.name(), "Converted schema type");
        }
    }

    if !iterable_registered {
        let iterable = types::iterable();
        let mut scalar = Scalar::new(types::ITERABLE);
        if let Some(description) = iterable.description() {
            scalar = scalar.description(description.to_string());
        }
        schema = schema.register(scalar);
    }

    debug!(types = seen.len(), "Registered dynamic schema types");
    Ok(schema)
}

fn enqueue_field_types(pending: &mut VecDeque<TypeHandle>, fields: &[FieldDefinition]) {
    for field in fields {
        pending.push_back(Arc::clone(&field.ty));
        pending.extend(field.args.iter().map(|arg| Arc::clone(&arg.ty)));
    }
}

fn convert_object(builder: &TypeBuilder, object: &ObjectType) -> Result<Object> {
    let mut converted = Object::new(object.name.clone());
    if let Some(description) = &object.description {
        converted = converted.description(description.clone());
    }

    // Only resource types map `id` to the IRI; payload wrappers read keys as-is.
    let resource_class = object
        .resource_class
        .clone()
        .filter(|_| object.implements(NODE_INTERFACE));

    for field in object.fields.get(builder)? {
        let mut output = Field::new(
            field.name.clone(),
            type_ref(&field.ty),
            FieldResolver::resolve(field.name.clone(), Arc::clone(&field.ty), resource_class.clone()),
        );
        if let Some(description) = &field.description {
            output = output.description(description.clone());
        }
        for argument in field_arguments(builder, field)? {
            output = output.argument(argument);
        }
        converted = converted.field(output);
    }

    for interface in &object.interfaces {
        converted = converted.implement(interface.name().to_string());
    }
    Ok(converted)
}

fn convert_interface(builder: &TypeBuilder, interface: &InterfaceType) -> Result<Interface> {
    let mut converted = Interface::new(interface.name.clone());
    if let Some(description) = &interface.description {
        converted = converted.description(description.clone());
    }
    for field in interface.fields.get(builder)? {
        let mut output = InterfaceField::new(field.name.clone(), type_ref(&field.ty));
        if let Some(description) = &field.description {
            output = output.description(description.clone());
        }
        for argument in field_arguments(builder, field)? {
            output = output.argument(argument);
        }
        converted = converted.field(output);
    }
    Ok(converted)
}

fn convert_input_object(builder: &TypeBuilder, input: &InputObjectType) -> Result<InputObject> {
    let mut converted = InputObject::new(input.name.clone());
    if let Some(description) = &input.description {
        converted = converted.description(description.clone());
    }
    for field in input.fields.get(builder)? {
        converted = converted.field(input_value(field));
    }
    Ok(converted)
}

pub(crate) fn input_value(field: &FieldDefinition) -> InputValue {
    let mut value = InputValue::new(field.name.clone(), type_ref(&field.ty));
    if let Some(description) = &field.description {
        value = value.description(description.clone());
    }
    value
}

/// Declared arguments of a field followed by the pagination arguments of
/// connection-typed fields.
pub(crate) fn field_arguments(
    builder: &TypeBuilder,
    field: &FieldDefinition,
) -> Result<Vec<InputValue>> {
    let mut arguments: Vec<InputValue> = field.args.iter().map(input_value).collect();
    arguments.extend(pagination_arguments(builder, &field.ty)?);
    Ok(arguments)
}

/// Pagination arguments of a connection type: `first`, `last`, `before` and
/// `after` for cursor connections, `page` for page connections.
pub(crate) fn pagination_arguments(builder: &TypeBuilder, ty: &TypeHandle) -> Result<Vec<InputValue>> {
    if ty.is_list() {
        return Ok(Vec::new());
    }
    let is_connection = ty
        .named_type()
        .as_object()
        .is_some_and(|object| object.resource_class.is_none() && object.name.ends_with("Connection"));
    if !is_connection {
        return Ok(Vec::new());
    }

    Ok(match connection_pagination(ty, builder)? {
        PaginationType::Cursor => vec![
            InputValue::new("first", TypeRef::named(TypeRef::INT)),
            InputValue::new("last", TypeRef::named(TypeRef::INT)),
            InputValue::new("before", TypeRef::named(TypeRef::STRING)),
            InputValue::new("after", TypeRef::named(TypeRef::STRING)),
        ],
        PaginationType::Page => vec![InputValue::new("page", TypeRef::named(TypeRef::INT))],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref() {
        let ty = types::non_null(types::list_of(types::non_null(types::string())));
        assert_eq!(type_ref(&ty).to_string(), "[String!]!");

        let doubled = types::non_null(types::non_null(types::id()));
        assert_eq!(type_ref(&doubled).to_string(), "ID!");
    }
}
