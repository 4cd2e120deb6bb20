use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use super::{ITEM_KEY, ITEM_RESOURCE_CLASS_KEY, SerializerContext};
use crate::Result;
use crate::error::GraphQLError;
use crate::metadata::{BuiltinType, DynMetadataFactory, ResourceMetadata};

/// Converts domain objects to payloads and back.
pub trait Normalizer: Send + Sync {
    /// Normalizes `object` into a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be normalized.
    fn normalize(
        &self,
        object: &Value,
        metadata: &ResourceMetadata,
        context: &SerializerContext,
    ) -> Result<Value>;

    /// Attributes that may be read (normalize) or written (denormalize).
    fn allowed_attributes(
        &self,
        metadata: &ResourceMetadata,
        context: &SerializerContext,
    ) -> Vec<String>;

    /// Writes one attribute onto the object being denormalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute cannot be set.
    fn set_attribute_value(
        &self,
        object: &mut Map<String, Value>,
        attribute: &str,
        value: Value,
        metadata: &ResourceMetadata,
        context: &SerializerContext,
    ) -> Result<()>;

    /// Builds an object from input data, keeping allowed attributes only.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::UnexpectedValue` if `data` is not a map.
    fn denormalize(
        &self,
        data: &Value,
        metadata: &ResourceMetadata,
        context: &SerializerContext,
    ) -> Result<Value> {
        let Value::Object(input) = data else {
            return Err(GraphQLError::UnexpectedValue(format!(
                "Expected input data to be an object, got {}",
                json_kind(data)
            )));
        };
        denormalize_attributes(self, input, metadata, context)
    }
}

fn denormalize_attributes<N: Normalizer + ?Sized>(
    normalizer: &N,
    input: &Map<String, Value>,
    metadata: &ResourceMetadata,
    context: &SerializerContext,
) -> Result<Value> {
    let allowed = normalizer.allowed_attributes(metadata, context);
    let mut object = Map::new();
    for (attribute, value) in input {
        if !allowed.iter().any(|a| a == attribute) {
            continue;
        }
        normalizer.set_attribute_value(&mut object, attribute, value.clone(), metadata, context)?;
    }
    Ok(Value::Object(object))
}

/// Base normalizer over plain JSON objects.
///
/// Normalization keeps readable declared properties; resources without
/// declared properties are passed through without the reserved payload keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectNormalizer;

impl Normalizer for ObjectNormalizer {
    fn normalize(
        &self,
        object: &Value,
        metadata: &ResourceMetadata,
        _context: &SerializerContext,
    ) -> Result<Value> {
        let Value::Object(fields) = object else {
            return Ok(object.clone());
        };
        if metadata.properties.is_empty() {
            let mut fields = fields.clone();
            fields.remove(ITEM_KEY);
            fields.remove(ITEM_RESOURCE_CLASS_KEY);
            return Ok(Value::Object(fields));
        }

        let data = metadata
            .properties
            .iter()
            .filter(|property| property.readable)
            .filter_map(|property| {
                fields
                    .get(&property.name)
                    .map(|value| (property.name.clone(), value.clone()))
            })
            .collect();
        Ok(Value::Object(data))
    }

    fn allowed_attributes(
        &self,
        metadata: &ResourceMetadata,
        context: &SerializerContext,
    ) -> Vec<String> {
        metadata
            .properties
            .iter()
            .filter(|p| if context.denormalize { p.writable } else { p.readable })
            .map(|p| p.name.clone())
            .collect()
    }

    fn set_attribute_value(
        &self,
        object: &mut Map<String, Value>,
        attribute: &str,
        value: Value,
        _metadata: &ResourceMetadata,
        _context: &SerializerContext,
    ) -> Result<()> {
        object.insert(attribute.to_string(), value);
        Ok(())
    }
}

/// GraphQL item normalizer.
///
/// Wraps a base [`Normalizer`]. Normalized payloads omit to-many relations
/// (resolved per field later), normalize embedded to-one resources
/// recursively and carry an identity clone plus the resource class hint.
/// When denormalizing, the domain identifier travels as `_id` so that it does
/// not collide with the IRI `id` of the GraphQL input.
pub struct ItemNormalizer {
    metadata: DynMetadataFactory,
    inner: Arc<dyn Normalizer>,
}

impl ItemNormalizer {
    /// Creates a normalizer over [`ObjectNormalizer`].
    pub fn new(metadata: DynMetadataFactory) -> Self {
        Self::with_inner(metadata, Arc::new(ObjectNormalizer))
    }

    pub fn with_inner(metadata: DynMetadataFactory, inner: Arc<dyn Normalizer>) -> Self {
        Self { metadata, inner }
    }

    /// Normalizes an object of the resource named by the context.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NotFound` for unknown resource classes and
    /// propagates normalization errors.
    pub fn normalize_item(&self, object: &Value, context: &SerializerContext) -> Result<Value> {
        let metadata = self.metadata.create(&context.resource_class)?;
        self.normalize(object, &metadata, context)
    }

    /// Denormalizes input data for the resource named by the context.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NotFound` for unknown resource classes and
    /// `GraphQLError::UnexpectedValue` for non-map input.
    pub fn denormalize_item(&self, data: &Value, context: &SerializerContext) -> Result<Value> {
        let metadata = self.metadata.create(&context.resource_class)?;
        self.denormalize(data, &metadata, context)
    }

    /// Metadata of the concrete class of a related object declared as `class`.
    ///
    /// A resource class hint on the object wins over the declared class; it
    /// must name `class` or one of its implementors. Objects related through
    /// an interface must carry the hint.
    fn related_metadata(&self, related: &Value, class: &str) -> Result<Arc<ResourceMetadata>> {
        let Some(hint) = related.get(ITEM_RESOURCE_CLASS_KEY).and_then(Value::as_str) else {
            let metadata = self.metadata.create(class)?;
            if metadata.interface {
                return Err(GraphQLError::UnexpectedValue(format!(
                    "Object related as interface \"{class}\" has no resource class hint"
                )));
            }
            return Ok(metadata);
        };

        let metadata = self.metadata.create(hint)?;
        if hint != class && !metadata.implements.iter().any(|i| i == class) {
            return Err(GraphQLError::UnexpectedValue(format!(
                "Resource \"{hint}\" does not implement \"{class}\""
            )));
        }
        Ok(metadata)
    }

    fn identity_clone(object: &Value, metadata: &ResourceMetadata) -> Result<String> {
        let mut clone = Map::new();
        let identity = metadata
            .identifier_property()
            .into_iter()
            .chain(metadata.revision_property());
        for property in identity {
            if let Some(value) = object.get(&property.name) {
                clone.insert(property.name.clone(), value.clone());
            }
        }
        Ok(serde_json::to_string(&Value::Object(clone))?)
    }
}

impl Normalizer for ItemNormalizer {
    fn normalize(
        &self,
        object: &Value,
        metadata: &ResourceMetadata,
        context: &SerializerContext,
    ) -> Result<Value> {
        if metadata
            .io_class(context.operation_name.as_deref(), false)
            .is_some()
        {
            trace!(
                resource_class = %metadata.resource_class,
                "Output class override, using base normalization"
            );
            return self.inner.normalize(object, metadata, context);
        }

        let data = self.inner.normalize(object, metadata, context)?;
        let Value::Object(mut data) = data else {
            return Err(GraphQLError::UnexpectedValue(format!(
                "Expected data to be an object, got {}",
                json_kind(&data)
            )));
        };

        for property in &metadata.properties {
            if property.is_to_many() {
                data.remove(&property.name);
                continue;
            }

            let property_type = &property.property_type;
            let Some(class) = property_type.class_name.as_deref() else {
                continue;
            };
            if property_type.builtin != BuiltinType::Object || property_type.collection {
                continue;
            }
            let Some(related) = data.get(&property.name).filter(|v| v.is_object()) else {
                continue;
            };
            // Embedded value objects are kept as-is.
            if !self.metadata.is_resource_class(class) {
                continue;
            }
            let related_metadata = self.related_metadata(related, class)?;
            let related = self.normalize(
                related,
                &related_metadata,
                &context.for_resource(related_metadata.resource_class.clone()),
            )?;
            data.insert(property.name.clone(), related);
        }

        data.insert(
            ITEM_KEY.to_string(),
            Value::String(Self::identity_clone(object, metadata)?),
        );
        data.insert(
            ITEM_RESOURCE_CLASS_KEY.to_string(),
            Value::String(metadata.resource_class.clone()),
        );
        Ok(Value::Object(data))
    }

    fn allowed_attributes(
        &self,
        metadata: &ResourceMetadata,
        context: &SerializerContext,
    ) -> Vec<String> {
        let mut allowed = self.inner.allowed_attributes(metadata, context);
        if context.denormalize
            && let Some(id) = allowed.iter_mut().find(|a| a.as_str() == "id")
        {
            *id = "_id".to_string();
        }
        allowed
    }

    fn set_attribute_value(
        &self,
        object: &mut Map<String, Value>,
        attribute: &str,
        value: Value,
        metadata: &ResourceMetadata,
        context: &SerializerContext,
    ) -> Result<()> {
        let attribute = if attribute == "_id" { "id" } else { attribute };
        self.inner
            .set_attribute_value(object, attribute, value, metadata, context)
    }

    fn denormalize(
        &self,
        data: &Value,
        metadata: &ResourceMetadata,
        context: &SerializerContext,
    ) -> Result<Value> {
        let Value::Object(input) = data else {
            return Err(GraphQLError::UnexpectedValue(format!(
                "Expected input data to be an object, got {}",
                json_kind(data)
            )));
        };
        let context = SerializerContext {
            denormalize: true,
            ..context.clone()
        };

        let allowed = self.allowed_attributes(metadata, &context);
        let mut input = input.clone();
        if allowed.iter().any(|a| a == "_id")
            && !input.contains_key("_id")
            && let Some(id) = input.remove("id")
        {
            input.insert("_id".to_string(), id);
        }

        denormalize_attributes(self, &input, metadata, &context)
    }
}

/// Decodes the identity clone stored in a normalized payload.
///
/// # Errors
///
/// Returns `GraphQLError::UnexpectedValue` if the payload has no identity
/// clone or it is not valid JSON.
pub fn decode_item(payload: &Value) -> Result<Value> {
    let item = payload
        .get(ITEM_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| GraphQLError::UnexpectedValue(format!("Payload has no \"{ITEM_KEY}\" key")))?;
    Ok(serde_json::from_str(item)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::metadata::{
        GraphQlOperation, InMemoryMetadataFactory, IoMetadata, PropertyMetadata, PropertyType,
    };

    fn factory() -> DynMetadataFactory {
        let mut dummy = ResourceMetadata::new("app::Dummy", "Dummy");
        dummy.properties = vec![
            PropertyMetadata::new("id", PropertyType::builtin(BuiltinType::Int)).identifier(),
            PropertyMetadata::new("name", PropertyType::builtin(BuiltinType::String)),
            PropertyMetadata::new("version", PropertyType::builtin(BuiltinType::Int)).revision(),
            PropertyMetadata::new("related", PropertyType::object("app::RelatedDummy")),
            PropertyMetadata::new("friends", PropertyType::collection_of("app::RelatedDummy")),
        ];
        dummy.graphql.insert(
            "custom_output".into(),
            GraphQlOperation {
                output: Some(IoMetadata {
                    class: Some("app::dto::DummyOutput".into()),
                }),
                ..GraphQlOperation::default()
            },
        );

        let mut related = ResourceMetadata::new("app::RelatedDummy", "RelatedDummy");
        related.properties = vec![
            PropertyMetadata::new("id", PropertyType::builtin(BuiltinType::Int)).identifier(),
            PropertyMetadata::new("title", PropertyType::builtin(BuiltinType::String)),
        ];

        Arc::new(InMemoryMetadataFactory::from_resources([dummy, related]))
    }

    fn entity() -> Value {
        json!({
            "id": 1,
            "name": "Foo",
            "version": 3,
            "related": {"id": 7, "title": "Bar"},
            "friends": [{"id": 8, "title": "Baz"}],
        })
    }

    #[test]
    fn test_normalize_omits_to_many_and_adds_identity() {
        let normalizer = ItemNormalizer::new(factory());
        let payload = normalizer
            .normalize_item(&entity(), &SerializerContext::new("app::Dummy"))
            .unwrap();

        assert!(payload.get("friends").is_none());
        assert_eq!(payload["name"], "Foo");
        assert_eq!(payload[ITEM_RESOURCE_CLASS_KEY], "app::Dummy");
        assert_eq!(decode_item(&payload).unwrap(), json!({"id": 1, "version": 3}));
    }

    #[test]
    fn test_normalize_embedded_to_one() {
        let normalizer = ItemNormalizer::new(factory());
        let payload = normalizer
            .normalize_item(&entity(), &SerializerContext::new("app::Dummy"))
            .unwrap();

        let related = &payload["related"];
        assert_eq!(related["title"], "Bar");
        assert_eq!(related[ITEM_RESOURCE_CLASS_KEY], "app::RelatedDummy");
        assert_eq!(decode_item(related).unwrap(), json!({"id": 7}));
    }

    #[test]
    fn test_output_override_uses_base_normalization() {
        let normalizer = ItemNormalizer::new(factory());
        let context = SerializerContext::new("app::Dummy").operation("custom_output");
        let payload = normalizer.normalize_item(&entity(), &context).unwrap();

        assert!(payload.get(ITEM_KEY).is_none());
        assert!(payload.get("friends").is_some());
    }

    #[test]
    fn test_undeclared_properties_pass_through_without_hints() {
        let metadata = ResourceMetadata::new("app::Blob", "Blob");
        let object = json!({"a": 1, ITEM_RESOURCE_CLASS_KEY: "app::Blob"});

        let payload = ObjectNormalizer
            .normalize(&object, &metadata, &SerializerContext::new("app::Blob"))
            .unwrap();
        assert_eq!(payload, json!({"a": 1}));
    }

    #[test]
    fn test_non_object_is_unexpected_value() {
        let normalizer = ItemNormalizer::new(factory());
        let err = normalizer
            .normalize_item(&json!("scalar"), &SerializerContext::new("app::Dummy"))
            .unwrap_err();
        assert!(matches!(err, GraphQLError::UnexpectedValue(_)));
    }

    #[test]
    fn test_allowed_attributes_use_internal_id_alias() {
        let normalizer = ItemNormalizer::new(factory());
        let metadata = factory().create("app::Dummy").unwrap();

        let read = normalizer.allowed_attributes(&metadata, &SerializerContext::new("app::Dummy"));
        assert!(read.contains(&"id".to_string()));

        let write = normalizer.allowed_attributes(
            &metadata,
            &SerializerContext::new("app::Dummy").denormalizing(),
        );
        assert!(write.contains(&"_id".to_string()));
        assert!(!write.contains(&"id".to_string()));
    }

    #[test]
    fn test_denormalize_routes_id_through_alias() {
        let normalizer = ItemNormalizer::new(factory());
        let object = normalizer
            .denormalize_item(
                &json!({"id": 5, "name": "Foo", "unknown": true}),
                &SerializerContext::new("app::Dummy"),
            )
            .unwrap();

        assert_eq!(object, json!({"id": 5, "name": "Foo"}));
    }

    #[test]
    fn test_denormalize_internal_id() {
        let normalizer = ItemNormalizer::new(factory());
        let object = normalizer
            .denormalize_item(
                &json!({"_id": 5, "name": "Foo"}),
                &SerializerContext::new("app::Dummy"),
            )
            .unwrap();

        assert_eq!(object, json!({"id": 5, "name": "Foo"}));
    }

    #[test]
    fn test_decode_item_without_key() {
        assert!(matches!(
            decode_item(&json!({"id": 1})),
            Err(GraphQLError::UnexpectedValue(_))
        ));
    }

    fn kennel_factory() -> DynMetadataFactory {
        let id = || PropertyMetadata::new("id", PropertyType::builtin(BuiltinType::Int)).identifier();
        let name = || PropertyMetadata::new("name", PropertyType::builtin(BuiltinType::String));

        let mut animal = ResourceMetadata::new("app::Animal", "Animal");
        animal.interface = true;
        animal.properties = vec![id(), name()];

        let mut dog = ResourceMetadata::new("app::Dog", "Dog");
        dog.implements = vec!["app::Animal".into()];
        dog.properties = vec![id(), name()];

        let mut cat = ResourceMetadata::new("app::Cat", "Cat");
        cat.properties = vec![id(), name()];

        let mut kennel = ResourceMetadata::new("app::Kennel", "Kennel");
        kennel.properties = vec![
            id(),
            PropertyMetadata::new("pet", PropertyType::object("app::Animal")),
            PropertyMetadata::new("address", PropertyType::object("app::vo::Address")),
        ];

        Arc::new(InMemoryMetadataFactory::from_resources([animal, dog, cat, kennel]))
    }

    fn normalize_kennel(pet: Value) -> Result<Value> {
        ItemNormalizer::new(kennel_factory()).normalize_item(
            &json!({"id": 1, "pet": pet, "address": {"street": "Main"}}),
            &SerializerContext::new("app::Kennel"),
        )
    }

    #[test]
    fn test_interface_relation_keeps_concrete_class() {
        let payload = normalize_kennel(json!({
            "id": 4,
            "name": "Rex",
            ITEM_RESOURCE_CLASS_KEY: "app::Dog",
        }))
        .unwrap();

        assert_eq!(payload["pet"][ITEM_RESOURCE_CLASS_KEY], "app::Dog");
        assert_eq!(payload["pet"]["name"], "Rex");
        assert_eq!(decode_item(&payload["pet"]).unwrap(), json!({"id": 4}));
        // Embedded value objects are not resources.
        assert_eq!(payload["address"], json!({"street": "Main"}));
    }

    #[test]
    fn test_interface_relation_without_hint() {
        let err = normalize_kennel(json!({"id": 4, "name": "Rex"})).unwrap_err();
        assert!(matches!(err, GraphQLError::UnexpectedValue(_)));
    }

    #[test]
    fn test_relation_hint_must_implement_declared_class() {
        let err = normalize_kennel(json!({"id": 4, ITEM_RESOURCE_CLASS_KEY: "app::Cat"})).unwrap_err();
        assert!(matches!(err, GraphQLError::UnexpectedValue(_)));

        let err =
            normalize_kennel(json!({"id": 4, ITEM_RESOURCE_CLASS_KEY: "app::Unknown"})).unwrap_err();
        assert!(matches!(err, GraphQLError::NotFound(_)));
    }
}
