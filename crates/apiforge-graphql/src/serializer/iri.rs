//! Resource IRIs.
//!
//! The GraphQL `id` of a resource is its IRI, `{prefix}/{route}/{identifier}`.
//! The domain identifier itself is exposed separately as `_id`.

use std::sync::Arc;

use serde_json::Value;

use super::{ITEM_RESOURCE_CLASS_KEY, decode_item};
use crate::Result;
use crate::error::GraphQLError;
use crate::metadata::{DynMetadataFactory, ResourceMetadata};

/// Builds and parses resource IRIs.
#[derive(Clone)]
pub struct IriConverter {
    metadata: DynMetadataFactory,
    prefix: String,
}

impl IriConverter {
    /// Creates a converter. A trailing `/` on `prefix` is ignored.
    pub fn new(metadata: DynMetadataFactory, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        Self { metadata, prefix }
    }

    /// IRI of the resource `resource_class` identified by `identifier`.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NotFound` for unknown classes and
    /// `GraphQLError::UnexpectedValue` for identifiers that are not strings or numbers.
    pub fn iri(&self, resource_class: &str, identifier: &Value) -> Result<String> {
        let metadata = self.metadata.create(resource_class)?;
        Ok(format!(
            "{}/{}/{}",
            self.prefix,
            metadata.route(),
            identifier_segment(identifier)?
        ))
    }

    /// IRI of a normalized payload, computed from its identity clone.
    ///
    /// Returns `None` for payloads without a resource class hint (output-class
    /// overrides, plain data).
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::UnexpectedValue` if a hinted payload has no
    /// decodable identity clone or the clone lacks the identifier, and
    /// `GraphQLError::NotFound` for an unknown hinted class.
    pub fn iri_from_payload(&self, payload: &Value) -> Result<Option<String>> {
        let Some(class) = payload.get(ITEM_RESOURCE_CLASS_KEY).and_then(Value::as_str) else {
            return Ok(None);
        };
        let item = decode_item(payload)?;
        let metadata = self.metadata.create(class)?;
        let identifier = identifier_of(&item, &metadata)?;
        self.iri(class, identifier).map(Some)
    }

    /// Splits an IRI into its resource metadata and identifier.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NotFound` if no resource is routed under the IRI.
    pub fn parse(&self, iri: &str) -> Result<(Arc<ResourceMetadata>, String)> {
        let not_found = || GraphQLError::NotFound(format!("No resource matches the IRI \"{iri}\""));

        let path = iri.strip_prefix(&self.prefix).ok_or_else(not_found)?;
        let (route, identifier) = path
            .trim_start_matches('/')
            .rsplit_once('/')
            .ok_or_else(not_found)?;
        if identifier.is_empty() {
            return Err(not_found());
        }

        for class in self.metadata.resource_classes() {
            let metadata = self.metadata.create(&class)?;
            if metadata.route() == route {
                return Ok((metadata, identifier.to_string()));
            }
        }
        Err(not_found())
    }
}

impl std::fmt::Debug for IriConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IriConverter")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

fn identifier_of<'a>(item: &'a Value, metadata: &ResourceMetadata) -> Result<&'a Value> {
    let name = metadata
        .identifier_property()
        .map_or("id", |property| property.name.as_str());
    item.get(name).ok_or_else(|| {
        GraphQLError::UnexpectedValue(format!(
            "Item of \"{}\" has no \"{name}\" identifier",
            metadata.short_name
        ))
    })
}

fn identifier_segment(identifier: &Value) -> Result<String> {
    match identifier {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(GraphQLError::UnexpectedValue(format!(
            "Identifier must be a string or a number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::metadata::InMemoryMetadataFactory;
    use crate::serializer::ITEM_KEY;

    fn converter(prefix: &str) -> IriConverter {
        let mut dummy = ResourceMetadata::new("app::Dummy", "Dummy");
        dummy.route = Some("dummies".into());
        let related = ResourceMetadata::new("app::RelatedDummy", "RelatedDummy");
        let factory = Arc::new(InMemoryMetadataFactory::from_resources([dummy, related]));
        IriConverter::new(factory, prefix)
    }

    #[test]
    fn test_iri() {
        let iri = converter("/api/");
        assert_eq!(iri.iri("app::Dummy", &json!(1)).unwrap(), "/api/dummies/1");
        assert_eq!(
            iri.iri("app::RelatedDummy", &json!("abc")).unwrap(),
            "/api/relateddummy/abc"
        );
        assert!(iri.iri("app::Dummy", &json!(null)).is_err());
    }

    #[test]
    fn test_parse() {
        let iri = converter("");
        let (metadata, id) = iri.parse("/dummies/42").unwrap();
        assert_eq!(metadata.short_name, "Dummy");
        assert_eq!(id, "42");

        assert!(matches!(iri.parse("/unknown/1"), Err(GraphQLError::NotFound(_))));
        assert!(matches!(iri.parse("/dummies/"), Err(GraphQLError::NotFound(_))));
    }

    #[test]
    fn test_iri_from_payload() {
        let iri = converter("/api");
        let payload = json!({
            ITEM_KEY: "{\"id\":3}",
            ITEM_RESOURCE_CLASS_KEY: "app::Dummy",
        });
        assert_eq!(
            iri.iri_from_payload(&payload).unwrap().as_deref(),
            Some("/api/dummies/3")
        );
        assert_eq!(iri.iri_from_payload(&json!({"id": 3})).unwrap(), None);
    }

    #[test]
    fn test_iri_from_broken_payload() {
        let iri = converter("/api");

        let missing_clone = json!({"id": 3, ITEM_RESOURCE_CLASS_KEY: "app::Dummy"});
        assert!(matches!(
            iri.iri_from_payload(&missing_clone),
            Err(GraphQLError::UnexpectedValue(_))
        ));

        let malformed = json!({ITEM_KEY: "{not json", ITEM_RESOURCE_CLASS_KEY: "app::Dummy"});
        assert!(matches!(
            iri.iri_from_payload(&malformed),
            Err(GraphQLError::UnexpectedValue(_))
        ));

        let unknown = json!({ITEM_KEY: "{\"id\":3}", ITEM_RESOURCE_CLASS_KEY: "app::Unknown"});
        assert!(matches!(iri.iri_from_payload(&unknown), Err(GraphQLError::NotFound(_))));
    }
}
