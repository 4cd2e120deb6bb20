//! Resource metadata lookup.
//!
//! The metadata-loading subsystem populates resource metadata ahead of time;
//! the GraphQL core only reads it through [`ResourceMetadataFactory`].

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use super::ResourceMetadata;
use crate::Result;
use crate::error::GraphQLError;

/// Read-only provider of resource metadata.
pub trait ResourceMetadataFactory: Send + Sync {
    /// Returns the metadata of a resource class.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NotFound` if the class is not a resource.
    fn create(&self, resource_class: &str) -> Result<Arc<ResourceMetadata>>;

    /// Lists all resource classes, in registration order.
    fn resource_classes(&self) -> Vec<String>;

    /// Whether `class` is described by resource metadata.
    ///
    /// Classes that are not resources are embedded value objects.
    fn is_resource_class(&self, class: &str) -> bool {
        self.resource_classes().iter().any(|c| c == class)
    }
}

/// Dynamic metadata factory type alias.
pub type DynMetadataFactory = Arc<dyn ResourceMetadataFactory>;

/// Metadata factory holding every resource in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMetadataFactory {
    resources: IndexMap<String, Arc<ResourceMetadata>>,
}

#[derive(Deserialize)]
struct MetadataDocument {
    #[serde(default)]
    resources: Vec<ResourceMetadata>,
}

impl InMemoryMetadataFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a factory from a list of resources.
    pub fn from_resources(resources: impl IntoIterator<Item = ResourceMetadata>) -> Self {
        let mut factory = Self::new();
        for resource in resources {
            factory.register(resource);
        }
        factory
    }

    /// Loads resources from a TOML document with `[[resources]]` tables.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::InvalidMetadata` if the document cannot be parsed
    /// or a resource is missing its class or short name.
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let document: MetadataDocument = toml::from_str(document)?;
        Self::from_document(document)
    }

    /// Loads resources from a JSON document shaped like the TOML one.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::InvalidMetadata` if the document cannot be parsed.
    pub fn from_json_str(document: &str) -> Result<Self> {
        let document: MetadataDocument = serde_json::from_str(document)
            .map_err(|e| GraphQLError::InvalidMetadata(e.to_string()))?;
        Self::from_document(document)
    }

    fn from_document(document: MetadataDocument) -> Result<Self> {
        for resource in &document.resources {
            if resource.resource_class.is_empty() || resource.short_name.is_empty() {
                return Err(GraphQLError::InvalidMetadata(
                    "every resource needs a class and a short_name".into(),
                ));
            }
        }
        debug!(count = document.resources.len(), "Loaded resource metadata");
        Ok(Self::from_resources(document.resources))
    }

    /// Registers (or replaces) a resource.
    pub fn register(&mut self, resource: ResourceMetadata) {
        self.resources
            .insert(resource.resource_class.clone(), Arc::new(resource));
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceMetadataFactory for InMemoryMetadataFactory {
    fn create(&self, resource_class: &str) -> Result<Arc<ResourceMetadata>> {
        self.resources.get(resource_class).cloned().ok_or_else(|| {
            GraphQLError::NotFound(format!("Resource \"{resource_class}\" is not registered"))
        })
    }

    fn resource_classes(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    fn is_resource_class(&self, class: &str) -> bool {
        self.resources.contains_key(class)
    }
}
