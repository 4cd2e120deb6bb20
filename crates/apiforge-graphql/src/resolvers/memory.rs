//! In-memory resource resolver.
//!
//! Keeps items per resource class in insertion order. Relations are stored as
//! identifiers of the related items and hydrated on read. Used by tests and
//! for prototyping a schema before a persistence layer exists.

use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::{CollectionPage, CollectionRequest, MutationRequest, ResourceResolver};
use crate::Result;
use crate::error::GraphQLError;
use crate::metadata::{DynMetadataFactory, ResourceMetadata};
use crate::serializer::ITEM_RESOURCE_CLASS_KEY;

type Store = IndexMap<String, IndexMap<String, Value>>;

/// Resource resolver backed by in-process maps.
pub struct InMemoryResourceResolver {
    metadata: DynMetadataFactory,
    store: RwLock<Store>,
    /// Next generated identifier per resource class.
    sequences: DashMap<String, u64>,
}

impl InMemoryResourceResolver {
    pub fn new(metadata: DynMetadataFactory) -> Self {
        Self {
            metadata,
            store: RwLock::new(IndexMap::new()),
            sequences: DashMap::new(),
        }
    }

    /// Stores an item and returns its identifier.
    ///
    /// Items without an identifier get the next numeric one of their class;
    /// explicit numeric identifiers move that sequence past them.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NotFound` for unknown classes and
    /// `GraphQLError::UnexpectedValue` if `item` is not an object.
    pub async fn insert(&self, resource_class: &str, item: Value) -> Result<String> {
        let metadata = self.metadata.create(resource_class)?;
        let mut store = self.store.write().await;
        let (key, _) = self.store_item(&mut store, &metadata, item)?;
        Ok(key)
    }

    fn store_item(
        &self,
        store: &mut Store,
        metadata: &ResourceMetadata,
        item: Value,
    ) -> Result<(String, Value)> {
        let Value::Object(mut item) = item else {
            return Err(GraphQLError::UnexpectedValue(format!(
                "Items of \"{}\" must be objects",
                metadata.short_name
            )));
        };

        let identifier = identifier_name(metadata);
        let mut next_id = self
            .sequences
            .entry(metadata.resource_class.clone())
            .or_insert(1);
        let key = match item.get(identifier).and_then(key_of) {
            Some(key) => {
                if let Some(n) = item.get(identifier).and_then(Value::as_u64) {
                    *next_id = (*next_id).max(n + 1);
                }
                key
            }
            None => {
                let id = *next_id;
                *next_id += 1;
                item.insert(identifier.to_string(), Value::from(id));
                id.to_string()
            }
        };
        drop(next_id);

        trace!(resource_class = %metadata.resource_class, id = %key, "Storing item");

        let item = Value::Object(item);
        store
            .entry(metadata.resource_class.clone())
            .or_default()
            .insert(key.clone(), item.clone());
        Ok((key, item))
    }

    /// Replaces to-one relation identifiers with the related items.
    fn hydrate(&self, store: &Store, metadata: &ResourceMetadata, item: &Value) -> Result<Value> {
        let mut item = item.clone();
        let Value::Object(fields) = &mut item else {
            return Ok(item);
        };
        for property in &metadata.properties {
            let property_type = &property.property_type;
            let Some(class) = property_type.class_name.as_deref() else {
                continue;
            };
            if property_type.collection {
                continue;
            }
            let Some(value) = fields.get_mut(&property.name) else {
                continue;
            };
            if let Some(key) = key_of(value) {
                *value = self.related_item(store, class, &key)?.unwrap_or(Value::Null);
            }
        }
        Ok(item)
    }

    /// Finds a related item by key, either under `declared_class` itself or
    /// under one of its implementors when it is an interface.
    fn find_related<'a>(
        &self,
        store: &'a Store,
        declared_class: &str,
        key: &str,
    ) -> Result<Option<(&'a str, &'a Value)>> {
        if let Some((class, items)) = store.get_key_value(declared_class)
            && let Some(item) = items.get(key)
        {
            return Ok(Some((class.as_str(), item)));
        }
        for (class, items) in store {
            let metadata = self.metadata.create(class)?;
            if !metadata.implements.iter().any(|i| i == declared_class) {
                continue;
            }
            if let Some(item) = items.get(key) {
                return Ok(Some((class.as_str(), item)));
            }
        }
        Ok(None)
    }

    /// Related item hinted with its concrete class.
    fn related_item(
        &self,
        store: &Store,
        declared_class: &str,
        key: &str,
    ) -> Result<Option<Value>> {
        Ok(self
            .find_related(store, declared_class, key)?
            .map(|(class, item)| with_class_hint(item.clone(), class)))
    }

    fn interface_items(&self, store: &Store, interface_class: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        for (class, class_items) in store {
            let metadata = self.metadata.create(class)?;
            let own = class == interface_class;
            if !own && !metadata.implements.iter().any(|i| i == interface_class) {
                continue;
            }
            for item in class_items.values() {
                let item = self.hydrate(store, &metadata, item)?;
                items.push(with_class_hint(item, class));
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl ResourceResolver for InMemoryResourceResolver {
    async fn item(&self, resource_class: &str, id: &str) -> Result<Option<Value>> {
        let metadata = self.metadata.create(resource_class)?;
        let store = self.store.read().await;
        lookup(&store, resource_class, id)
            .map(|item| self.hydrate(&store, &metadata, item))
            .transpose()
    }

    async fn collection(&self, request: &CollectionRequest) -> Result<CollectionPage> {
        let metadata = self.metadata.create(&request.resource_class)?;
        let store = self.store.read().await;

        let items: Vec<Value> = match &request.parent {
            Some(parent) => {
                let related = key_of(&parent.identifier)
                    .and_then(|key| lookup(&store, &parent.resource_class, &key))
                    .and_then(|owner| owner.get(&parent.property))
                    .and_then(Value::as_array);
                let mut items = Vec::new();
                for entry in related.into_iter().flatten() {
                    if entry.is_object() {
                        items.push(self.hydrate(&store, &metadata, entry)?);
                        continue;
                    }
                    let Some(key) = key_of(entry) else {
                        continue;
                    };
                    let Some((class, item)) =
                        self.find_related(&store, &request.resource_class, &key)?
                    else {
                        continue;
                    };
                    let concrete = self.metadata.create(class)?;
                    let item = self.hydrate(&store, &concrete, item)?;
                    items.push(with_class_hint(item, class));
                }
                items
            }
            None if metadata.interface => self.interface_items(&store, &request.resource_class)?,
            None => store
                .get(&request.resource_class)
                .map(|items| {
                    items
                        .values()
                        .map(|item| self.hydrate(&store, &metadata, item))
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default(),
        };

        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(usize::try_from(request.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(request.limit).unwrap_or(usize::MAX))
            .collect();

        Ok(CollectionPage { items, total })
    }

    async fn mutate(&self, request: &MutationRequest) -> Result<Option<Value>> {
        let metadata = self.metadata.create(&request.resource_class)?;
        let mut store = self.store.write().await;

        debug!(
            resource_class = %request.resource_class,
            operation = %request.operation,
            id = ?request.id,
            "Applying in-memory mutation"
        );

        match request.operation.as_str() {
            "create" => {
                let (_, item) = self.store_item(&mut store, &metadata, request.data.clone())?;
                self.hydrate(&store, &metadata, &item).map(Some)
            }
            "update" => {
                let id = required_id(request)?;
                let Some(Value::Object(existing)) = store
                    .get_mut(&request.resource_class)
                    .and_then(|items| items.get_mut(id))
                else {
                    return Ok(None);
                };
                if let Value::Object(data) = &request.data {
                    let identifier = identifier_name(&metadata);
                    for (name, value) in data {
                        if name != identifier {
                            existing.insert(name.clone(), value.clone());
                        }
                    }
                }
                let item = Value::Object(existing.clone());
                self.hydrate(&store, &metadata, &item).map(Some)
            }
            "delete" => {
                let id = required_id(request)?;
                let removed = store
                    .get_mut(&request.resource_class)
                    .and_then(|items| items.shift_remove(id));
                removed
                    .map(|item| self.hydrate(&store, &metadata, &item))
                    .transpose()
            }
            other => Err(GraphQLError::Resolver(format!(
                "Mutation \"{other}\" is not supported on \"{}\"",
                metadata.short_name
            ))),
        }
    }
}

impl std::fmt::Debug for InMemoryResourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryResourceResolver").finish_non_exhaustive()
    }
}

fn required_id(request: &MutationRequest) -> Result<&str> {
    request.id.as_deref().ok_or_else(|| {
        GraphQLError::Resolver(format!(
            "Mutation \"{}\" requires the id of an existing item",
            request.operation
        ))
    })
}

fn identifier_name(metadata: &ResourceMetadata) -> &str {
    metadata
        .identifier_property()
        .map_or("id", |property| property.name.as_str())
}

fn lookup<'a>(store: &'a Store, resource_class: &str, key: &str) -> Option<&'a Value> {
    store.get(resource_class).and_then(|items| items.get(key))
}

fn with_class_hint(mut item: Value, class: &str) -> Value {
    if let Value::Object(fields) = &mut item {
        fields.insert(ITEM_RESOURCE_CLASS_KEY.to_string(), Value::String(class.to_string()));
    }
    item
}

/// Store key of an identifier value.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
