//! Type registry.
//!
//! Maps generated type names to constructed [`TypeHandle`]s so each named type
//! is built once per schema-build session. The registry is an explicit handle
//! passed to whoever builds types; cloning it shares the same storage.
//!
//! Population is expected to happen during a single-writer build phase.
//! Concurrent reads afterwards are safe. There is no invalidation: when
//! resource metadata changes, build a fresh registry.

use std::sync::Arc;

use dashmap::DashMap;

use super::TypeHandle;
use crate::Result;
use crate::error::GraphQLError;

/// Registry of constructed schema types, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Arc<DashMap<String, TypeHandle>>,
}

impl TypeRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns the type registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NotFound` if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<TypeHandle> {
        self.types
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| GraphQLError::NotFound(format!("Type \"{name}\" is not registered")))
    }

    /// Returns the type registered under `name`, if any.
    pub fn find(&self, name: &str) -> Option<TypeHandle> {
        self.types.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Registers `handle` under `name`.
    ///
    /// Does not guard against overwrites: callers check [`has`](Self::has) first.
    pub fn set(&self, name: impl Into<String>, handle: TypeHandle) {
        self.types.insert(name.into(), handle);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Snapshot of every registered entry, sorted by name.
    pub fn entries(&self) -> Vec<(String, TypeHandle)> {
        let mut entries: Vec<(String, TypeHandle)> = self
            .types
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
