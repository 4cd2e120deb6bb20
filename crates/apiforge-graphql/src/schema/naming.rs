//! Generated type names.
//!
//! A type name is a pure function of the resource metadata and the
//! [`TypeRequest`]; identical inputs always yield the identical name, which is
//! what makes the type registry safe to use as a cache.

use crate::metadata::{COLLECTION_QUERY, ITEM_QUERY, ResourceMetadata, ucfirst};

/// The operation context a resource type is requested for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeRequest {
    pub query_name: Option<String>,
    pub mutation_name: Option<String>,
    pub subscription_name: Option<String>,
    /// Whether an input type is requested.
    pub input: bool,
    /// Whether the type is the inner data of a mutation/subscription payload.
    pub wrapped: bool,
    /// Nesting depth below the root operation type.
    pub depth: usize,
}

impl TypeRequest {
    pub fn query(name: impl Into<String>) -> Self {
        Self {
            query_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn mutation(name: impl Into<String>) -> Self {
        Self {
            mutation_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn subscription(name: impl Into<String>) -> Self {
        Self {
            subscription_name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn input(mut self) -> Self {
        self.input = true;
        self
    }

    #[must_use]
    pub fn wrapped(mut self) -> Self {
        self.wrapped = true;
        self
    }

    #[must_use]
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// The request for a type nested one level below this one.
    #[must_use]
    pub fn nested(&self) -> Self {
        Self {
            wrapped: false,
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    /// Subscription, mutation or query name, in that order of precedence.
    #[must_use]
    pub fn operation_name(&self) -> Option<&str> {
        self.subscription_name
            .as_deref()
            .or(self.mutation_name.as_deref())
            .or(self.query_name.as_deref())
    }

    #[must_use]
    pub fn is_mutation_or_subscription(&self) -> bool {
        self.mutation_name.is_some() || self.subscription_name.is_some()
    }
}

/// Builds the registry name of a resource type.
///
/// Order: short name, operation prefix, then `Input` or (`Nested`)`Payload`,
/// `Interface`, `Item`/`Collection` and `Data`.
#[must_use]
pub fn generated_type_name(metadata: &ResourceMetadata, request: &TypeRequest) -> String {
    let mut name = metadata.short_name.clone();

    if let Some(mutation) = &request.mutation_name {
        name = format!("{mutation}{}", ucfirst(&name));
    }
    if let Some(subscription) = &request.subscription_name {
        name = format!("{subscription}{}Subscription", ucfirst(&name));
    }

    if request.input {
        name.push_str("Input");
    } else if request.is_mutation_or_subscription() {
        if request.depth > 0 {
            name.push_str("Nested");
        }
        name.push_str("Payload");
    }

    if metadata.interface {
        name.push_str("Interface");
    }

    // Item and collection queries only get distinct types when they normalize differently.
    if let Some(query @ (ITEM_QUERY | COLLECTION_QUERY)) = request.query_name.as_deref()
        && metadata.normalization_context(Some(ITEM_QUERY))
            != metadata.normalization_context(Some(COLLECTION_QUERY))
    {
        name.push_str(if query == ITEM_QUERY { "Item" } else { "Collection" });
    }

    if request.wrapped && request.is_mutation_or_subscription() {
        name.push_str("Data");
    }

    name
}
