//! Resource metadata model.
//!
//! Statically-typed description of a domain entity exposed through the
//! generated API. Instances are immutable once loaded and shared as
//! `Arc<ResourceMetadata>`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::PaginationType;

/// Name of the built-in item query operation.
pub const ITEM_QUERY: &str = "item_query";
/// Name of the built-in collection query operation.
pub const COLLECTION_QUERY: &str = "collection_query";

/// Metadata describing one resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Fully qualified resource class (e.g. `app::entity::Dummy`).
    #[serde(rename = "class")]
    pub resource_class: String,

    /// Short name used as the base of every generated type name.
    pub short_name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Whether the resource is exposed as a GraphQL interface.
    #[serde(default)]
    pub interface: bool,

    /// Classes of the interface resources this resource implements.
    #[serde(default)]
    pub implements: Vec<String>,

    /// Whether updates are pushed through a Mercure hub.
    #[serde(default)]
    pub mercure: bool,

    /// Path segment used when building IRIs. Defaults to the lower-cased short name.
    #[serde(default)]
    pub route: Option<String>,

    /// Resource-level normalization context, used when an operation sets none.
    #[serde(default)]
    pub normalization_context: Option<Map<String, Value>>,

    /// Resource-level pagination style.
    #[serde(default)]
    pub pagination_type: Option<PaginationType>,

    #[serde(default)]
    pub input: Option<IoMetadata>,

    #[serde(default)]
    pub output: Option<IoMetadata>,

    /// GraphQL operations keyed by operation name.
    #[serde(default)]
    pub graphql: IndexMap<String, GraphQlOperation>,

    #[serde(default)]
    pub properties: Vec<PropertyMetadata>,
}

/// Kind of GraphQL operation an entry in [`ResourceMetadata::graphql`] declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ItemQuery,
    CollectionQuery,
    Mutation,
    Subscription,
}

/// Per-operation GraphQL attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphQlOperation {
    /// Explicit operation kind. Inferred from the operation name when absent.
    #[serde(default)]
    pub kind: Option<OperationKind>,

    #[serde(default)]
    pub normalization_context: Option<Map<String, Value>>,

    /// Input class override.
    #[serde(default)]
    pub input: Option<IoMetadata>,

    /// Output class override.
    #[serde(default)]
    pub output: Option<IoMetadata>,

    /// Explicit mutation arguments, replacing the derived input fields.
    #[serde(default)]
    pub args: Option<IndexMap<String, ArgumentMetadata>>,

    #[serde(default)]
    pub pagination_type: Option<PaginationType>,
}

/// Input/output class override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoMetadata {
    #[serde(default)]
    pub class: Option<String>,
}

/// Raw mutation argument declared in metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentMetadata {
    /// GraphQL type expression (`ID!`, `[String]`, `DummyInput`, ...).
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Metadata of one resource property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub name: String,

    #[serde(rename = "type")]
    pub property_type: PropertyType,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub readable: bool,

    #[serde(default = "default_true")]
    pub writable: bool,

    #[serde(default)]
    pub required: bool,

    /// Whether the property is the resource identifier.
    #[serde(default)]
    pub identifier: bool,

    /// Whether the property holds the optimistic-locking revision.
    #[serde(default)]
    pub revision: bool,
}

fn default_true() -> bool {
    true
}

/// Primitive kind of a property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinType {
    Int,
    Float,
    String,
    Bool,
    Array,
    Object,
    Iterable,
}

/// Type of a resource property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    pub builtin: BuiltinType,

    /// Class name for object types.
    #[serde(default)]
    pub class_name: Option<String>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub collection: bool,

    /// Element type for collections.
    #[serde(default)]
    pub collection_value_type: Option<Box<PropertyType>>,
}

impl PropertyType {
    /// Creates a non-collection builtin type.
    #[must_use]
    pub fn builtin(builtin: BuiltinType) -> Self {
        Self {
            builtin,
            class_name: None,
            nullable: false,
            collection: false,
            collection_value_type: None,
        }
    }

    /// Creates a to-one reference to `class`.
    #[must_use]
    pub fn object(class: impl Into<String>) -> Self {
        Self {
            builtin: BuiltinType::Object,
            class_name: Some(class.into()),
            nullable: true,
            collection: false,
            collection_value_type: None,
        }
    }

    /// Creates a to-many collection of `class`.
    #[must_use]
    pub fn collection_of(class: impl Into<String>) -> Self {
        Self {
            builtin: BuiltinType::Object,
            class_name: None,
            nullable: false,
            collection: true,
            collection_value_type: Some(Box::new(Self::object(class))),
        }
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Class name of the collection elements, if any.
    #[must_use]
    pub fn collection_value_class(&self) -> Option<&str> {
        self.collection_value_type
            .as_deref()
            .and_then(|t| t.class_name.as_deref())
    }
}

impl PropertyMetadata {
    #[must_use]
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            description: None,
            readable: true,
            writable: true,
            required: false,
            identifier: false,
            revision: false,
        }
    }

    #[must_use]
    pub fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    #[must_use]
    pub fn revision(mut self) -> Self {
        self.revision = true;
        self
    }

    /// Whether the property is a collection of related objects.
    #[must_use]
    pub fn is_to_many(&self) -> bool {
        self.property_type.collection && self.property_type.collection_value_class().is_some()
    }
}

impl ResourceMetadata {
    /// Creates metadata with the given class and short name.
    #[must_use]
    pub fn new(resource_class: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            resource_class: resource_class.into(),
            short_name: short_name.into(),
            ..Self::default()
        }
    }

    /// Returns the operation attributes for `name`, if declared.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&GraphQlOperation> {
        self.graphql.get(name)
    }

    /// Returns the kind of the operation, inferring it from the name when not explicit.
    #[must_use]
    pub fn operation_kind(&self, name: &str) -> Option<OperationKind> {
        let operation = self.operation(name)?;
        Some(operation.kind.unwrap_or(match name {
            ITEM_QUERY => OperationKind::ItemQuery,
            COLLECTION_QUERY => OperationKind::CollectionQuery,
            _ => OperationKind::Mutation,
        }))
    }

    /// Names of the declared operations of the given kind, in declaration order.
    pub fn operations_of_kind(&self, kind: OperationKind) -> impl Iterator<Item = &str> {
        self.graphql
            .keys()
            .map(String::as_str)
            .filter(move |name| self.operation_kind(name) == Some(kind))
    }

    /// Names of the subscriptions exposed for this resource.
    ///
    /// Mercure-enabled resources expose an `update` subscription implicitly.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations_of_kind(OperationKind::Subscription).collect();
        if self.mercure && !names.contains(&"update") {
            names.push("update");
        }
        names
    }

    /// Normalization context of an operation, falling back to the resource-level one.
    ///
    /// An absent context is the empty map.
    #[must_use]
    pub fn normalization_context(&self, operation: Option<&str>) -> Map<String, Value> {
        operation
            .and_then(|name| self.operation(name))
            .and_then(|op| op.normalization_context.as_ref())
            .or(self.normalization_context.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    /// Input (or output) class override of an operation, falling back to the resource level.
    #[must_use]
    pub fn io_class(&self, operation: Option<&str>, input: bool) -> Option<&str> {
        let op = operation.and_then(|name| self.operation(name));
        let (op_io, resource_io) = if input {
            (op.and_then(|o| o.input.as_ref()), self.input.as_ref())
        } else {
            (op.and_then(|o| o.output.as_ref()), self.output.as_ref())
        };
        op_io.or(resource_io).and_then(|io| io.class.as_deref())
    }

    /// Pagination style of an operation, falling back to the resource level.
    #[must_use]
    pub fn pagination_type(&self, operation: Option<&str>) -> Option<PaginationType> {
        operation
            .and_then(|name| self.operation(name))
            .and_then(|op| op.pagination_type)
            .or(self.pagination_type)
    }

    /// Explicit arguments declared for a mutation.
    #[must_use]
    pub fn mutation_args(&self, mutation: &str) -> Option<&IndexMap<String, ArgumentMetadata>> {
        self.operation(mutation).and_then(|op| op.args.as_ref())
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The identifier property. Falls back to a property literally named `id`.
    #[must_use]
    pub fn identifier_property(&self) -> Option<&PropertyMetadata> {
        self.properties
            .iter()
            .find(|p| p.identifier)
            .or_else(|| self.property("id"))
    }

    #[must_use]
    pub fn revision_property(&self) -> Option<&PropertyMetadata> {
        self.properties.iter().find(|p| p.revision)
    }

    /// Path segment used in IRIs.
    #[must_use]
    pub fn route(&self) -> String {
        self.route
            .clone()
            .unwrap_or_else(|| self.short_name.to_lowercase())
    }
}

/// Returns the last `::`-separated segment of a class name.
#[must_use]
pub fn short_class_name(class: &str) -> &str {
    class.rsplit("::").next().unwrap_or(class)
}

/// Lower-cases the first character.
#[must_use]
pub fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Capitalizes the first character.
#[must_use]
pub fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
