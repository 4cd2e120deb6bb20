//! GraphQL schema builder.
//!
//! Walks every resource of the metadata factory and assembles a dynamic
//! schema from the types the [`TypeBuilder`] produces: item and collection
//! query fields, mutation fields and the Relay `node` field.

use std::sync::Arc;

use async_graphql::dynamic::{Field, InputValue, Object, Schema, SchemaBuilder, TypeRef};
use tracing::{debug, info};

use super::dynamic::{pagination_arguments, register_types, type_ref};
use super::naming::TypeRequest;
use super::pagination::PaginationType;
use super::type_builder::{NODE_INTERFACE, TypeBuilder};
use crate::Result;
use crate::context::{DEFAULT_ITEMS_PER_PAGE, GraphQLContext};
use crate::error::GraphQLError;
use crate::metadata::{
    COLLECTION_QUERY, DynMetadataFactory, ITEM_QUERY, OperationKind, ResourceMetadata, lcfirst,
    ucfirst,
};
use crate::resolvers::{
    CollectionResolver, DynResourceResolver, ItemResolver, MutationResolver, NodeResolver,
};
use crate::types::{TypeHandle, TypeRegistry};

/// Operations exposed for resources that declare none.
const DEFAULT_OPERATIONS: [(&str, OperationKind); 5] = [
    (ITEM_QUERY, OperationKind::ItemQuery),
    (COLLECTION_QUERY, OperationKind::CollectionQuery),
    ("create", OperationKind::Mutation),
    ("update", OperationKind::Mutation),
    ("delete", OperationKind::Mutation),
];

/// Configuration for the schema builder.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,

    /// Pagination style of collections that do not set one.
    pub default_pagination_type: PaginationType,

    /// Page size of collection queries without explicit bounds.
    pub items_per_page: u64,

    /// Prefix of resource IRIs, without trailing slash.
    pub iri_prefix: String,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
            default_pagination_type: PaginationType::Cursor,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            iri_prefix: String::new(),
        }
    }
}

/// Builds the GraphQL schema of all resources.
///
/// Every build starts from an empty [`TypeRegistry`], so rebuilding after a
/// metadata change never reuses stale types.
///
/// # Example
///
/// ```ignore
/// let builder = ResourceSchemaBuilder::new(
///     metadata_factory,
///     resolver,
///     SchemaBuilderConfig::default(),
/// );
///
/// let schema = builder.build().await?;
/// ```
pub struct ResourceSchemaBuilder {
    metadata: DynMetadataFactory,
    resolver: DynResourceResolver,
    config: SchemaBuilderConfig,
}

/// Root fields collected while walking the resources.
#[derive(Default)]
struct RootFields {
    queries: Vec<Field>,
    mutations: Vec<Field>,
    types: Vec<TypeHandle>,
}

impl ResourceSchemaBuilder {
    pub fn new(
        metadata: DynMetadataFactory,
        resolver: DynResourceResolver,
        config: SchemaBuilderConfig,
    ) -> Self {
        Self {
            metadata,
            resolver,
            config,
        }
    }

    /// Returns the builder configuration.
    #[must_use]
    pub fn config(&self) -> &SchemaBuilderConfig {
        &self.config
    }

    /// Builds the schema.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::SchemaBuildFailed` if async-graphql rejects the
    /// assembled schema, and propagates type building errors.
    pub async fn build(&self) -> Result<Schema> {
        debug!("Starting GraphQL schema build");

        let type_builder = TypeBuilder::with_metadata(
            TypeRegistry::new(),
            Arc::clone(&self.metadata),
            self.config.default_pagination_type,
        );

        let mut roots = RootFields::default();

        let node = type_builder.get_node_interface()?;
        roots.queries.push(
            Field::new(
                "node",
                TypeRef::named(NODE_INTERFACE),
                NodeResolver::resolve(Arc::clone(&node)),
            )
            .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID))),
        );
        roots.types.push(node);

        let resource_classes = self.metadata.resource_classes();
        for resource_class in &resource_classes {
            let metadata = self.metadata.create(resource_class)?;
            self.add_resource(&type_builder, resource_class, &metadata, &mut roots)?;
        }

        let has_mutations = !roots.mutations.is_empty();
        let mut schema = Schema::build("Query", has_mutations.then_some("Mutation"), None);
        schema = register_types(schema, &type_builder, &roots.types)?;
        schema = register_root("Query", roots.queries, schema);
        if has_mutations {
            schema = register_root("Mutation", roots.mutations, schema);
        }

        let context = GraphQLContext::builder()
            .with_type_builder(type_builder.clone())
            .with_resolver(Arc::clone(&self.resolver))
            .with_iri_prefix(self.config.iri_prefix.clone())
            .with_items_per_page(self.config.items_per_page)
            .build()
            .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;

        // Configure limits
        let mut schema = schema
            .data(context)
            .limit_depth(self.config.max_depth)
            .limit_complexity(self.config.max_complexity);

        if !self.config.introspection_enabled {
            schema = schema.disable_introspection();
        }

        let schema = schema
            .finish()
            .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;

        info!(
            resources = resource_classes.len(),
            types = type_builder.registry().len(),
            "GraphQL schema build complete"
        );
        Ok(schema)
    }

    fn add_resource(
        &self,
        type_builder: &TypeBuilder,
        resource_class: &str,
        metadata: &Arc<ResourceMetadata>,
        roots: &mut RootFields,
    ) -> Result<()> {
        for (operation, kind) in resource_operations(metadata) {
            match kind {
                OperationKind::ItemQuery => {
                    let item_type = type_builder.get_resource_object_type(
                        Some(resource_class),
                        metadata,
                        &TypeRequest::query(operation.clone()),
                    )?;
                    let name = query_field_name(&operation, ITEM_QUERY, &metadata.short_name);
                    roots.queries.push(
                        Field::new(
                            name,
                            type_ref(&item_type),
                            ItemResolver::resolve(resource_class.to_string(), Arc::clone(&item_type)),
                        )
                        .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID))),
                    );
                    roots.types.push(item_type);
                }
                OperationKind::CollectionQuery => {
                    let item_type = type_builder.get_resource_object_type(
                        Some(resource_class),
                        metadata,
                        &TypeRequest::query(operation.clone()),
                    )?;
                    let connection = type_builder.get_resource_paginated_collection_type(
                        &item_type,
                        resource_class,
                        &operation,
                    )?;
                    let name = query_field_name(
                        &operation,
                        COLLECTION_QUERY,
                        &pluralize(&metadata.short_name),
                    );
                    let mut field = Field::new(
                        name,
                        type_ref(&connection),
                        CollectionResolver::resolve(
                            resource_class.to_string(),
                            operation.clone(),
                            Arc::clone(&connection),
                        ),
                    );
                    for argument in pagination_arguments(type_builder, &connection)? {
                        field = field.argument(argument);
                    }
                    roots.queries.push(field);
                    roots.types.push(connection);
                }
                OperationKind::Mutation if metadata.interface => {
                    debug!(
                        short_name = %metadata.short_name,
                        mutation = %operation,
                        "Skipping mutation on interface resource"
                    );
                }
                OperationKind::Mutation => {
                    let request = TypeRequest::mutation(operation.clone());
                    let payload = type_builder.get_resource_object_type(
                        Some(resource_class),
                        metadata,
                        &request,
                    )?;
                    let input = type_builder.get_resource_object_type(
                        Some(resource_class),
                        metadata,
                        &request.input(),
                    )?;
                    let name = lcfirst(&format!("{operation}{}", ucfirst(&metadata.short_name)));
                    roots.mutations.push(
                        Field::new(
                            name,
                            type_ref(&payload),
                            MutationResolver::resolve(
                                resource_class.to_string(),
                                operation.clone(),
                                metadata.short_name.clone(),
                                Arc::clone(&payload),
                            ),
                        )
                        .argument(InputValue::new("input", type_ref(&input))),
                    );
                    roots.types.push(payload);
                    roots.types.push(input);
                }
                // Served below through `subscriptions()`, which adds the implicit mercure one.
                OperationKind::Subscription => {}
            }
        }

        // Subscription types are registered without a subscription root.
        for subscription in metadata.subscriptions() {
            let request = TypeRequest::subscription(subscription);
            let payload =
                type_builder.get_resource_object_type(Some(resource_class), metadata, &request)?;
            let input = type_builder.get_resource_object_type(
                Some(resource_class),
                metadata,
                &request.input(),
            )?;
            roots.types.push(payload);
            roots.types.push(input);
        }

        Ok(())
    }
}

/// Declared operations of a resource, or the defaults when it declares none.
fn resource_operations(metadata: &ResourceMetadata) -> Vec<(String, OperationKind)> {
    if metadata.graphql.is_empty() {
        return DEFAULT_OPERATIONS
            .iter()
            .map(|(name, kind)| ((*name).to_string(), *kind))
            .collect();
    }
    metadata
        .graphql
        .keys()
        .filter_map(|name| {
            metadata
                .operation_kind(name)
                .map(|kind| (name.clone(), kind))
        })
        .collect()
}

/// `lcfirst(base)` for the built-in query, `lcfirst({operation}{Base})` otherwise.
fn query_field_name(operation: &str, builtin: &str, base: &str) -> String {
    if operation == builtin {
        lcfirst(base)
    } else {
        lcfirst(&format!("{operation}{}", ucfirst(base)))
    }
}

/// English plural of a short name.
fn pluralize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix('y')
        && !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
    {
        return format!("{stem}ies");
    }
    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
    {
        return format!("{name}es");
    }
    format!("{name}s")
}

fn register_root(name: &str, fields: Vec<Field>, schema: SchemaBuilder) -> SchemaBuilder {
    let root = fields
        .into_iter()
        .fold(Object::new(name), |root, field| root.field(field));
    schema.register(root)
}
