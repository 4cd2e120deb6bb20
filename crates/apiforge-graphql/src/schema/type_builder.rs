//! Resource type builder.
//!
//! Builds (or retrieves from the [`TypeRegistry`]) the object, interface,
//! input and connection types of every resource. Each generated name is
//! constructed once per registry; later requests for the same name get the
//! same [`TypeHandle`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use super::fields::{
    CLIENT_MUTATION_ID, CLIENT_SUBSCRIPTION_ID, FieldsBuilder, MetadataFieldsBuilder,
};
use super::naming::{TypeRequest, generated_type_name};
use super::pagination::{MetadataPagination, Pagination, PaginationType};
use crate::Result;
use crate::error::GraphQLError;
use crate::metadata::{
    DynMetadataFactory, ITEM_QUERY, PropertyType, ResourceMetadata, lcfirst, short_class_name,
};
use crate::serializer::ITEM_RESOURCE_CLASS_KEY;
use crate::types::{
    self, FieldDefinition, InputObjectType, InterfaceType, LazyFields, ObjectType, SchemaType,
    TypeHandle, TypeKind, TypeRegistry, TypeResolver,
};

/// Name of the Relay node interface.
pub const NODE_INTERFACE: &str = "Node";

/// Builds GraphQL types from resource metadata.
///
/// Cloning shares the registry and collaborators.
#[derive(Clone)]
pub struct TypeBuilder {
    registry: TypeRegistry,
    metadata: DynMetadataFactory,
    fields_builder: Arc<dyn FieldsBuilder>,
    pagination: Arc<dyn Pagination>,
}

impl TypeBuilder {
    pub fn new(
        registry: TypeRegistry,
        metadata: DynMetadataFactory,
        fields_builder: Arc<dyn FieldsBuilder>,
        pagination: Arc<dyn Pagination>,
    ) -> Self {
        Self {
            registry,
            metadata,
            fields_builder,
            pagination,
        }
    }

    /// A builder using [`MetadataFieldsBuilder`] and [`MetadataPagination`].
    pub fn with_metadata(
        registry: TypeRegistry,
        metadata: DynMetadataFactory,
        default_pagination: PaginationType,
    ) -> Self {
        let pagination = Arc::new(MetadataPagination::new(
            Arc::clone(&metadata),
            default_pagination,
        ));
        Self::new(registry, metadata, Arc::new(MetadataFieldsBuilder), pagination)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn metadata_factory(&self) -> &DynMetadataFactory {
        &self.metadata
    }

    /// Returns the type of a resource for the given operation context.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::Logic` if the registry already holds a type of
    /// another kind under the generated name, and propagates metadata lookup
    /// errors from interface resolution.
    pub fn get_resource_object_type(
        &self,
        resource_class: Option<&str>,
        metadata: &Arc<ResourceMetadata>,
        request: &TypeRequest,
    ) -> Result<TypeHandle> {
        let name = generated_type_name(metadata, request);

        if let Some(existing) = self.registry.find(&name) {
            return match existing.kind() {
                TypeKind::Object | TypeKind::NonNull | TypeKind::Interface => {
                    trace!(type_name = %name, "Reusing registered resource type");
                    Ok(existing)
                }
                kind => Err(GraphQLError::Logic(format!(
                    "Expected GraphQL type \"{name}\" to be ObjectType|NonNull|InterfaceType, found {kind}."
                ))),
            };
        }

        // Input objects cannot be interfaces: interface resources get plain input types.
        let handle = if metadata.interface && !request.input {
            self.build_interface_type(&name, resource_class, metadata, request)
        } else {
            self.build_object_type(&name, resource_class, metadata, request)?
        };

        self.registry.set(name, Arc::clone(&handle));
        Ok(handle)
    }

    /// Returns the global Relay `Node` interface, building it on first use.
    ///
    /// Its type resolver maps a payload back to the type registered under the
    /// short name of its resource class hint, and yields `None` when the hint
    /// is absent or the type is not registered.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::Logic` if `Node` is registered as something else.
    pub fn get_node_interface(&self) -> Result<TypeHandle> {
        if let Some(existing) = self.registry.find(NODE_INTERFACE) {
            if existing.kind() != TypeKind::Interface {
                return Err(GraphQLError::Logic(format!(
                    "Expected GraphQL type \"{NODE_INTERFACE}\" to be InterfaceType, found {}.",
                    existing.kind()
                )));
            }
            return Ok(existing);
        }

        let resolver: TypeResolver = Box::new(
            |value: &Value, _: &TypeHandle, registry: &TypeRegistry| -> Result<Option<TypeHandle>> {
                let Some(class) = value.get(ITEM_RESOURCE_CLASS_KEY).and_then(Value::as_str) else {
                    return Ok(None);
                };
                Ok(registry.find(short_class_name(class)))
            },
        );
        let node = Arc::new(SchemaType::Interface(InterfaceType::new(
            NODE_INTERFACE,
            Some("A node, according to the Relay specification.".to_string()),
            LazyFields::fixed(vec![
                FieldDefinition::new("id", types::non_null(types::id()))
                    .description("The id of this node."),
            ]),
            resolver,
        )));

        self.registry.set(NODE_INTERFACE, Arc::clone(&node));
        Ok(node)
    }

    /// Returns the `<Name>Connection` type wrapping `resource_type`.
    ///
    /// The pagination collaborator decides between a cursor-based shape
    /// (edges and page info) and a page-based one (collection and pagination info).
    ///
    /// # Errors
    ///
    /// Propagates errors from the pagination collaborator.
    pub fn get_resource_paginated_collection_type(
        &self,
        resource_type: &TypeHandle,
        resource_class: &str,
        operation_name: &str,
    ) -> Result<TypeHandle> {
        let short_name = resource_type.name().to_string();
        let connection_name = format!("{short_name}Connection");
        if let Some(existing) = self.registry.find(&connection_name) {
            return Ok(existing);
        }

        let pagination_type = self
            .pagination
            .graphql_pagination_type(resource_class, operation_name)?;
        let fields = match pagination_type {
            PaginationType::Cursor => self.cursor_based_pagination_fields(resource_type),
            PaginationType::Page => self.page_based_pagination_fields(resource_type),
        };

        debug!(
            type_name = %connection_name,
            pagination = ?pagination_type,
            "Building connection type"
        );
        let connection = plain_object(
            &connection_name,
            format!("Connection for {short_name}."),
            fields,
        );
        self.registry.set(connection_name, Arc::clone(&connection));
        Ok(connection)
    }

    /// Whether a property holds a collection of objects of a known class.
    #[must_use]
    pub fn is_collection(&self, property_type: &PropertyType) -> bool {
        property_type.collection && property_type.collection_value_class().is_some()
    }

    fn cursor_based_pagination_fields(&self, resource_type: &TypeHandle) -> Vec<FieldDefinition> {
        let short_name = resource_type.name().to_string();

        let edge = self.get_or_register(&format!("{short_name}Edge"), |name| {
            plain_object(
                name,
                format!("Edge of {short_name}."),
                vec![
                    FieldDefinition::new("node", Arc::clone(resource_type)),
                    FieldDefinition::new("cursor", types::non_null(types::string())),
                ],
            )
        });
        let page_info = self.get_or_register(&format!("{short_name}PageInfo"), |name| {
            plain_object(
                name,
                "Information about the current page.".to_string(),
                vec![
                    FieldDefinition::new("endCursor", types::string()),
                    FieldDefinition::new("startCursor", types::string()),
                    FieldDefinition::new("hasNextPage", types::non_null(types::boolean())),
                    FieldDefinition::new("hasPreviousPage", types::non_null(types::boolean())),
                ],
            )
        });

        vec![
            FieldDefinition::new("edges", types::list_of(edge)),
            FieldDefinition::new("pageInfo", types::non_null(page_info)),
            FieldDefinition::new("totalCount", types::non_null(types::int())),
        ]
    }

    fn page_based_pagination_fields(&self, resource_type: &TypeHandle) -> Vec<FieldDefinition> {
        let short_name = resource_type.name().to_string();

        let pagination_info = self.get_or_register(&format!("{short_name}PaginationInfo"), |name| {
            plain_object(
                name,
                "Information about the pagination.".to_string(),
                vec![
                    FieldDefinition::new("itemsPerPage", types::non_null(types::int())),
                    FieldDefinition::new("lastPage", types::non_null(types::int())),
                    FieldDefinition::new("totalCount", types::non_null(types::int())),
                ],
            )
        });

        vec![
            FieldDefinition::new("collection", types::list_of(Arc::clone(resource_type))),
            FieldDefinition::new("paginationInfo", types::non_null(pagination_info)),
        ]
    }

    fn get_or_register(&self, name: &str, build: impl FnOnce(&str) -> TypeHandle) -> TypeHandle {
        if let Some(existing) = self.registry.find(name) {
            return existing;
        }
        let handle = build(name);
        self.registry.set(name, Arc::clone(&handle));
        handle
    }

    fn build_object_type(
        &self,
        name: &str,
        resource_class: Option<&str>,
        metadata: &Arc<ResourceMetadata>,
        request: &TypeRequest,
    ) -> Result<TypeHandle> {
        let io_class = metadata
            .io_class(request.operation_name(), request.input)
            .map(str::to_string);
        let resource_class = io_class
            .clone()
            .or_else(|| resource_class.map(str::to_string));

        let wrap_data = !request.wrapped
            && request.is_mutation_or_subscription()
            && !request.input
            && request.depth < 1;

        debug!(
            type_name = %name,
            input = request.input,
            depth = request.depth,
            wrap_data,
            "Building resource object type"
        );

        let fields = {
            let metadata = Arc::clone(metadata);
            let request = request.clone();
            let resource_class = resource_class.clone();
            LazyFields::new(move |builder| {
                if wrap_data {
                    builder.wrapped_payload_fields(resource_class.as_deref(), &metadata, &request)
                } else {
                    builder.resource_fields(
                        resource_class.as_deref(),
                        &metadata,
                        &request,
                        io_class.as_deref(),
                    )
                }
            })
        };

        if request.input {
            let input = Arc::new(SchemaType::InputObject(InputObjectType {
                name: name.to_string(),
                description: metadata.description.clone(),
                fields,
            }));
            return Ok(types::non_null(input));
        }

        let interfaces = if wrap_data {
            Vec::new()
        } else {
            let mut interfaces = vec![self.get_node_interface()?];
            interfaces.extend(self.implemented_interfaces(metadata, request)?);
            interfaces
        };

        Ok(Arc::new(SchemaType::Object(ObjectType {
            name: name.to_string(),
            description: metadata.description.clone(),
            fields,
            interfaces,
            resource_class,
        })))
    }

    fn build_interface_type(
        &self,
        name: &str,
        resource_class: Option<&str>,
        metadata: &Arc<ResourceMetadata>,
        request: &TypeRequest,
    ) -> TypeHandle {
        let io_class = metadata
            .io_class(request.operation_name(), request.input)
            .map(str::to_string);
        let resource_class = io_class
            .clone()
            .or_else(|| resource_class.map(str::to_string));

        let wrap_data = !request.wrapped
            && request.mutation_name.is_some()
            && !request.input
            && request.depth < 1;

        debug!(
            type_name = %name,
            depth = request.depth,
            wrap_data,
            "Building resource interface type"
        );

        let fields = {
            let metadata = Arc::clone(metadata);
            let request = request.clone();
            LazyFields::new(move |builder| {
                if wrap_data {
                    builder.wrapped_payload_fields(resource_class.as_deref(), &metadata, &request)
                } else {
                    builder.resource_fields(
                        resource_class.as_deref(),
                        &metadata,
                        &request,
                        io_class.as_deref(),
                    )
                }
            })
        };

        Arc::new(SchemaType::Interface(InterfaceType::new(
            name,
            metadata.description.clone(),
            fields,
            interface_type_resolver(),
        )))
    }

    /// Interface types of the resources `metadata` declares it implements.
    fn implemented_interfaces(
        &self,
        metadata: &ResourceMetadata,
        request: &TypeRequest,
    ) -> Result<Vec<TypeHandle>> {
        metadata
            .implements
            .iter()
            .map(|class| {
                let interface = self.metadata.create(class)?;
                if !interface.interface {
                    return Err(GraphQLError::InvalidMetadata(format!(
                        "\"{}\" implements \"{class}\", which is not an interface resource",
                        metadata.short_name
                    )));
                }
                let request = TypeRequest {
                    input: false,
                    ..request.clone()
                };
                self.get_resource_object_type(Some(class), &interface, &request)
            })
            .collect()
    }

    /// Fields of a mutation/subscription payload wrapping the resource.
    fn wrapped_payload_fields(
        &self,
        resource_class: Option<&str>,
        metadata: &Arc<ResourceMetadata>,
        request: &TypeRequest,
    ) -> Result<Vec<FieldDefinition>> {
        let query_context = metadata.normalization_context(request.query_name.as_deref());
        let operation_context = metadata.normalization_context(
            request
                .subscription_name
                .as_deref()
                .or(request.mutation_name.as_deref()),
        );

        // A dedicated data type only when the operation normalizes differently;
        // otherwise the query type is reused so clients can share cache entries.
        let data_type = if query_context != operation_context {
            self.get_resource_object_type(resource_class, metadata, &request.clone().wrapped())?
        } else {
            let query_request = TypeRequest {
                query_name: Some(
                    request
                        .query_name
                        .clone()
                        .unwrap_or_else(|| ITEM_QUERY.to_string()),
                ),
                input: request.input,
                wrapped: true,
                depth: request.depth,
                ..TypeRequest::default()
            };
            self.get_resource_object_type(resource_class, metadata, &query_request)?
        };

        let mut fields = vec![FieldDefinition::new(lcfirst(&metadata.short_name), data_type)];

        if request.subscription_name.is_some() {
            fields.push(FieldDefinition::new(CLIENT_SUBSCRIPTION_ID, types::string()));
            if metadata.mercure {
                fields.push(FieldDefinition::new("mercureUrl", types::string()));
            }
            return Ok(fields);
        }

        fields.push(FieldDefinition::new(CLIENT_MUTATION_ID, types::string()));
        Ok(fields)
    }

    /// Fields of a non-wrapped resource type, delegated to the fields builder.
    fn resource_fields(
        &self,
        resource_class: Option<&str>,
        metadata: &ResourceMetadata,
        request: &TypeRequest,
        io_class: Option<&str>,
    ) -> Result<Vec<FieldDefinition>> {
        let fields = self.fields_builder.resource_object_type_fields(
            self,
            resource_class,
            metadata,
            request,
            io_class,
        )?;

        if request.input
            && let Some(mutation) = request.mutation_name.as_deref()
            && let Some(args) = metadata.mutation_args(mutation)
        {
            let client_mutation_id = fields
                .into_iter()
                .find(|field| field.name == CLIENT_MUTATION_ID)
                .unwrap_or_else(|| FieldDefinition::new(CLIENT_MUTATION_ID, types::string()));
            let mut resolved = self.fields_builder.resolve_resource_args(
                self,
                args,
                mutation,
                &metadata.short_name,
            )?;
            resolved.push(client_mutation_id);
            return Ok(resolved);
        }

        Ok(fields)
    }
}

impl std::fmt::Debug for TypeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeBuilder")
            .field("registry", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// Type resolver of resource interfaces.
///
/// Fails loudly when the payload lacks its resource class hint, when the
/// concrete type is not registered, or when the concrete type does not declare
/// the interface the field returns.
fn interface_type_resolver() -> TypeResolver {
    Box::new(|value: &Value, return_type: &TypeHandle, registry: &TypeRegistry| -> Result<Option<TypeHandle>> {
        let class = value
            .get(ITEM_RESOURCE_CLASS_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GraphQLError::UnexpectedValue(
                    "Resource class was not passed. Interface type can not be used.".to_string(),
                )
            })?;
        let short_name = short_class_name(class);

        let concrete = registry.find(short_name).ok_or_else(|| {
            GraphQLError::UnexpectedValue(format!(
                "Type with name \"{short_name}\" could not be found"
            ))
        })?;

        let interface_name = return_type.unwrap_once().name();
        let implements = concrete
            .as_object()
            .is_some_and(|object| object.implements(interface_name));
        if !implements {
            return Err(GraphQLError::UnexpectedValue(format!(
                "Type \"{short_name}\" does not implement the \"{interface_name}\" interface"
            )));
        }

        Ok(Some(concrete))
    })
}

/// An object type with fixed fields and no interfaces.
fn plain_object(name: &str, description: String, fields: Vec<FieldDefinition>) -> TypeHandle {
    Arc::new(SchemaType::Object(ObjectType {
        name: name.to_string(),
        description: Some(description),
        fields: LazyFields::fixed(fields),
        interfaces: Vec::new(),
        resource_class: None,
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::metadata::{
        BuiltinType, COLLECTION_QUERY, GraphQlOperation, InMemoryMetadataFactory, PropertyMetadata,
    };

    fn dummy() -> ResourceMetadata {
        let mut dummy = ResourceMetadata::new("app::Dummy", "Dummy");
        dummy.properties = vec![
            PropertyMetadata::new("id", PropertyType::builtin(BuiltinType::Int)).identifier(),
            PropertyMetadata::new("name", PropertyType::builtin(BuiltinType::String)),
            PropertyMetadata::new("related", PropertyType::object("app::RelatedDummy")),
        ];
        dummy
            .graphql
            .insert(ITEM_QUERY.into(), GraphQlOperation::default());
        dummy.graphql.insert("create".into(), GraphQlOperation::default());
        dummy
    }

    fn related() -> ResourceMetadata {
        let mut related = ResourceMetadata::new("app::RelatedDummy", "RelatedDummy");
        related.properties = vec![
            PropertyMetadata::new("id", PropertyType::builtin(BuiltinType::Int)).identifier(),
            PropertyMetadata::new("owners", PropertyType::collection_of("app::Dummy")),
        ];
        related
    }

    fn builder(resources: Vec<ResourceMetadata>) -> TypeBuilder {
        let factory = Arc::new(InMemoryMetadataFactory::from_resources(resources));
        TypeBuilder::with_metadata(TypeRegistry::new(), factory, PaginationType::Cursor)
    }

    fn field_names(builder: &TypeBuilder, ty: &TypeHandle) -> Vec<String> {
        ty.fields(builder)
            .unwrap()
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    #[test]
    fn test_resource_object_type_is_cached() {
        let builder = builder(vec![dummy(), related()]);
        let metadata = builder.metadata_factory().create("app::Dummy").unwrap();
        let request = TypeRequest::query(ITEM_QUERY);

        let first = builder
            .get_resource_object_type(Some("app::Dummy"), &metadata, &request)
            .unwrap();
        let second = builder
            .get_resource_object_type(Some("app::Dummy"), &metadata, &request)
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&builder.registry().get("Dummy").unwrap(), &first));
    }

    #[test]
    fn test_object_type_implements_node() {
        let builder = builder(vec![dummy(), related()]);
        let metadata = builder.metadata_factory().create("app::Dummy").unwrap();
        let ty = builder
            .get_resource_object_type(Some("app::Dummy"), &metadata, &TypeRequest::query(ITEM_QUERY))
            .unwrap();

        let object = ty.as_object().unwrap();
        assert!(object.implements(NODE_INTERFACE));
        assert!(!object.fields.is_resolved());
        assert_eq!(field_names(&builder, &ty), vec!["id", "_id", "name", "related"]);
    }

    #[test]
    fn test_recursive_resources_resolve() {
        let builder = builder(vec![dummy(), related()]);
        let metadata = builder.metadata_factory().create("app::Dummy").unwrap();
        let ty = builder
            .get_resource_object_type(Some("app::Dummy"), &metadata, &TypeRequest::query(ITEM_QUERY))
            .unwrap();

        let fields = ty.fields(&builder).unwrap();
        let related = &fields.iter().find(|f| f.name == "related").unwrap().ty;
        assert_eq!(related.name(), "RelatedDummy");

        let owners = related.fields(&builder).unwrap();
        let owners = &owners.iter().find(|f| f.name == "owners").unwrap().ty;
        assert_eq!(owners.name(), "DummyConnection");
        assert!(builder.registry().has("DummyEdge"));
        assert!(builder.registry().has("DummyPageInfo"));
    }

    #[test]
    fn test_node_interface_is_shared() {
        let builder = builder(vec![]);
        let first = builder.get_node_interface().unwrap();
        let second = builder.get_node_interface().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(field_names(&builder, &first), vec!["id"]);
    }

    #[test]
    fn test_node_interface_wrong_kind_is_logic_error() {
        let builder = builder(vec![]);
        builder.registry().set(NODE_INTERFACE, types::string());
        assert!(matches!(builder.get_node_interface(), Err(GraphQLError::Logic(_))));
    }

    #[test]
    fn test_cached_scalar_is_logic_error() {
        let builder = builder(vec![dummy()]);
        let metadata = builder.metadata_factory().create("app::Dummy").unwrap();
        builder.registry().set("Dummy", types::string());

        let err = builder
            .get_resource_object_type(Some("app::Dummy"), &metadata, &TypeRequest::query(ITEM_QUERY))
            .unwrap_err();
        assert!(matches!(err, GraphQLError::Logic(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_mutation_payload_wraps_query_type() {
        let builder = builder(vec![dummy(), related()]);
        let metadata = builder.metadata_factory().create("app::Dummy").unwrap();
        let payload = builder
            .get_resource_object_type(Some("app::Dummy"), &metadata, &TypeRequest::mutation("create"))
            .unwrap();

        assert_eq!(payload.name(), "createDummyPayload");
        assert!(payload.as_object().unwrap().interfaces.is_empty());

        let fields = payload.fields(&builder).unwrap();
        assert_eq!(fields[0].name, "dummy");
        assert_eq!(fields[0].ty.name(), "Dummy");
        assert_eq!(fields[1].name, CLIENT_MUTATION_ID);
    }

    #[test]
    fn test_mutation_payload_with_distinct_context_gets_data_type() {
        let mut metadata = dummy();
        metadata.graphql.insert(
            "create".into(),
            GraphQlOperation {
                normalization_context: json!({"groups": ["write"]}).as_object().cloned(),
                ..GraphQlOperation::default()
            },
        );
        let builder = builder(vec![metadata, related()]);
        let metadata = builder.metadata_factory().create("app::Dummy").unwrap();
        let payload = builder
            .get_resource_object_type(Some("app::Dummy"), &metadata, &TypeRequest::mutation("create"))
            .unwrap();

        let fields = payload.fields(&builder).unwrap();
        assert_eq!(fields[0].ty.name(), "createDummyPayloadData");
    }

    #[test]
    fn test_input_type_is_non_null() {
        let builder = builder(vec![dummy(), related()]);
        let metadata = builder.metadata_factory().create("app::Dummy").unwrap();
        let input = builder
            .get_resource_object_type(
                Some("app::Dummy"),
                &metadata,
                &TypeRequest::mutation("create").input(),
            )
            .unwrap();

        assert_eq!(input.kind(), TypeKind::NonNull);
        assert_eq!(input.to_string(), "createDummyInput!");
        assert_eq!(
            field_names(&builder, &input),
            vec!["_id", "name", "related", CLIENT_MUTATION_ID]
        );
    }

    #[test]
    fn test_subscription_payload_fields() {
        let mut metadata = dummy();
        metadata.mercure = true;
        let builder = builder(vec![metadata, related()]);
        let metadata = builder.metadata_factory().create("app::Dummy").unwrap();
        let payload = builder
            .get_resource_object_type(
                Some("app::Dummy"),
                &metadata,
                &TypeRequest::subscription("update"),
            )
            .unwrap();

        assert_eq!(payload.name(), "updateDummySubscriptionPayload");
        assert_eq!(
            field_names(&builder, &payload),
            vec!["dummy", CLIENT_SUBSCRIPTION_ID, "mercureUrl"]
        );
    }

    #[test]
    fn test_page_based_connection() {
        let mut metadata = dummy();
        metadata.pagination_type = Some(PaginationType::Page);
        let builder = builder(vec![metadata]);
        let metadata = builder.metadata_factory().create("app::Dummy").unwrap();
        let item = builder
            .get_resource_object_type(
                Some("app::Dummy"),
                &metadata,
                &TypeRequest::query(COLLECTION_QUERY),
            )
            .unwrap();

        let connection = builder
            .get_resource_paginated_collection_type(&item, "app::Dummy", COLLECTION_QUERY)
            .unwrap();
        assert_eq!(
            field_names(&builder, &connection),
            vec!["collection", "paginationInfo"]
        );
        assert!(builder.registry().has("DummyPaginationInfo"));
        assert!(!builder.registry().has("DummyEdge"));

        let again = builder
            .get_resource_paginated_collection_type(&item, "app::Dummy", COLLECTION_QUERY)
            .unwrap();
        assert!(Arc::ptr_eq(&connection, &again));
    }

    #[test]
    fn test_is_collection() {
        let builder = builder(vec![]);
        assert!(builder.is_collection(&PropertyType::collection_of("app::Dummy")));
        assert!(!builder.is_collection(&PropertyType::object("app::Dummy")));

        let mut untyped = PropertyType::builtin(BuiltinType::Array);
        untyped.collection = true;
        assert!(!builder.is_collection(&untyped));
    }
}
