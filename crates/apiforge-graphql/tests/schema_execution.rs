//! End-to-end tests that build a schema from TOML metadata and execute
//! queries and mutations against the in-memory resolver.

use std::sync::Arc;

use apiforge_graphql::{
    InMemoryMetadataFactory, InMemoryResourceResolver, ResourceSchemaBuilder, SchemaBuilderConfig,
};
use async_graphql::dynamic::Schema;
use serde_json::{Value, json};

const METADATA: &str = r#"
[[resources]]
class = "app::Dummy"
short_name = "Dummy"
description = "A dummy resource."

[[resources.properties]]
name = "id"
identifier = true
type = { builtin = "int" }

[[resources.properties]]
name = "name"
required = true
type = { builtin = "string" }

[[resources.properties]]
name = "relatedDummy"
type = { builtin = "object", class_name = "app::RelatedDummy", nullable = true }

[[resources.properties]]
name = "relatedDummies"
type = { builtin = "object", collection = true, collection_value_type = { builtin = "object", class_name = "app::RelatedDummy" } }

[[resources]]
class = "app::RelatedDummy"
short_name = "RelatedDummy"

[[resources.properties]]
name = "id"
identifier = true
type = { builtin = "int" }

[[resources.properties]]
name = "symfony"
type = { builtin = "string" }

[[resources]]
class = "app::Book"
short_name = "Book"
pagination_type = "page"

[[resources.properties]]
name = "id"
identifier = true
type = { builtin = "int" }

[[resources.properties]]
name = "title"
type = { builtin = "string" }

[[resources]]
class = "app::Animal"
short_name = "Animal"
interface = true

[[resources.properties]]
name = "id"
identifier = true
type = { builtin = "int" }

[[resources.properties]]
name = "name"
type = { builtin = "string" }

[[resources]]
class = "app::Dog"
short_name = "Dog"
implements = ["app::Animal"]

[[resources.properties]]
name = "id"
identifier = true
type = { builtin = "int" }

[[resources.properties]]
name = "name"
type = { builtin = "string" }

[[resources.properties]]
name = "breed"
type = { builtin = "string" }

[[resources]]
class = "app::Kennel"
short_name = "Kennel"

[[resources.properties]]
name = "id"
identifier = true
type = { builtin = "int" }

[[resources.properties]]
name = "pet"
type = { builtin = "object", class_name = "app::Animal", nullable = true }
"#;

// ============================================================================
// Fixtures
// ============================================================================

async fn setup(config: SchemaBuilderConfig) -> Schema {
    let metadata = Arc::new(InMemoryMetadataFactory::from_toml_str(METADATA).unwrap());
    let resolver = Arc::new(InMemoryResourceResolver::new(metadata.clone()));

    resolver
        .insert("app::RelatedDummy", json!({"id": 1, "symfony": "foo"}))
        .await
        .unwrap();
    resolver
        .insert("app::RelatedDummy", json!({"id": 2, "symfony": "bar"}))
        .await
        .unwrap();
    resolver
        .insert(
            "app::Dummy",
            json!({"id": 1, "name": "Foo", "relatedDummy": 1, "relatedDummies": [1, 2]}),
        )
        .await
        .unwrap();
    resolver
        .insert("app::Dummy", json!({"id": 2, "name": "Bar", "relatedDummies": []}))
        .await
        .unwrap();
    for (id, title) in [(1, "Dune"), (2, "Solaris"), (3, "Ubik")] {
        resolver
            .insert("app::Book", json!({"id": id, "title": title}))
            .await
            .unwrap();
    }
    resolver
        .insert("app::Dog", json!({"id": 1, "name": "Rex", "breed": "collie"}))
        .await
        .unwrap();
    resolver
        .insert("app::Kennel", json!({"id": 1, "pet": 1}))
        .await
        .unwrap();

    ResourceSchemaBuilder::new(metadata, resolver, config)
        .build()
        .await
        .unwrap()
}

async fn execute(schema: &Schema, query: &str) -> Value {
    let response = schema.execute(query).await;
    assert!(
        response.errors.is_empty(),
        "unexpected errors: {:?}",
        response.errors
    );
    response.data.into_json().unwrap()
}

// ============================================================================
// Schema shape
// ============================================================================

#[tokio::test]
async fn test_sdl_contains_resource_types() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let sdl = schema.sdl();

    assert!(sdl.contains("interface Node"));
    assert!(sdl.contains("type Dummy implements Node"));
    assert!(sdl.contains("type DummyConnection"));
    assert!(sdl.contains("type BookConnection"));
    assert!(sdl.contains("type BookPaginationInfo"));
    assert!(sdl.contains("input createDummyInput"));
    assert!(sdl.contains("interface AnimalInterface"));
    // No mutations are generated for interface resources.
    assert!(!sdl.contains("createAnimal"));
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_item_query() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        r#"{ dummy(id: "/dummy/1") { id _id name relatedDummy { id symfony } } }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({
            "dummy": {
                "id": "/dummy/1",
                "_id": 1,
                "name": "Foo",
                "relatedDummy": {"id": "/relateddummy/1", "symfony": "foo"}
            }
        })
    );
}

#[tokio::test]
async fn test_item_query_with_iri_prefix() {
    let config = SchemaBuilderConfig {
        iri_prefix: "/api".to_string(),
        ..SchemaBuilderConfig::default()
    };
    let schema = setup(config).await;
    let data = execute(&schema, r#"{ dummy(id: "/api/dummy/2") { id name } }"#).await;

    assert_eq!(data["dummy"]["id"], "/api/dummy/2");
    assert_eq!(data["dummy"]["name"], "Bar");
}

#[tokio::test]
async fn test_item_query_unknown_or_foreign_iri() {
    let schema = setup(SchemaBuilderConfig::default()).await;

    let data = execute(&schema, r#"{ dummy(id: "/dummy/99") { id } }"#).await;
    assert_eq!(data["dummy"], Value::Null);

    let data = execute(&schema, r#"{ dummy(id: "/relateddummy/1") { id } }"#).await;
    assert_eq!(data["dummy"], Value::Null);

    let data = execute(&schema, r#"{ dummy(id: "/nowhere/1") { id } }"#).await;
    assert_eq!(data["dummy"], Value::Null);
}

#[tokio::test]
async fn test_cursor_collection_query() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        r#"{
            dummies(first: 1) {
                totalCount
                edges { cursor node { name } }
                pageInfo { hasNextPage hasPreviousPage endCursor }
            }
        }"#,
    )
    .await;

    let connection = &data["dummies"];
    assert_eq!(connection["totalCount"], 2);
    assert_eq!(connection["edges"].as_array().unwrap().len(), 1);
    assert_eq!(connection["edges"][0]["node"]["name"], "Foo");
    assert_eq!(connection["pageInfo"]["hasNextPage"], true);
    assert_eq!(connection["pageInfo"]["hasPreviousPage"], false);

    let cursor = connection["edges"][0]["cursor"].as_str().unwrap().to_string();
    assert_eq!(connection["pageInfo"]["endCursor"], cursor.as_str());

    let query = format!(r#"{{ dummies(first: 1, after: "{cursor}") {{ edges {{ node {{ name }} }} }} }}"#);
    let data = execute(&schema, &query).await;
    assert_eq!(data["dummies"]["edges"][0]["node"]["name"], "Bar");
}

#[tokio::test]
async fn test_cursor_collection_last() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(&schema, "{ dummies(last: 1) { edges { node { name } } } }").await;

    let edges = data["dummies"]["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["node"]["name"], "Bar");
}

#[tokio::test]
async fn test_to_many_relation_connection() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        r#"{
            dummy(id: "/dummy/1") {
                relatedDummies(first: 5) { totalCount edges { node { id symfony } } }
            }
        }"#,
    )
    .await;

    let related = &data["dummy"]["relatedDummies"];
    assert_eq!(related["totalCount"], 2);
    assert_eq!(
        related["edges"],
        json!([
            {"node": {"id": "/relateddummy/1", "symfony": "foo"}},
            {"node": {"id": "/relateddummy/2", "symfony": "bar"}}
        ])
    );
}

#[tokio::test]
async fn test_page_collection_query() {
    let config = SchemaBuilderConfig {
        items_per_page: 2,
        ..SchemaBuilderConfig::default()
    };
    let schema = setup(config).await;
    let data = execute(
        &schema,
        "{ books(page: 2) { collection { title } paginationInfo { itemsPerPage lastPage totalCount } } }",
    )
    .await;

    assert_eq!(
        data["books"],
        json!({
            "collection": [{"title": "Ubik"}],
            "paginationInfo": {"itemsPerPage": 2, "lastPage": 2, "totalCount": 3}
        })
    );
}

#[tokio::test]
async fn test_node_query() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        r#"{ node(id: "/relateddummy/2") { id ... on RelatedDummy { symfony } } }"#,
    )
    .await;

    assert_eq!(data["node"], json!({"id": "/relateddummy/2", "symfony": "bar"}));
}

#[tokio::test]
async fn test_interface_collection_resolves_concrete_types() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        "{ animals { edges { node { __typename id name ... on Dog { breed } } } } }",
    )
    .await;

    assert_eq!(
        data["animals"]["edges"],
        json!([
            {"node": {"__typename": "Dog", "id": "/dog/1", "name": "Rex", "breed": "collie"}}
        ])
    );

    let data = execute(&schema, r#"{ animal(id: "/dog/1") { __typename name } }"#).await;
    assert_eq!(data["animal"], json!({"__typename": "Dog", "name": "Rex"}));
}

#[tokio::test]
async fn test_relation_declared_as_interface() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        r#"{ kennel(id: "/kennel/1") { pet { __typename id name ... on Dog { breed } } } }"#,
    )
    .await;

    assert_eq!(
        data["kennel"]["pet"],
        json!({"__typename": "Dog", "id": "/dog/1", "name": "Rex", "breed": "collie"})
    );
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_create_mutation() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        r#"mutation {
            createDummy(input: {name: "Baz", relatedDummy: "/relateddummy/2", clientMutationId: "m1"}) {
                dummy { id name relatedDummy { symfony } }
                clientMutationId
            }
        }"#,
    )
    .await;

    let payload = &data["createDummy"];
    assert_eq!(payload["clientMutationId"], "m1");
    assert_eq!(payload["dummy"]["id"], "/dummy/3");
    assert_eq!(payload["dummy"]["name"], "Baz");
    assert_eq!(payload["dummy"]["relatedDummy"]["symfony"], "bar");

    let data = execute(&schema, r#"{ dummy(id: "/dummy/3") { name } }"#).await;
    assert_eq!(data["dummy"]["name"], "Baz");
}

#[tokio::test]
async fn test_create_mutation_with_identifier_and_relation_iris() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        r#"mutation {
            createDummy(input: {
                _id: 40,
                name: "Custom",
                relatedDummy: "/relateddummy/1",
                relatedDummies: ["/relateddummy/1", "/relateddummy/2"],
                clientMutationId: "c"
            }) {
                dummy { id _id relatedDummy { symfony } relatedDummies { totalCount } }
            }
        }"#,
    )
    .await;

    assert_eq!(
        data["createDummy"]["dummy"],
        json!({
            "id": "/dummy/40",
            "_id": 40,
            "relatedDummy": {"symfony": "foo"},
            "relatedDummies": {"totalCount": 2}
        })
    );

    let data = execute(
        &schema,
        r#"{ dummy(id: "/dummy/40") { name relatedDummies { edges { node { symfony } } } } }"#,
    )
    .await;
    assert_eq!(data["dummy"]["name"], "Custom");
    assert_eq!(
        data["dummy"]["relatedDummies"]["edges"],
        json!([{"node": {"symfony": "foo"}}, {"node": {"symfony": "bar"}}])
    );

    // The generated identifiers continue after the explicit one.
    let data = execute(
        &schema,
        r#"mutation { createDummy(input: {name: "After"}) { dummy { _id } } }"#,
    )
    .await;
    assert_eq!(data["createDummy"]["dummy"]["_id"], 41);
}

#[tokio::test]
async fn test_update_mutation() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        r#"mutation {
            updateDummy(input: {id: "/dummy/2", name: "Qux"}) { dummy { id name } clientMutationId }
        }"#,
    )
    .await;

    assert_eq!(
        data["updateDummy"],
        json!({"dummy": {"id": "/dummy/2", "name": "Qux"}, "clientMutationId": null})
    );
}

#[tokio::test]
async fn test_delete_mutation() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let data = execute(
        &schema,
        r#"mutation { deleteDummy(input: {id: "/dummy/2", clientMutationId: "d1"}) { dummy { id } clientMutationId } }"#,
    )
    .await;

    assert_eq!(
        data["deleteDummy"],
        json!({"dummy": {"id": "/dummy/2"}, "clientMutationId": "d1"})
    );

    let data = execute(&schema, "{ dummies { totalCount } }").await;
    assert_eq!(data["dummies"]["totalCount"], 1);
}

#[tokio::test]
async fn test_delete_unknown_item_fails() {
    let schema = setup(SchemaBuilderConfig::default()).await;
    let response = schema
        .execute(r#"mutation { deleteDummy(input: {id: "/dummy/42"}) { clientMutationId } }"#)
        .await;

    assert_eq!(response.errors.len(), 1);
}
