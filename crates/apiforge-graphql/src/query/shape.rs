//! Abstract query shape and entity metadata.
//!
//! The query-building layer describes the query it is about to run as a
//! [`QueryShape`]; entity mapping facts come from a [`ClassMetadataRegistry`].

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::GraphQLError;

/// Kind of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    Left,
}

/// Entity selected in the FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootEntity {
    pub alias: String,
    pub class: String,
}

/// One join of the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    /// `parentAlias.association`, or an entity class for arbitrary joins.
    pub join: String,
    pub alias: String,
}

impl Join {
    /// Splits `parentAlias.association` joins. `None` for class joins.
    #[must_use]
    pub fn relationship(&self) -> Option<(&str, &str)> {
        self.join.split_once('.')
    }
}

/// Structure of a query, as far as pagination decisions are concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryShape {
    pub root_entities: Vec<RootEntity>,
    #[serde(default)]
    pub joins: Vec<Join>,
    /// ORDER BY expressions such as `o.name ASC`.
    #[serde(default)]
    pub order_by: Vec<String>,
    #[serde(default)]
    pub having: Option<String>,
    #[serde(default)]
    pub max_results: Option<u64>,
}

impl QueryShape {
    /// A query selecting `class` under `alias`.
    pub fn new(alias: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            root_entities: vec![RootEntity {
                alias: alias.into(),
                class: class.into(),
            }],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn inner_join(self, join: impl Into<String>, alias: impl Into<String>) -> Self {
        self.join(JoinKind::Inner, join, alias)
    }

    #[must_use]
    pub fn left_join(self, join: impl Into<String>, alias: impl Into<String>) -> Self {
        self.join(JoinKind::Left, join, alias)
    }

    #[must_use]
    pub fn join(mut self, kind: JoinKind, join: impl Into<String>, alias: impl Into<String>) -> Self {
        self.joins.push(Join {
            kind,
            join: join.into(),
            alias: alias.into(),
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, expression: impl Into<String>) -> Self {
        self.order_by.push(expression.into());
        self
    }

    #[must_use]
    pub fn having(mut self, condition: impl Into<String>) -> Self {
        self.having = Some(condition.into());
        self
    }

    #[must_use]
    pub fn max_results(mut self, max_results: u64) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn root_aliases(&self) -> impl Iterator<Item = &str> {
        self.root_entities.iter().map(|root| root.alias.as_str())
    }

    /// Aliases introduced by joins.
    pub fn join_aliases(&self) -> impl Iterator<Item = &str> {
        self.joins.iter().map(|join| join.alias.as_str())
    }

    #[must_use]
    pub fn is_root_alias(&self, alias: &str) -> bool {
        self.root_aliases().any(|root| root == alias)
    }
}

/// Mapping of one association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationMetadata {
    pub target_class: String,
    /// Whether the association holds many entities (one-to-many, many-to-many).
    #[serde(default)]
    pub collection_valued: bool,
}

/// Mapping facts about one entity class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub class: String,
    #[serde(default)]
    pub identifier_composite: bool,
    /// Whether part of the identifier is a foreign key.
    #[serde(default)]
    pub contains_foreign_identifier: bool,
    #[serde(default)]
    pub associations: IndexMap<String, AssociationMetadata>,
}

impl EntityMetadata {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn to_one(mut self, name: impl Into<String>, target_class: impl Into<String>) -> Self {
        self.associations.insert(
            name.into(),
            AssociationMetadata {
                target_class: target_class.into(),
                collection_valued: false,
            },
        );
        self
    }

    #[must_use]
    pub fn to_many(mut self, name: impl Into<String>, target_class: impl Into<String>) -> Self {
        self.associations.insert(
            name.into(),
            AssociationMetadata {
                target_class: target_class.into(),
                collection_valued: true,
            },
        );
        self
    }

    #[must_use]
    pub fn is_collection_valued_association(&self, name: &str) -> bool {
        self.associations
            .get(name)
            .is_some_and(|association| association.collection_valued)
    }

    #[must_use]
    pub fn association_target_class(&self, name: &str) -> Option<&str> {
        self.associations
            .get(name)
            .map(|association| association.target_class.as_str())
    }
}

/// Read-only provider of entity mapping metadata.
pub trait ClassMetadataRegistry: Send + Sync {
    /// Returns the mapping metadata of `class`.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NotFound` if the class is not mapped.
    fn class_metadata(&self, class: &str) -> Result<Arc<EntityMetadata>>;
}

/// Entity metadata held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryClassMetadata {
    entities: IndexMap<String, Arc<EntityMetadata>>,
}

impl InMemoryClassMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = EntityMetadata>) -> Self {
        let mut registry = Self::new();
        for entity in entities {
            registry.register(entity);
        }
        registry
    }

    pub fn register(&mut self, entity: EntityMetadata) {
        self.entities.insert(entity.class.clone(), Arc::new(entity));
    }
}

impl ClassMetadataRegistry for InMemoryClassMetadata {
    fn class_metadata(&self, class: &str) -> Result<Arc<EntityMetadata>> {
        self.entities
            .get(class)
            .cloned()
            .ok_or_else(|| GraphQLError::NotFound(format!("Class \"{class}\" is not a mapped entity")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_builder() {
        let shape = QueryShape::new("o", "app::Dummy")
            .left_join("o.relatedDummies", "r")
            .inner_join("app::Other", "x")
            .order_by("r.name ASC")
            .max_results(10);

        assert_eq!(shape.root_aliases().collect::<Vec<_>>(), vec!["o"]);
        assert_eq!(shape.join_aliases().collect::<Vec<_>>(), vec!["r", "x"]);
        assert_eq!(shape.joins[0].relationship(), Some(("o", "relatedDummies")));
        assert_eq!(shape.joins[1].relationship(), None);
        assert!(shape.is_root_alias("o"));
        assert!(!shape.is_root_alias("r"));
    }

    #[test]
    fn test_shape_deserialize() {
        let shape: QueryShape = serde_json::from_str(
            r#"{
                "root_entities": [{"alias": "o", "class": "app::Dummy"}],
                "joins": [{"kind": "left", "join": "o.related", "alias": "r"}]
            }"#,
        )
        .unwrap();
        assert_eq!(shape.joins[0].kind, JoinKind::Left);
        assert!(shape.max_results.is_none());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = InMemoryClassMetadata::from_entities([
            EntityMetadata::new("app::Dummy").to_many("related", "app::Related"),
        ]);
        let dummy = registry.class_metadata("app::Dummy").unwrap();
        assert!(dummy.is_collection_valued_association("related"));
        assert!(!dummy.is_collection_valued_association("missing"));
        assert_eq!(dummy.association_target_class("related"), Some("app::Related"));
        assert!(matches!(
            registry.class_metadata("app::Missing"),
            Err(GraphQLError::NotFound(_))
        ));
    }
}
