//! Structural predicates over a [`QueryShape`].
//!
//! Each predicate answers one question the paginator needs before deciding
//! how a query can be paginated. None of them modifies the shape.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use super::shape::{ClassMetadataRegistry, EntityMetadata, JoinKind, QueryShape};
use crate::Result;
use crate::error::GraphQLError;

/// One alias on the path from a root entity down to a joined alias.
#[derive(Debug, Clone)]
pub struct JoinStep {
    pub alias: String,
    /// Metadata of the entity selected under `alias`.
    pub metadata: Arc<EntityMetadata>,
    /// Association leading from `alias` to the next step, `None` on the last one.
    pub association: Option<String>,
}

/// Whether the query has a HAVING clause.
#[must_use]
pub fn has_having_clause(shape: &QueryShape) -> bool {
    shape.having.is_some()
}

/// Whether a root entity has an identifier made of several columns.
///
/// # Errors
///
/// Returns `GraphQLError::NotFound` if a root entity is not mapped.
pub fn has_root_entity_with_composite_identifier(
    shape: &QueryShape,
    registry: &dyn ClassMetadataRegistry,
) -> Result<bool> {
    for root in &shape.root_entities {
        if registry.class_metadata(&root.class)?.identifier_composite {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether a root entity has an identifier derived from a foreign key.
///
/// # Errors
///
/// Returns `GraphQLError::NotFound` if a root entity is not mapped.
pub fn has_root_entity_with_foreign_key_identifier(
    shape: &QueryShape,
    registry: &dyn ClassMetadataRegistry,
) -> Result<bool> {
    for root in &shape.root_entities {
        if registry.class_metadata(&root.class)?.contains_foreign_identifier {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether the number of results is limited.
#[must_use]
pub fn has_max_results(shape: &QueryShape) -> bool {
    shape.max_results.is_some()
}

/// Whether the query is ordered by a column of a joined to-many association.
///
/// Such an ordering multiplies the rows of each root entity, which breaks
/// LIMIT-based pagination.
///
/// A [`QueryShape`] has no select list, so every joined to-many association
/// is treated as fetch-joined. Orderings on joins that are only filtered on
/// are reported too.
///
/// # Errors
///
/// Returns `GraphQLError::Logic` for joins on unknown aliases and
/// `GraphQLError::NotFound` for unmapped classes.
pub fn has_order_by_on_fetch_joined_to_many_association(
    shape: &QueryShape,
    registry: &dyn ClassMetadataRegistry,
) -> Result<bool> {
    if shape.joins.is_empty() || shape.order_by.is_empty() {
        return Ok(false);
    }

    let mut order_by_aliases: Vec<&str> = Vec::new();
    for expression in &shape.order_by {
        let Some((alias, _)) = expression
            .split_whitespace()
            .next()
            .and_then(|column| column.split_once('.'))
        else {
            continue;
        };
        if !shape.is_root_alias(alias) && !order_by_aliases.contains(&alias) {
            order_by_aliases.push(alias);
        }
    }

    for alias in order_by_aliases {
        for join in shape.joins.iter().filter(|join| join.alias == alias) {
            if let Some((parent_alias, association)) = join.relationship() {
                let metadata = class_for_alias(parent_alias, shape, registry)?;
                if metadata.is_collection_valued_association(association) {
                    trace!(alias, association, "Ordered by a joined to-many association");
                    return Ok(true);
                }
                continue;
            }

            for root in &shape.root_entities {
                let metadata = registry.class_metadata(&root.class)?;
                let to_many = metadata
                    .associations
                    .values()
                    .any(|a| a.collection_valued && a.target_class == join.join);
                if to_many {
                    trace!(alias, class = %join.join, "Ordered by a joined to-many class");
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}

/// Whether any join is a LEFT JOIN.
#[must_use]
pub fn has_left_join(shape: &QueryShape) -> bool {
    shape
        .joins
        .iter()
        .any(|join| join.kind == JoinKind::Left)
}

/// Whether a joined alias is reached through a to-many association.
///
/// # Errors
///
/// Returns `GraphQLError::Logic` for joins on unknown aliases and
/// `GraphQLError::NotFound` for unmapped classes.
pub fn has_joined_to_many_association(
    shape: &QueryShape,
    registry: &dyn ClassMetadataRegistry,
) -> Result<bool> {
    if shape.joins.is_empty() {
        return Ok(false);
    }

    for alias in shape.join_aliases().filter(|alias| !shape.is_root_alias(alias)) {
        for step in traverse_joins(alias, shape, registry)? {
            if let Some(association) = &step.association
                && step.metadata.is_collection_valued_association(association)
            {
                trace!(alias, association = %association, "Joined a to-many association");
                return Ok(true);
            }
        }
    }

    Ok(false)
}

enum AliasTarget<'a> {
    Class(&'a str),
    Relationship { parent: &'a str, association: &'a str },
}

/// Walks from `alias` up to the entity it ultimately joins from.
///
/// Steps are returned from the apex entity down to `alias`.
///
/// # Errors
///
/// Returns `GraphQLError::Logic` if an alias on the path is unknown or the
/// aliases form a cycle, and `GraphQLError::NotFound` for unmapped classes.
pub fn traverse_joins(
    alias: &str,
    shape: &QueryShape,
    registry: &dyn ClassMetadataRegistry,
) -> Result<Vec<JoinStep>> {
    let mut alias_map: IndexMap<&str, AliasTarget<'_>> = shape
        .root_entities
        .iter()
        .map(|root| (root.alias.as_str(), AliasTarget::Class(root.class.as_str())))
        .collect();
    for join in &shape.joins {
        let target = match join.relationship() {
            Some((parent, association)) => AliasTarget::Relationship { parent, association },
            None => AliasTarget::Class(join.join.as_str()),
        };
        alias_map.insert(join.alias.as_str(), target);
    }

    // Leaf first: aliases[i] is joined from aliases[i + 1] through associations[i].
    let mut aliases: Vec<&str> = Vec::new();
    let mut associations: Vec<&str> = Vec::new();
    let mut current = alias;
    let apex_class = loop {
        if aliases.len() > alias_map.len() {
            return Err(GraphQLError::Logic(format!(
                "Join aliases of \"{alias}\" form a cycle."
            )));
        }
        let target = alias_map
            .get(current)
            .ok_or_else(|| GraphQLError::Logic(format!("Unknown alias \"{current}\".")))?;
        aliases.push(current);
        match target {
            AliasTarget::Class(class) => break *class,
            AliasTarget::Relationship { parent, association } => {
                associations.push(*association);
                current = *parent;
            }
        }
    };

    let mut steps = Vec::with_capacity(aliases.len());
    let mut entity_class = apex_class.to_string();
    for (index, step_alias) in aliases.iter().enumerate().rev() {
        let metadata = registry.class_metadata(&entity_class)?;
        let association = index.checked_sub(1).map(|i| associations[i]);
        if let Some(association) = association {
            entity_class = metadata
                .association_target_class(association)
                .ok_or_else(|| {
                    GraphQLError::Logic(format!(
                        "Class \"{}\" has no association \"{association}\".",
                        metadata.class
                    ))
                })?
                .to_string();
        }
        steps.push(JoinStep {
            alias: (*step_alias).to_string(),
            metadata,
            association: association.map(str::to_string),
        });
    }
    Ok(steps)
}

/// Metadata of the entity selected under `alias`.
///
/// # Errors
///
/// Same as [`traverse_joins`].
pub fn class_for_alias(
    alias: &str,
    shape: &QueryShape,
    registry: &dyn ClassMetadataRegistry,
) -> Result<Arc<EntityMetadata>> {
    traverse_joins(alias, shape, registry)?
        .pop()
        .map(|step| step.metadata)
        .ok_or_else(|| GraphQLError::Logic(format!("Unknown alias \"{alias}\".")))
}
