//! Paginator strategy.
//!
//! Decides how a paginated query must be executed by the ORM paginator:
//! whether it has to fetch-join collections (count distinct roots instead of
//! rows) and whether it needs output walkers (a wrapping subquery).

use std::sync::Arc;

use tracing::debug;

use super::checker;
use super::shape::{ClassMetadataRegistry, QueryShape};
use crate::Result;

/// Paginator options derived from a query shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorOptions {
    pub fetch_join_collection: bool,
    pub use_output_walkers: bool,
}

/// Derives paginator options from query shapes.
///
/// Explicit overrides, when set, win over the shape heuristics.
#[derive(Clone)]
pub struct PaginatorStrategy {
    registry: Arc<dyn ClassMetadataRegistry>,
    fetch_join_collection: Option<bool>,
    use_output_walkers: Option<bool>,
}

impl PaginatorStrategy {
    pub fn new(registry: Arc<dyn ClassMetadataRegistry>) -> Self {
        Self {
            registry,
            fetch_join_collection: None,
            use_output_walkers: None,
        }
    }

    #[must_use]
    pub fn with_fetch_join_collection(mut self, enabled: bool) -> Self {
        self.fetch_join_collection = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_output_walkers(mut self, enabled: bool) -> Self {
        self.use_output_walkers = Some(enabled);
        self
    }

    /// Whether the paginator must treat joined collections as part of the root.
    ///
    /// Composite root identifiers cannot be counted distinctly, so they never
    /// fetch-join; otherwise a joined to-many association requires it.
    ///
    /// # Errors
    ///
    /// Propagates metadata and alias resolution errors.
    pub fn fetch_join_collection(&self, shape: &QueryShape) -> Result<bool> {
        if let Some(enabled) = self.fetch_join_collection {
            return Ok(enabled);
        }
        let registry = self.registry.as_ref();
        if checker::has_root_entity_with_composite_identifier(shape, registry)? {
            return Ok(false);
        }
        checker::has_joined_to_many_association(shape, registry)
    }

    /// Whether the paginator must wrap the query in a subquery.
    ///
    /// # Errors
    ///
    /// Propagates metadata and alias resolution errors.
    pub fn use_output_walkers(&self, shape: &QueryShape) -> Result<bool> {
        if let Some(enabled) = self.use_output_walkers {
            return Ok(enabled);
        }
        let registry = self.registry.as_ref();
        Ok(checker::has_having_clause(shape)
            || checker::has_root_entity_with_composite_identifier(shape, registry)?
            || checker::has_root_entity_with_foreign_key_identifier(shape, registry)?
            || (checker::has_max_results(shape)
                && checker::has_order_by_on_fetch_joined_to_many_association(shape, registry)?))
    }

    /// Both options at once.
    ///
    /// # Errors
    ///
    /// Propagates metadata and alias resolution errors.
    pub fn options(&self, shape: &QueryShape) -> Result<PaginatorOptions> {
        let options = PaginatorOptions {
            fetch_join_collection: self.fetch_join_collection(shape)?,
            use_output_walkers: self.use_output_walkers(shape)?,
        };
        debug!(
            fetch_join_collection = options.fetch_join_collection,
            use_output_walkers = options.use_output_walkers,
            joins = shape.joins.len(),
            "Resolved paginator options"
        );
        Ok(options)
    }
}

impl std::fmt::Debug for PaginatorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatorStrategy")
            .field("fetch_join_collection", &self.fetch_join_collection)
            .field("use_output_walkers", &self.use_output_walkers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::shape::{EntityMetadata, InMemoryClassMetadata};

    fn strategy() -> PaginatorStrategy {
        let mut composite = EntityMetadata::new("app::Composite");
        composite.identifier_composite = true;
        composite = composite.to_many("items", "app::Related");
        let mut foreign = EntityMetadata::new("app::Foreign");
        foreign.contains_foreign_identifier = true;

        PaginatorStrategy::new(Arc::new(InMemoryClassMetadata::from_entities([
            EntityMetadata::new("app::Dummy").to_many("related", "app::Related"),
            EntityMetadata::new("app::Related"),
            composite,
            foreign,
        ])))
    }

    #[test]
    fn test_plain_query() {
        let options = strategy().options(&QueryShape::new("o", "app::Dummy")).unwrap();
        assert_eq!(
            options,
            PaginatorOptions {
                fetch_join_collection: false,
                use_output_walkers: false,
            }
        );
    }

    #[test]
    fn test_joined_collection() {
        let shape = QueryShape::new("o", "app::Dummy").left_join("o.related", "r");
        let strategy = strategy();
        assert!(strategy.fetch_join_collection(&shape).unwrap());
        assert!(!strategy.use_output_walkers(&shape).unwrap());

        let ordered = shape.order_by("r.name").max_results(30);
        assert!(strategy.use_output_walkers(&ordered).unwrap());
    }

    #[test]
    fn test_composite_identifier() {
        let shape = QueryShape::new("o", "app::Composite").left_join("o.items", "i");
        let strategy = strategy();
        assert!(!strategy.fetch_join_collection(&shape).unwrap());
        assert!(strategy.use_output_walkers(&shape).unwrap());
    }

    #[test]
    fn test_foreign_identifier_and_having() {
        let strategy = strategy();
        assert!(strategy
            .use_output_walkers(&QueryShape::new("o", "app::Foreign"))
            .unwrap());
        assert!(strategy
            .use_output_walkers(&QueryShape::new("o", "app::Dummy").having("COUNT(o) > 1"))
            .unwrap());
    }

    #[test]
    fn test_overrides() {
        let shape = QueryShape::new("o", "app::Dummy").left_join("o.related", "r");
        let strategy = strategy()
            .with_fetch_join_collection(false)
            .with_output_walkers(true);
        assert!(!strategy.fetch_join_collection(&shape).unwrap());
        assert!(strategy.use_output_walkers(&shape).unwrap());
    }
}
