//! Query shape validation.
//!
//! Pure predicates over an abstract description of a generated query, used to
//! decide whether the query can be paginated in the database as-is.

pub mod checker;
mod paginator;
mod shape;

pub use checker::{JoinStep, class_for_alias, traverse_joins};
pub use paginator::{PaginatorOptions, PaginatorStrategy};
pub use shape::{
    AssociationMetadata, ClassMetadataRegistry, EntityMetadata, InMemoryClassMetadata, Join,
    JoinKind, QueryShape, RootEntity,
};
