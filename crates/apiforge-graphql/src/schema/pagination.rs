//! Pagination style selection.
//!
//! The type builder asks a [`Pagination`] collaborator which connection shape
//! a collection uses: Relay cursors (edges + page info) or numbered pages
//! (collection + pagination info).

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::metadata::DynMetadataFactory;

/// Shape of a paginated collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationType {
    /// `edges`, `pageInfo` and `totalCount`.
    #[default]
    Cursor,
    /// `collection` and `paginationInfo`.
    Page,
}

/// Decides the pagination style of a collection operation.
pub trait Pagination: Send + Sync {
    /// Returns the pagination style of `operation_name` on `resource_class`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is unknown.
    fn graphql_pagination_type(
        &self,
        resource_class: &str,
        operation_name: &str,
    ) -> Result<PaginationType>;
}

/// Reads the pagination style from resource metadata.
///
/// Looks at the operation's `pagination_type`, then the resource's, then the
/// configured default.
pub struct MetadataPagination {
    metadata: DynMetadataFactory,
    default: PaginationType,
}

impl MetadataPagination {
    pub fn new(metadata: DynMetadataFactory, default: PaginationType) -> Self {
        Self { metadata, default }
    }
}

impl Pagination for MetadataPagination {
    fn graphql_pagination_type(
        &self,
        resource_class: &str,
        operation_name: &str,
    ) -> Result<PaginationType> {
        // Output DTOs are not resources; they paginate with the default style.
        if !self.metadata.is_resource_class(resource_class) {
            return Ok(self.default);
        }
        Ok(self
            .metadata
            .create(resource_class)?
            .pagination_type(Some(operation_name))
            .unwrap_or(self.default))
    }
}
