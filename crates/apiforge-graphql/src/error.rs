//! Error types for GraphQL operations.
//!
//! Type construction never retries: every failure here reflects either a
//! metadata/configuration bug or a data-contract breach by a collaborator and
//! is surfaced to the caller as-is.

use async_graphql::ErrorExtensions;

/// Errors that can occur while building or resolving the GraphQL schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphQLError {
    /// An internal invariant was violated (e.g. the registry holds a type of
    /// the wrong kind under a generated name). Indicates a construction bug.
    #[error("Logic error: {0}")]
    Logic(String),

    /// A collaborator returned data of an unexpected shape.
    #[error("Unexpected value: {0}")]
    UnexpectedValue(String),

    /// A class, resource or type could not be found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource metadata could not be loaded or parsed.
    #[error("Invalid resource metadata: {0}")]
    InvalidMetadata(String),

    /// Schema is still being built - client should retry.
    #[error("GraphQL schema is initializing, please retry")]
    SchemaInitializing,

    /// Schema build failed.
    #[error("Failed to build GraphQL schema: {0}")]
    SchemaBuildFailed(String),

    /// The data resolver failed to fetch or persist a resource.
    #[error("Resolver error: {0}")]
    Resolver(String),
}

impl GraphQLError {
    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Logic(_) => "LOGIC_ERROR",
            Self::UnexpectedValue(_) => "UNEXPECTED_VALUE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidMetadata(_) => "INVALID_METADATA",
            Self::SchemaInitializing => "SCHEMA_INITIALIZING",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::Resolver(_) => "RESOLVER_ERROR",
        }
    }

    /// Whether the error signals schema corruption rather than bad input.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Logic(_))
    }

    /// Returns the Retry-After header value in seconds, if applicable.
    #[must_use]
    pub fn retry_after(&self) -> Option<u32> {
        match self {
            Self::SchemaInitializing => Some(5),
            _ => None,
        }
    }

    /// Converts into an `async_graphql::Error` carrying the error code as an extension.
    #[must_use]
    pub fn into_graphql_error(self) -> async_graphql::Error {
        let code = self.error_code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| ext.set("code", code))
    }
}

impl From<toml::de::Error> for GraphQLError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

impl From<serde_json::Error> for GraphQLError {
    fn from(err: serde_json::Error) -> Self {
        Self::UnexpectedValue(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(GraphQLError::Logic("x".into()).error_code(), "LOGIC_ERROR");
        assert_eq!(
            GraphQLError::UnexpectedValue("x".into()).error_code(),
            "UNEXPECTED_VALUE"
        );
        assert_eq!(
            GraphQLError::SchemaInitializing.error_code(),
            "SCHEMA_INITIALIZING"
        );
    }

    #[test]
    fn test_only_logic_errors_are_fatal() {
        assert!(GraphQLError::Logic("bad kind".into()).is_fatal());
        assert!(!GraphQLError::UnexpectedValue("no hint".into()).is_fatal());
        assert!(!GraphQLError::NotFound("Dummy".into()).is_fatal());
    }

    #[test]
    fn test_retry_after() {
        assert_eq!(GraphQLError::SchemaInitializing.retry_after(), Some(5));
        assert_eq!(GraphQLError::Logic("test".into()).retry_after(), None);
    }

    #[test]
    fn test_display() {
        let err = GraphQLError::NotFound("Type \"Dummy\"".into());
        assert_eq!(err.to_string(), "Not found: Type \"Dummy\"");
    }

    #[test]
    fn test_into_graphql_error_keeps_message() {
        let err = GraphQLError::UnexpectedValue("boom".into()).into_graphql_error();
        assert_eq!(err.message, "Unexpected value: boom");
        assert!(err.extensions.is_some());
    }
}
