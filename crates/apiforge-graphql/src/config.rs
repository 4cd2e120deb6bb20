//! GraphQL configuration.
//!
//! Configuration can be specified in the application TOML file under the
//! `[graphql]` section.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! enabled = true
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! default_pagination_type = "cursor"
//! items_per_page = 30
//! iri_prefix = "/api"
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::{PaginationType, SchemaBuilderConfig};

/// GraphQL API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Enable GraphQL API endpoints.
    /// Default: false (opt-in feature)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Pagination style used when a resource does not declare one.
    /// Default: cursor
    #[serde(default)]
    pub default_pagination_type: PaginationType,

    /// Page size for collection queries.
    /// Default: 30
    #[serde(default = "default_items_per_page")]
    pub items_per_page: u64,

    /// Prefix prepended to generated resource IRIs.
    /// Default: "" (IRIs start at `/{route}`)
    #[serde(default)]
    pub iri_prefix: String,
}

fn default_enabled() -> bool {
    false
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_items_per_page() -> u64 {
    30
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            default_pagination_type: PaginationType::default(),
            items_per_page: default_items_per_page(),
            iri_prefix: String::new(),
        }
    }
}

impl GraphQLConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        if self.items_per_page == 0 {
            return Err("graphql.items_per_page must be > 0".into());
        }
        if !self.iri_prefix.is_empty() && !self.iri_prefix.starts_with('/') {
            return Err("graphql.iri_prefix must start with '/'".into());
        }
        Ok(())
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> SchemaBuilderConfig {
        SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
            default_pagination_type: self.default_pagination_type,
            items_per_page: self.items_per_page,
            iri_prefix: self.iri_prefix.trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphQLConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection);
        assert_eq!(config.default_pagination_type, PaginationType::Cursor);
        assert_eq!(config.items_per_page, 30);
        assert!(config.iri_prefix.is_empty());
    }

    #[test]
    fn test_valid_config() {
        assert!(GraphQLConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_max_depth() {
        let mut config = GraphQLConfig::default();
        config.max_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_items_per_page() {
        let mut config = GraphQLConfig::default();
        config.items_per_page = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_iri_prefix() {
        let mut config = GraphQLConfig::default();
        config.iri_prefix = "api".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            enabled = true
            max_depth = 20
            introspection = false
            default_pagination_type = "page"
            iri_prefix = "/api/"
        "#;

        let config: GraphQLConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_complexity, 500);
        assert!(!config.introspection);
        assert_eq!(config.default_pagination_type, PaginationType::Page);

        let builder_config = config.to_schema_builder_config();
        assert_eq!(builder_config.iri_prefix, "/api");
        assert_eq!(builder_config.default_pagination_type, PaginationType::Page);
    }
}
