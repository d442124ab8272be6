//! Association inference configuration.

use autorel_core::{ConfigError, Error, Result, TableIdentity};
use serde::{Deserialize, Serialize};

/// Configuration for association discovery.
///
/// ```
/// use autorel_infer::AssociationConfig;
///
/// let config = AssociationConfig::new()
///     .external_cache_prefix("blog-")
///     .use_external_cache(false);
/// assert!(config.load_associations);
/// assert_eq!(config.external_cache_prefix, "blog-");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    /// Attach inference to tables; when off, records get an empty graph
    pub load_associations: bool,
    /// Leading part of external cache keys
    pub external_cache_prefix: String,
    /// Trailing part of external cache keys
    pub external_cache_suffix: String,
    /// Consult the external cache when one is wired in
    pub use_external_cache: bool,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            load_associations: true,
            external_cache_prefix: "autorel-identifier-".to_string(),
            external_cache_suffix: ".associations".to_string(),
            use_external_cache: true,
        }
    }
}

impl AssociationConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::Config(ConfigError {
                message: format!("invalid association config: {e}"),
                source: Some(Box::new(e)),
            })
        })
    }

    /// Enable or disable association loading.
    pub fn load_associations(mut self, enabled: bool) -> Self {
        self.load_associations = enabled;
        self
    }

    /// Set the external cache key prefix.
    pub fn external_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.external_cache_prefix = prefix.into();
        self
    }

    /// Set the external cache key suffix.
    pub fn external_cache_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.external_cache_suffix = suffix.into();
        self
    }

    /// Enable or disable the external cache.
    pub fn use_external_cache(mut self, enabled: bool) -> Self {
        self.use_external_cache = enabled;
        self
    }

    /// External cache key for a source table's graph.
    pub fn external_cache_key(&self, identity: &TableIdentity) -> String {
        format!(
            "{}{}{}",
            self.external_cache_prefix, identity, self.external_cache_suffix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_cache_key() {
        let config = AssociationConfig::default();
        let key = config.external_cache_key(&TableIdentity::new("blog", "posts"));
        assert_eq!(key, "autorel-identifier-blog.posts.associations");
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = AssociationConfig::from_json(r#"{"load_associations": false}"#).unwrap();
        assert!(!config.load_associations);
        assert!(config.use_external_cache);
        assert_eq!(config.external_cache_suffix, ".associations");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = AssociationConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
