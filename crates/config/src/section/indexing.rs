//! Indexing configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;
use crate::policy::{Index, IndexStorage};

fn default_index() -> Index {
    Index::None
}

fn default_index_storage() -> IndexStorage {
    IndexStorage::Filesystem
}

/// Search index settings.
///
/// # Validation Rules
///
/// - indexing cannot be enabled on invalidation cache modes
/// - `path` must not be empty when set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexingConfiguration {
    /// Which entries are indexed. Default: none.
    #[serde(default = "default_index")]
    index: Index,
    /// Where the index lives. Default: filesystem.
    #[serde(default = "default_index_storage")]
    storage: IndexStorage,
    /// Directory for filesystem index storage, or `None` for the
    /// provider default. Default: none.
    #[serde(default)]
    path: Option<String>,
}

impl IndexingConfiguration {
    /// Which entries are indexed.
    #[must_use]
    pub const fn index(&self) -> Index {
        self.index
    }

    /// Where the index lives.
    #[must_use]
    pub const fn storage(&self) -> IndexStorage {
        self.storage
    }

    /// Directory for filesystem index storage.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl Default for IndexingConfiguration {
    fn default() -> Self {
        IndexingBuilder::default().create()
    }
}

/// Builder for [`IndexingConfiguration`].
#[derive(Debug, Clone)]
pub struct IndexingBuilder {
    index: Index,
    storage: IndexStorage,
    path: Option<String>,
}

impl Default for IndexingBuilder {
    fn default() -> Self {
        Self { index: default_index(), storage: default_index_storage(), path: None }
    }
}

impl IndexingBuilder {
    /// Sets which entries are indexed.
    pub fn index(&mut self, index: Index) -> &mut Self {
        self.index = index;
        self
    }

    /// Sets where the index lives.
    pub fn storage(&mut self, storage: IndexStorage) -> &mut Self {
        self.storage = storage;
        self
    }

    /// Sets the directory for filesystem index storage.
    pub fn path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = Some(path.into());
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &IndexingConfiguration) -> &mut Self {
        self.index = template.index;
        self.storage = template.storage;
        self.path = template.path.clone();
        self
    }
}

impl ChildBuilder for IndexingBuilder {
    type Configuration = IndexingConfiguration;

    fn section(&self) -> Section {
        Section::Indexing
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.index.is_enabled() && ctx.cache_mode.is_invalidation() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: format!(
                    "indexing cannot be enabled on invalidation cache modes, got {}",
                    ctx.cache_mode
                ),
            });
        }
        if self.path.as_deref() == Some("") {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "path must not be empty when set".to_string(),
            });
        }
        if self.path.is_some() && self.storage == IndexStorage::LocalHeap {
            warn!("path is ignored with local-heap index storage");
        }
        Ok(())
    }

    fn create(&self) -> IndexingConfiguration {
        IndexingConfiguration {
            index: self.index,
            storage: self.storage,
            path: self.path.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::policy::CacheMode;

    #[test]
    fn test_indexing_defaults_are_valid() {
        let builder = IndexingBuilder::default();
        builder.validate(&ValidationContext::default()).unwrap();
        let config = builder.create();
        assert_eq!(config.index(), Index::None);
        assert_eq!(config.storage(), IndexStorage::Filesystem);
        assert_eq!(config.path(), None);
        assert!(!config.index().is_enabled());
    }

    #[test]
    fn test_indexing_rejected_on_invalidation_modes() {
        for mode in [CacheMode::InvalidationSync, CacheMode::InvalidationAsync] {
            let mut builder = IndexingBuilder::default();
            builder.index(Index::All);
            let ctx = ValidationContext { cache_mode: mode, ..ValidationContext::default() };
            let err = builder.validate(&ctx).unwrap_err();
            assert_eq!(err.section(), Some(Section::Indexing));
            assert!(err.to_string().contains("invalidation"), "mode {mode}");
        }
    }

    #[test]
    fn test_disabled_indexing_allowed_on_invalidation_modes() {
        let builder = IndexingBuilder::default();
        let ctx = ValidationContext {
            cache_mode: CacheMode::InvalidationSync,
            ..ValidationContext::default()
        };
        builder.validate(&ctx).unwrap();
    }

    #[test]
    fn test_empty_path_rejected() {
        let mut builder = IndexingBuilder::default();
        builder.index(Index::Local).path("");
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_filesystem_storage_with_path() {
        let mut builder = IndexingBuilder::default();
        builder
            .index(Index::Local)
            .storage(IndexStorage::Filesystem)
            .path("/var/lib/gridstore/index");
        builder.validate(&ValidationContext::default()).unwrap();
        let config = builder.create();
        assert_eq!(config.path(), Some("/var/lib/gridstore/index"));
        assert!(config.storage().is_persistent());
    }

    #[test]
    fn test_local_heap_storage_with_path_is_valid() {
        let mut builder = IndexingBuilder::default();
        builder.index(Index::All).storage(IndexStorage::LocalHeap).path("/ignored");
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_create_twice_yields_equal_independent_records() {
        let mut builder = IndexingBuilder::default();
        builder.index(Index::PrimaryOwner).path("/a");
        let first = builder.create();
        let second = builder.create();
        assert_eq!(first, second);

        builder.path("/b");
        assert_eq!(first.path(), Some("/a"));
        assert_ne!(builder.create(), first);
    }

    #[test]
    fn test_read_round_trip() {
        let mut builder = IndexingBuilder::default();
        builder.index(Index::Local).storage(IndexStorage::LocalHeap);
        let original = builder.create();

        let mut copy = IndexingBuilder::default();
        copy.read(&original);
        assert_eq!(copy.create(), original);
    }

    #[test]
    fn test_serde_tokens() {
        let config: IndexingConfiguration =
            serde_json::from_str(r#"{"index":"local","storage":"local-heap"}"#).unwrap();
        assert_eq!(config.index(), Index::Local);
        assert_eq!(config.storage(), IndexStorage::LocalHeap);

        let defaults: IndexingConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, IndexingConfiguration::default());
    }
}
