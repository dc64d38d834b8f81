//! The root configuration record and its builder.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;
use crate::section::{
    ClusteringBuilder, ClusteringConfiguration, DeadlockDetectionBuilder,
    DeadlockDetectionConfiguration, EvictionBuilder, EvictionConfiguration, ExpirationBuilder,
    ExpirationConfiguration, IndexingBuilder, IndexingConfiguration, InvocationBatchingBuilder,
    InvocationBatchingConfiguration, JmxStatisticsBuilder, JmxStatisticsConfiguration,
    LockingBuilder, LockingConfiguration, PersistenceBuilder, PersistenceConfiguration,
    StoreAsBinaryBuilder, StoreAsBinaryConfiguration, TransactionBuilder,
    TransactionConfiguration, UnsafeBuilder, UnsafeConfiguration, VersioningBuilder,
    VersioningConfiguration,
};

/// A complete, immutable cache configuration.
///
/// Values of this type are produced by [`ConfigurationBuilder::build`]
/// and never change afterwards. They are cheap to clone, compare by
/// value, and can be shared across threads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Configuration {
    /// Topology settings.
    #[serde(default)]
    clustering: ClusteringConfiguration,
    /// Lock settings.
    #[serde(default)]
    locking: LockingConfiguration,
    /// Deadlock detection settings.
    #[serde(default)]
    deadlock_detection: DeadlockDetectionConfiguration,
    /// Transaction settings.
    #[serde(default)]
    transaction: TransactionConfiguration,
    /// Invocation batching settings.
    #[serde(default)]
    invocation_batching: InvocationBatchingConfiguration,
    /// Entry-count bound.
    #[serde(default)]
    eviction: EvictionConfiguration,
    /// Entry lifetime bounds.
    #[serde(default)]
    expiration: ExpirationConfiguration,
    /// Search index settings.
    #[serde(default)]
    indexing: IndexingConfiguration,
    /// Store chain settings.
    #[serde(default)]
    persistence: PersistenceConfiguration,
    /// Binary storage settings.
    #[serde(default)]
    store_as_binary: StoreAsBinaryConfiguration,
    /// Statistics settings.
    #[serde(default)]
    jmx_statistics: JmxStatisticsConfiguration,
    /// Unsafe behavior flags.
    #[serde(default)]
    unsafe_values: UnsafeConfiguration,
    /// Entry versioning settings.
    #[serde(default)]
    versioning: VersioningConfiguration,
}

impl Configuration {
    /// Topology settings.
    #[must_use]
    pub const fn clustering(&self) -> &ClusteringConfiguration {
        &self.clustering
    }

    /// Lock settings.
    #[must_use]
    pub const fn locking(&self) -> &LockingConfiguration {
        &self.locking
    }

    /// Deadlock detection settings.
    #[must_use]
    pub const fn deadlock_detection(&self) -> &DeadlockDetectionConfiguration {
        &self.deadlock_detection
    }

    /// Transaction settings.
    #[must_use]
    pub const fn transaction(&self) -> &TransactionConfiguration {
        &self.transaction
    }

    /// Invocation batching settings.
    #[must_use]
    pub const fn invocation_batching(&self) -> &InvocationBatchingConfiguration {
        &self.invocation_batching
    }

    /// Entry-count bound.
    #[must_use]
    pub const fn eviction(&self) -> &EvictionConfiguration {
        &self.eviction
    }

    /// Entry lifetime bounds.
    #[must_use]
    pub const fn expiration(&self) -> &ExpirationConfiguration {
        &self.expiration
    }

    /// Search index settings.
    #[must_use]
    pub const fn indexing(&self) -> &IndexingConfiguration {
        &self.indexing
    }

    /// Store chain settings.
    #[must_use]
    pub const fn persistence(&self) -> &PersistenceConfiguration {
        &self.persistence
    }

    /// Binary storage settings.
    #[must_use]
    pub const fn store_as_binary(&self) -> &StoreAsBinaryConfiguration {
        &self.store_as_binary
    }

    /// Statistics settings.
    #[must_use]
    pub const fn jmx_statistics(&self) -> &JmxStatisticsConfiguration {
        &self.jmx_statistics
    }

    /// Unsafe behavior flags.
    #[must_use]
    pub const fn unsafe_values(&self) -> &UnsafeConfiguration {
        &self.unsafe_values
    }

    /// Entry versioning settings.
    #[must_use]
    pub const fn versioning(&self) -> &VersioningConfiguration {
        &self.versioning
    }

    /// Rechecks the cross-section invariants that every assembled
    /// aggregate must satisfy. An error here means the validate and
    /// create phases disagreed about some section.
    fn verify_invariants(&self) -> Result<(), ConfigurationError> {
        if self.clustering.l1().enabled() && !self.clustering.cache_mode().is_distributed() {
            return Err(ConfigurationError::InvariantViolation {
                section: Section::L1,
                message: format!(
                    "l1 is enabled with non-distributed cache mode {}",
                    self.clustering.cache_mode()
                ),
            });
        }
        if self.transaction.recovery().enabled()
            && !self.transaction.transaction_mode().is_transactional()
        {
            return Err(ConfigurationError::InvariantViolation {
                section: Section::Recovery,
                message: "recovery is enabled on a non-transactional cache".to_string(),
            });
        }
        if self.versioning.enabled() && !self.versioning.scheme().is_enabled() {
            return Err(ConfigurationError::InvariantViolation {
                section: Section::Versioning,
                message: "versioning is enabled without a generating scheme".to_string(),
            });
        }
        Ok(())
    }
}

/// Assembles a [`Configuration`] from mutable per-section builders.
///
/// Sections are reached through accessor methods and configured with
/// fluent setters. Nothing is checked until [`validate`] or [`build`]
/// runs, so sections can be filled in any order and revisited freely.
///
/// [`validate`]: ConfigurationBuilder::validate
/// [`build`]: ConfigurationBuilder::build
///
/// # Example
///
/// ```
/// use gridstore_config::{CacheMode, ConfigurationBuilder, EvictionStrategy};
///
/// let mut builder = ConfigurationBuilder::new();
/// builder.clustering().cache_mode(CacheMode::DistSync);
/// builder.clustering().hash().num_owners(3);
/// builder.eviction().strategy(EvictionStrategy::Remove).max_entries(10_000);
///
/// let config = builder.build()?;
/// assert_eq!(config.clustering().cache_mode(), CacheMode::DistSync);
/// assert_eq!(config.eviction().max_entries(), Some(10_000));
/// # Ok::<(), gridstore_config::ConfigurationError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    clustering: ClusteringBuilder,
    locking: LockingBuilder,
    deadlock_detection: DeadlockDetectionBuilder,
    transaction: TransactionBuilder,
    invocation_batching: InvocationBatchingBuilder,
    eviction: EvictionBuilder,
    expiration: ExpirationBuilder,
    indexing: IndexingBuilder,
    persistence: PersistenceBuilder,
    store_as_binary: StoreAsBinaryBuilder,
    jmx_statistics: JmxStatisticsBuilder,
    unsafe_values: UnsafeBuilder,
    versioning: VersioningBuilder,
}

impl ConfigurationBuilder {
    /// Creates a builder with every section at its defaults. The
    /// defaults describe a valid local cache, so an untouched builder
    /// always builds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Topology section.
    pub fn clustering(&mut self) -> &mut ClusteringBuilder {
        &mut self.clustering
    }

    /// Locking section.
    pub fn locking(&mut self) -> &mut LockingBuilder {
        &mut self.locking
    }

    /// Deadlock detection section.
    pub fn deadlock_detection(&mut self) -> &mut DeadlockDetectionBuilder {
        &mut self.deadlock_detection
    }

    /// Transaction section.
    pub fn transaction(&mut self) -> &mut TransactionBuilder {
        &mut self.transaction
    }

    /// Invocation batching section.
    pub fn invocation_batching(&mut self) -> &mut InvocationBatchingBuilder {
        &mut self.invocation_batching
    }

    /// Eviction section.
    pub fn eviction(&mut self) -> &mut EvictionBuilder {
        &mut self.eviction
    }

    /// Expiration section.
    pub fn expiration(&mut self) -> &mut ExpirationBuilder {
        &mut self.expiration
    }

    /// Indexing section.
    pub fn indexing(&mut self) -> &mut IndexingBuilder {
        &mut self.indexing
    }

    /// Persistence section.
    pub fn persistence(&mut self) -> &mut PersistenceBuilder {
        &mut self.persistence
    }

    /// Binary storage section.
    pub fn store_as_binary(&mut self) -> &mut StoreAsBinaryBuilder {
        &mut self.store_as_binary
    }

    /// Statistics section.
    pub fn jmx_statistics(&mut self) -> &mut JmxStatisticsBuilder {
        &mut self.jmx_statistics
    }

    /// Unsafe behavior section.
    pub fn unsafe_values(&mut self) -> &mut UnsafeBuilder {
        &mut self.unsafe_values
    }

    /// Versioning section.
    pub fn versioning(&mut self) -> &mut VersioningBuilder {
        &mut self.versioning
    }

    /// Snapshot of the sibling state each section may consult during
    /// validation.
    fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            cache_mode: self.clustering.cache_mode,
            transaction_mode: self.transaction.transaction_mode,
            locking_mode: self.transaction.locking_mode,
            versioning_enabled: self.versioning.enabled,
            versioning_scheme: self.versioning.scheme,
            eviction_enabled: self.eviction.strategy.is_enabled(),
        }
    }

    /// Validates every section in declaration order and stops at the
    /// first failure.
    ///
    /// The order is fixed, so a builder with several invalid sections
    /// always reports the same error. Settings that are merely
    /// ineffective under the current topology are logged as warnings
    /// instead of failing.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError::Validation`] produced by
    /// a section.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let ctx = self.validation_context();
        self.clustering.validate(&ctx)?;
        self.locking.validate(&ctx)?;
        self.deadlock_detection.validate(&ctx)?;
        self.transaction.validate(&ctx)?;
        self.invocation_batching.validate(&ctx)?;
        self.eviction.validate(&ctx)?;
        self.expiration.validate(&ctx)?;
        self.indexing.validate(&ctx)?;
        self.persistence.validate(&ctx)?;
        self.store_as_binary.validate(&ctx)?;
        self.jmx_statistics.validate(&ctx)?;
        self.unsafe_values.validate(&ctx)?;
        self.versioning.validate(&ctx)?;
        Ok(())
    }

    /// Validates every section, then creates every section record and
    /// assembles the aggregate.
    ///
    /// No record is created until the whole tree has validated, so a
    /// failed build has no partial output. The builder is untouched and
    /// can be adjusted and built again; repeated builds of an unchanged
    /// builder produce equal records.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Validation`] when a section fails
    /// validation, or [`ConfigurationError::InvariantViolation`] when
    /// the final cross-section recheck fails on the assembled aggregate.
    pub fn build(&self) -> Result<Configuration, ConfigurationError> {
        self.validate()?;
        let config = Configuration {
            clustering: self.clustering.create(),
            locking: self.locking.create(),
            deadlock_detection: self.deadlock_detection.create(),
            transaction: self.transaction.create(),
            invocation_batching: self.invocation_batching.create(),
            eviction: self.eviction.create(),
            expiration: self.expiration.create(),
            indexing: self.indexing.create(),
            persistence: self.persistence.create(),
            store_as_binary: self.store_as_binary.create(),
            jmx_statistics: self.jmx_statistics.create(),
            unsafe_values: self.unsafe_values.create(),
            versioning: self.versioning.create(),
        };
        config.verify_invariants()?;
        debug!(
            cache_mode = %config.clustering.cache_mode(),
            transaction_mode = %config.transaction.transaction_mode(),
            stores = config.persistence.stores().len(),
            "cache configuration assembled"
        );
        Ok(config)
    }

    /// Resets every section from a built configuration, turning it into
    /// a template for further changes.
    pub fn read(&mut self, template: &Configuration) -> &mut Self {
        self.clustering.read(&template.clustering);
        self.locking.read(&template.locking);
        self.deadlock_detection.read(&template.deadlock_detection);
        self.transaction.read(&template.transaction);
        self.invocation_batching.read(&template.invocation_batching);
        self.eviction.read(&template.eviction);
        self.expiration.read(&template.expiration);
        self.indexing.read(&template.indexing);
        self.persistence.read(&template.persistence);
        self.store_as_binary.read(&template.store_as_binary);
        self.jmx_statistics.read(&template.jmx_statistics);
        self.unsafe_values.read(&template.unsafe_values);
        self.versioning.read(&template.versioning);
        self
    }
}
