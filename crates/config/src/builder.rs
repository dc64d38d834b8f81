//! The child-builder contract and the cross-section validation context.
//!
//! Every configuration section, nested sections included, is assembled by a
//! builder implementing [`ChildBuilder`]. The root
//! [`ConfigurationBuilder`](crate::ConfigurationBuilder) owns one of each,
//! hands out `&mut` borrows for fluent mutation, and drives the two-phase
//! build: every builder is validated in declaration order, and only when all
//! of them pass is any record created. A builder whose settings depend on a
//! sibling section reads the relevant fact from [`ValidationContext`], a
//! snapshot the root takes before the validation pass; builders never reach
//! into each other directly.

use std::fmt;

use crate::error::ConfigurationError;
use crate::policy::{CacheMode, LockingMode, TransactionMode, VersioningScheme};

/// Identity of a section builder, carried by validation errors so a failure
/// names the section that rejected its settings.
///
/// Declaration order is the order the root builder validates and creates
/// sections in (nested sections directly after their owner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Topology and replication timing.
    Clustering,
    /// Key ownership layout, nested in clustering.
    Hash,
    /// Near-cache for remotely owned entries, nested in clustering.
    L1,
    /// State transfer to joining nodes, nested in clustering.
    StateTransfer,
    /// Split-brain policy, nested in clustering.
    PartitionHandling,
    /// Lock isolation and striping.
    Locking,
    /// Deadlock detection spin loop.
    DeadlockDetection,
    /// Transaction enlistment and completion.
    Transaction,
    /// Transaction recovery, nested in transaction.
    Recovery,
    /// Operation batching.
    InvocationBatching,
    /// Container bound enforcement.
    Eviction,
    /// Entry lifespan and idle expiry.
    Expiration,
    /// Index mode and placement.
    Indexing,
    /// Cache stores.
    Persistence,
    /// A single cache store, nested in persistence.
    Store,
    /// Write-behind queueing, nested in a store.
    AsyncStore,
    /// Coordinator-only store access, nested in a store.
    SingletonStore,
    /// Binary storage of keys and values.
    StoreAsBinary,
    /// JMX statistics exposure.
    JmxStatistics,
    /// Relaxed API guarantees.
    UnsafeValues,
    /// Entry version metadata.
    Versioning,
}

impl Section {
    /// Returns the section's name as used in configuration sources and
    /// error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Section::Clustering => "clustering",
            Section::Hash => "hash",
            Section::L1 => "l1",
            Section::StateTransfer => "state-transfer",
            Section::PartitionHandling => "partition-handling",
            Section::Locking => "locking",
            Section::DeadlockDetection => "deadlock-detection",
            Section::Transaction => "transaction",
            Section::Recovery => "recovery",
            Section::InvocationBatching => "invocation-batching",
            Section::Eviction => "eviction",
            Section::Expiration => "expiration",
            Section::Indexing => "indexing",
            Section::Persistence => "persistence",
            Section::Store => "store",
            Section::AsyncStore => "async-store",
            Section::SingletonStore => "singleton-store",
            Section::StoreAsBinary => "store-as-binary",
            Section::JmxStatistics => "jmx-statistics",
            Section::UnsafeValues => "unsafe",
            Section::Versioning => "versioning",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cross-section facts a builder may consult during validation.
///
/// The root builder snapshots these from its children immediately before
/// the validation pass, so every builder sees the same consistent view no
/// matter where it sits in the validation order. Each field lists the rules
/// that read it; a new cross-section rule means a new (or existing) field
/// here, never a direct reach into a sibling builder.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    /// Read by l1 (distributed only), hash (owner-count warning),
    /// state-transfer and partition-handling (clustered only), indexing
    /// (not invalidation), singleton store (clustered only), and unsafe
    /// (distributed warning).
    pub cache_mode: CacheMode,
    /// Read by recovery, invocation-batching, and exception eviction
    /// (all require a transactional cache).
    pub transaction_mode: TransactionMode,
    /// Read by the write-skew rule (versioning is only required under
    /// optimistic locking).
    pub locking_mode: LockingMode,
    /// Read by the write-skew rule on clustered caches.
    pub versioning_enabled: bool,
    /// Read by the write-skew rule on clustered caches.
    pub versioning_scheme: VersioningScheme,
    /// Read by persistence to warn when passivation has no eviction to
    /// trigger it.
    pub eviction_enabled: bool,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            cache_mode: CacheMode::Local,
            transaction_mode: TransactionMode::NonTransactional,
            locking_mode: LockingMode::Optimistic,
            versioning_enabled: false,
            versioning_scheme: VersioningScheme::None,
            eviction_enabled: false,
        }
    }
}

/// Contract implemented by every section builder.
///
/// Fluent setters on the concrete builders store values without checking
/// them, so interdependent fields can be set in any order. The root builder
/// then runs the two phases:
///
/// 1. [`validate`](ChildBuilder::validate) on every builder, in declaration
///    order, aborting on the first failure. Validation reads the builder's
///    accumulated settings and the shared [`ValidationContext`]; it mutates
///    nothing.
/// 2. [`create`](ChildBuilder::create) on every builder, same order, only
///    reached when every validation passed. `create` deterministically
///    produces the section's immutable record; calling it twice yields
///    structurally equal records sharing no mutable state, and later
///    builder mutation never affects records already produced.
///
/// Builders owning nested sections validate and create their children as
/// part of their own `validate`/`create`.
pub trait ChildBuilder {
    /// Immutable record this builder produces.
    type Configuration;

    /// Identity used in error attribution.
    fn section(&self) -> Section;

    /// Checks the accumulated settings against this section's rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Validation`] naming this section (or a
    /// nested one) when a rule is violated.
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError>;

    /// Produces the section's record from the current settings.
    ///
    /// Must only be called after [`validate`](ChildBuilder::validate) has
    /// passed; the root builder's build enforces this ordering.
    fn create(&self) -> Self::Configuration;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Scripted builder that records every contract call it receives.
    struct CountingBuilder {
        name: &'static str,
        valid: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl CountingBuilder {
        fn new(name: &'static str, valid: bool, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Self { name, valid, log: Rc::clone(log) }
        }

        fn calls(&self, prefix: &str) -> usize {
            let needle = format!("{prefix}:{}", self.name);
            self.log.borrow().iter().filter(|entry| **entry == needle).count()
        }
    }

    impl ChildBuilder for CountingBuilder {
        type Configuration = &'static str;

        fn section(&self) -> Section {
            Section::Clustering
        }

        fn validate(&self, _ctx: &ValidationContext) -> Result<(), ConfigurationError> {
            self.log.borrow_mut().push(format!("validate:{}", self.name));
            if self.valid {
                Ok(())
            } else {
                Err(ConfigurationError::Validation {
                    section: self.section(),
                    message: format!("{} rejects its settings", self.name),
                })
            }
        }

        fn create(&self) -> Self::Configuration {
            self.log.borrow_mut().push(format!("create:{}", self.name));
            self.name
        }
    }

    /// The two-phase sequence the root builder applies to its children.
    fn build_all(
        children: &[&dyn ChildBuilder<Configuration = &'static str>],
        ctx: &ValidationContext,
    ) -> Result<Vec<&'static str>, ConfigurationError> {
        for child in children {
            child.validate(ctx)?;
        }
        Ok(children.iter().map(|child| child.create()).collect())
    }

    #[test]
    fn test_all_valid_children_validate_then_create_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = CountingBuilder::new("a", true, &log);
        let b = CountingBuilder::new("b", true, &log);
        let c = CountingBuilder::new("c", true, &log);

        let records = build_all(&[&a, &b, &c], &ValidationContext::default()).unwrap();

        assert_eq!(records, vec!["a", "b", "c"]);
        assert_eq!(
            *log.borrow(),
            vec!["validate:a", "validate:b", "validate:c", "create:a", "create:b", "create:c"]
        );
    }

    #[test]
    fn test_invalid_child_aborts_before_any_create() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = CountingBuilder::new("a", true, &log);
        let b = CountingBuilder::new("b", false, &log);
        let c = CountingBuilder::new("c", true, &log);

        let err = build_all(&[&a, &b, &c], &ValidationContext::default()).unwrap_err();

        assert!(err.to_string().contains("b rejects its settings"));
        assert_eq!(a.calls("create"), 0);
        assert_eq!(b.calls("create"), 0);
        assert_eq!(c.calls("create"), 0);
        // Fail-fast: the failing builder is the last one consulted.
        assert_eq!(a.calls("validate"), 1);
        assert_eq!(b.calls("validate"), 1);
        assert_eq!(c.calls("validate"), 0);
    }

    #[test]
    fn test_first_of_several_failures_is_surfaced() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = CountingBuilder::new("a", false, &log);
        let b = CountingBuilder::new("b", false, &log);

        let err = build_all(&[&a, &b], &ValidationContext::default()).unwrap_err();
        assert!(err.to_string().contains("a rejects its settings"));
    }

    #[test]
    fn test_section_names() {
        assert_eq!(Section::SingletonStore.as_str(), "singleton-store");
        assert_eq!(Section::L1.to_string(), "l1");
        assert_eq!(Section::UnsafeValues.as_str(), "unsafe");
        assert_eq!(Section::JmxStatistics.as_str(), "jmx-statistics");
    }

    #[test]
    fn test_default_context_matches_default_tree() {
        let ctx = ValidationContext::default();
        assert_eq!(ctx.cache_mode, CacheMode::Local);
        assert_eq!(ctx.transaction_mode, TransactionMode::NonTransactional);
        assert!(!ctx.versioning_enabled);
        assert!(!ctx.eviction_enabled);
    }
}
