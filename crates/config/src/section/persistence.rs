//! Persistence configuration: the cache store chain, write-behind, and
//! singleton store election.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;

/// Store chain settings for one cache.
///
/// # Validation Rules
///
/// - passivation requires at least one store
/// - at most one store may fetch persistent state
/// - each store adds its own rules (see [`StoreConfiguration`])
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PersistenceConfiguration {
    /// Whether entries are written to the store only when evicted from
    /// memory, and removed from the store when read back. Default: false.
    #[serde(default)]
    passivation: bool,
    /// Stores in write order.
    #[serde(default)]
    stores: Vec<StoreConfiguration>,
}

impl PersistenceConfiguration {
    /// Whether passivation is enabled.
    #[must_use]
    pub const fn passivation(&self) -> bool {
        self.passivation
    }

    /// Stores in write order.
    #[must_use]
    pub fn stores(&self) -> &[StoreConfiguration] {
        &self.stores
    }

    /// Whether any store is configured.
    #[must_use]
    pub fn uses_stores(&self) -> bool {
        !self.stores.is_empty()
    }
}

impl Default for PersistenceConfiguration {
    fn default() -> Self {
        PersistenceBuilder::default().create()
    }
}

/// Builder for [`PersistenceConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct PersistenceBuilder {
    passivation: bool,
    stores: Vec<StoreBuilder>,
}

impl PersistenceBuilder {
    /// Sets whether entries are passivated to the store on eviction.
    pub fn passivation(&mut self, passivation: bool) -> &mut Self {
        self.passivation = passivation;
        self
    }

    /// Appends a store with default settings and returns its builder.
    pub fn add_store(&mut self) -> &mut StoreBuilder {
        let index = self.stores.len();
        self.stores.push(StoreBuilder::default());
        &mut self.stores[index]
    }

    /// Removes all stores.
    pub fn clear_stores(&mut self) -> &mut Self {
        self.stores.clear();
        self
    }

    /// Resets this builder and its store builders from a built record.
    pub fn read(&mut self, template: &PersistenceConfiguration) -> &mut Self {
        self.passivation = template.passivation;
        self.stores.clear();
        for store in template.stores() {
            self.add_store().read(store);
        }
        self
    }
}

impl ChildBuilder for PersistenceBuilder {
    type Configuration = PersistenceConfiguration;

    fn section(&self) -> Section {
        Section::Persistence
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.passivation && self.stores.is_empty() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "passivation requires at least one store".to_string(),
            });
        }
        let fetching = self.stores.iter().filter(|s| s.fetch_persistent_state).count();
        if fetching > 1 {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: format!(
                    "only one store may fetch persistent state, found {fetching}"
                ),
            });
        }
        if self.passivation && !ctx.eviction_enabled {
            warn!("passivation is enabled without an eviction strategy");
        }
        for store in &self.stores {
            store.validate(ctx)?;
        }
        Ok(())
    }

    fn create(&self) -> PersistenceConfiguration {
        PersistenceConfiguration {
            passivation: self.passivation,
            stores: self.stores.iter().map(|s| s.create()).collect(),
        }
    }
}

// =========================================================================
// Store
// =========================================================================

/// Settings shared by every cache store, with the nested write-behind
/// and singleton sections.
///
/// # Validation Rules
///
/// - a shared store cannot fetch persistent state
/// - a singleton store cannot be shared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoreConfiguration {
    /// Whether the underlying storage is shared by all nodes.
    /// Default: false.
    #[serde(default)]
    shared: bool,
    /// Whether the store contents are loaded into memory at startup.
    /// Default: false.
    #[serde(default)]
    preload: bool,
    /// Whether this store seeds state to joining nodes. Default: false.
    #[serde(default)]
    fetch_persistent_state: bool,
    /// Whether writes skip this store. Default: false.
    #[serde(default)]
    ignore_modifications: bool,
    /// Whether the store is emptied at startup. Default: false.
    #[serde(default)]
    purge_on_startup: bool,
    /// Write-behind settings.
    #[serde(default)]
    async_store: AsyncStoreConfiguration,
    /// Singleton store election settings.
    #[serde(default)]
    singleton_store: SingletonStoreConfiguration,
}

impl StoreConfiguration {
    /// Whether the underlying storage is shared by all nodes.
    #[must_use]
    pub const fn shared(&self) -> bool {
        self.shared
    }

    /// Whether the store contents are loaded at startup.
    #[must_use]
    pub const fn preload(&self) -> bool {
        self.preload
    }

    /// Whether this store seeds state to joining nodes.
    #[must_use]
    pub const fn fetch_persistent_state(&self) -> bool {
        self.fetch_persistent_state
    }

    /// Whether writes skip this store.
    #[must_use]
    pub const fn ignore_modifications(&self) -> bool {
        self.ignore_modifications
    }

    /// Whether the store is emptied at startup.
    #[must_use]
    pub const fn purge_on_startup(&self) -> bool {
        self.purge_on_startup
    }

    /// Write-behind settings.
    #[must_use]
    pub const fn async_store(&self) -> &AsyncStoreConfiguration {
        &self.async_store
    }

    /// Singleton store election settings.
    #[must_use]
    pub const fn singleton_store(&self) -> &SingletonStoreConfiguration {
        &self.singleton_store
    }
}

impl Default for StoreConfiguration {
    fn default() -> Self {
        StoreBuilder::default().create()
    }
}

/// Builder for [`StoreConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    shared: bool,
    preload: bool,
    fetch_persistent_state: bool,
    ignore_modifications: bool,
    purge_on_startup: bool,
    async_store: AsyncStoreBuilder,
    singleton_store: SingletonStoreBuilder,
}

impl StoreBuilder {
    /// Sets whether the underlying storage is shared by all nodes.
    pub fn shared(&mut self, shared: bool) -> &mut Self {
        self.shared = shared;
        self
    }

    /// Sets whether the store contents are loaded at startup.
    pub fn preload(&mut self, preload: bool) -> &mut Self {
        self.preload = preload;
        self
    }

    /// Sets whether this store seeds state to joining nodes.
    pub fn fetch_persistent_state(&mut self, fetch_persistent_state: bool) -> &mut Self {
        self.fetch_persistent_state = fetch_persistent_state;
        self
    }

    /// Sets whether writes skip this store.
    pub fn ignore_modifications(&mut self, ignore_modifications: bool) -> &mut Self {
        self.ignore_modifications = ignore_modifications;
        self
    }

    /// Sets whether the store is emptied at startup.
    pub fn purge_on_startup(&mut self, purge_on_startup: bool) -> &mut Self {
        self.purge_on_startup = purge_on_startup;
        self
    }

    /// Nested write-behind builder.
    pub fn async_store(&mut self) -> &mut AsyncStoreBuilder {
        &mut self.async_store
    }

    /// Nested singleton store builder.
    pub fn singleton_store(&mut self) -> &mut SingletonStoreBuilder {
        &mut self.singleton_store
    }

    /// Resets this builder and its nested builders from a built record.
    pub fn read(&mut self, template: &StoreConfiguration) -> &mut Self {
        self.shared = template.shared;
        self.preload = template.preload;
        self.fetch_persistent_state = template.fetch_persistent_state;
        self.ignore_modifications = template.ignore_modifications;
        self.purge_on_startup = template.purge_on_startup;
        self.async_store.read(&template.async_store);
        self.singleton_store.read(&template.singleton_store);
        self
    }
}

impl ChildBuilder for StoreBuilder {
    type Configuration = StoreConfiguration;

    fn section(&self) -> Section {
        Section::Store
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.shared && self.fetch_persistent_state {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "a shared store cannot fetch persistent state".to_string(),
            });
        }
        if self.shared && self.singleton_store.enabled {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "a singleton store cannot be shared".to_string(),
            });
        }
        self.async_store.validate(ctx)?;
        self.singleton_store.validate(ctx)?;
        Ok(())
    }

    fn create(&self) -> StoreConfiguration {
        StoreConfiguration {
            shared: self.shared,
            preload: self.preload,
            fetch_persistent_state: self.fetch_persistent_state,
            ignore_modifications: self.ignore_modifications,
            purge_on_startup: self.purge_on_startup,
            async_store: self.async_store.create(),
            singleton_store: self.singleton_store.create(),
        }
    }
}

// =========================================================================
// AsyncStore
// =========================================================================

fn default_flush_lock_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_modification_queue_size() -> u32 {
    1024
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(25)
}

fn default_thread_pool_size() -> u32 {
    1
}

/// Write-behind settings: store writes are queued and applied by a
/// background pool instead of blocking the caller.
///
/// # Validation Rules
///
/// - `modification_queue_size` and `thread_pool_size` must be >= 1
///   while write-behind is enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AsyncStoreConfiguration {
    /// Whether store writes happen asynchronously. Default: false.
    #[serde(default)]
    enabled: bool,
    /// How long a flush waits for the queue lock. Default: 5 seconds.
    #[serde(default = "default_flush_lock_timeout")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    flush_lock_timeout: Duration,
    /// Pending writes held before callers block. Default: 1024.
    #[serde(default = "default_modification_queue_size")]
    modification_queue_size: u32,
    /// How long shutdown waits for the queue to drain.
    /// Default: 25 seconds.
    #[serde(default = "default_shutdown_timeout")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    shutdown_timeout: Duration,
    /// Threads applying queued writes. Default: 1.
    #[serde(default = "default_thread_pool_size")]
    thread_pool_size: u32,
}

impl AsyncStoreConfiguration {
    /// Whether write-behind is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Queue lock deadline for flushes.
    #[must_use]
    pub const fn flush_lock_timeout(&self) -> Duration {
        self.flush_lock_timeout
    }

    /// Pending writes held before callers block.
    #[must_use]
    pub const fn modification_queue_size(&self) -> u32 {
        self.modification_queue_size
    }

    /// Drain deadline at shutdown.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Threads applying queued writes.
    #[must_use]
    pub const fn thread_pool_size(&self) -> u32 {
        self.thread_pool_size
    }
}

impl Default for AsyncStoreConfiguration {
    fn default() -> Self {
        AsyncStoreBuilder::default().create()
    }
}

/// Builder for [`AsyncStoreConfiguration`].
#[derive(Debug, Clone)]
pub struct AsyncStoreBuilder {
    enabled: bool,
    flush_lock_timeout: Duration,
    modification_queue_size: u32,
    shutdown_timeout: Duration,
    thread_pool_size: u32,
}

impl Default for AsyncStoreBuilder {
    fn default() -> Self {
        Self {
            enabled: false,
            flush_lock_timeout: default_flush_lock_timeout(),
            modification_queue_size: default_modification_queue_size(),
            shutdown_timeout: default_shutdown_timeout(),
            thread_pool_size: default_thread_pool_size(),
        }
    }
}

impl AsyncStoreBuilder {
    /// Sets whether store writes happen asynchronously.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Enables write-behind.
    pub fn enable(&mut self) -> &mut Self {
        self.enabled(true)
    }

    /// Disables write-behind.
    pub fn disable(&mut self) -> &mut Self {
        self.enabled(false)
    }

    /// Sets how long a flush waits for the queue lock.
    pub fn flush_lock_timeout(&mut self, flush_lock_timeout: Duration) -> &mut Self {
        self.flush_lock_timeout = flush_lock_timeout;
        self
    }

    /// Sets how many pending writes are held before callers block.
    pub fn modification_queue_size(&mut self, modification_queue_size: u32) -> &mut Self {
        self.modification_queue_size = modification_queue_size;
        self
    }

    /// Sets how long shutdown waits for the queue to drain.
    pub fn shutdown_timeout(&mut self, shutdown_timeout: Duration) -> &mut Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// Sets how many threads apply queued writes.
    pub fn thread_pool_size(&mut self, thread_pool_size: u32) -> &mut Self {
        self.thread_pool_size = thread_pool_size;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &AsyncStoreConfiguration) -> &mut Self {
        self.enabled = template.enabled;
        self.flush_lock_timeout = template.flush_lock_timeout;
        self.modification_queue_size = template.modification_queue_size;
        self.shutdown_timeout = template.shutdown_timeout;
        self.thread_pool_size = template.thread_pool_size;
        self
    }
}

impl ChildBuilder for AsyncStoreBuilder {
    type Configuration = AsyncStoreConfiguration;

    fn section(&self) -> Section {
        Section::AsyncStore
    }

    fn validate(&self, _ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.modification_queue_size == 0 {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "modification_queue_size must be >= 1".to_string(),
            });
        }
        if self.thread_pool_size == 0 {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "thread_pool_size must be >= 1".to_string(),
            });
        }
        Ok(())
    }

    fn create(&self) -> AsyncStoreConfiguration {
        AsyncStoreConfiguration {
            enabled: self.enabled,
            flush_lock_timeout: self.flush_lock_timeout,
            modification_queue_size: self.modification_queue_size,
            shutdown_timeout: self.shutdown_timeout,
            thread_pool_size: self.thread_pool_size,
        }
    }
}

// =========================================================================
// SingletonStore
// =========================================================================

fn default_push_state_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_push_state_when_coordinator() -> bool {
    true
}

/// Singleton store election: only the coordinator writes to the store,
/// and a newly elected coordinator can push its in-memory state there.
///
/// # Validation Rules
///
/// - a singleton store requires a clustered cache mode
/// - `push_state_timeout` must be nonzero while enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SingletonStoreConfiguration {
    /// Whether only the coordinator writes to the store. Default: false.
    #[serde(default)]
    enabled: bool,
    /// Deadline for pushing state after election. Default: 10 seconds.
    #[serde(default = "default_push_state_timeout")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    push_state_timeout: Duration,
    /// Whether a newly elected coordinator pushes its in-memory state to
    /// the store. Default: true.
    #[serde(default = "default_push_state_when_coordinator")]
    push_state_when_coordinator: bool,
}

impl SingletonStoreConfiguration {
    /// Whether singleton election is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Deadline for pushing state after election.
    #[must_use]
    pub const fn push_state_timeout(&self) -> Duration {
        self.push_state_timeout
    }

    /// Whether a new coordinator pushes its in-memory state.
    #[must_use]
    pub const fn push_state_when_coordinator(&self) -> bool {
        self.push_state_when_coordinator
    }
}

impl Default for SingletonStoreConfiguration {
    fn default() -> Self {
        SingletonStoreBuilder::default().create()
    }
}

/// Builder for [`SingletonStoreConfiguration`].
#[derive(Debug, Clone)]
pub struct SingletonStoreBuilder {
    enabled: bool,
    push_state_timeout: Duration,
    push_state_when_coordinator: bool,
}

impl Default for SingletonStoreBuilder {
    fn default() -> Self {
        Self {
            enabled: false,
            push_state_timeout: default_push_state_timeout(),
            push_state_when_coordinator: default_push_state_when_coordinator(),
        }
    }
}

impl SingletonStoreBuilder {
    /// Sets whether only the coordinator writes to the store.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Enables singleton election.
    pub fn enable(&mut self) -> &mut Self {
        self.enabled(true)
    }

    /// Disables singleton election.
    pub fn disable(&mut self) -> &mut Self {
        self.enabled(false)
    }

    /// Sets the deadline for pushing state after election.
    pub fn push_state_timeout(&mut self, push_state_timeout: Duration) -> &mut Self {
        self.push_state_timeout = push_state_timeout;
        self
    }

    /// Sets whether a new coordinator pushes its in-memory state.
    pub fn push_state_when_coordinator(
        &mut self,
        push_state_when_coordinator: bool,
    ) -> &mut Self {
        self.push_state_when_coordinator = push_state_when_coordinator;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &SingletonStoreConfiguration) -> &mut Self {
        self.enabled = template.enabled;
        self.push_state_timeout = template.push_state_timeout;
        self.push_state_when_coordinator = template.push_state_when_coordinator;
        self
    }
}

impl ChildBuilder for SingletonStoreBuilder {
    type Configuration = SingletonStoreConfiguration;

    fn section(&self) -> Section {
        Section::SingletonStore
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if !self.enabled {
            return Ok(());
        }
        if !ctx.cache_mode.is_clustered() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: format!(
                    "a singleton store requires a clustered cache mode, got {}",
                    ctx.cache_mode
                ),
            });
        }
        if self.push_state_timeout.is_zero() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "push_state_timeout must be nonzero when the singleton store is enabled"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn create(&self) -> SingletonStoreConfiguration {
        SingletonStoreConfiguration {
            enabled: self.enabled,
            push_state_timeout: self.push_state_timeout,
            push_state_when_coordinator: self.push_state_when_coordinator,
        }
    }
}
