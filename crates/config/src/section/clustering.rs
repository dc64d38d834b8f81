//! Clustering configuration: cache mode, key ownership, L1 near-cache,
//! state transfer, and partition handling.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;
use crate::policy::{CacheMode, MergePolicy, PartitionHandling};

fn default_cache_mode() -> CacheMode {
    CacheMode::Local
}

fn default_remote_timeout() -> Duration {
    Duration::from_secs(15)
}

/// Topology settings for one cache, with the nested hash, L1,
/// state-transfer, and partition-handling sections.
///
/// # Validation Rules
///
/// - `remote_timeout` must be nonzero for synchronous clustered modes
/// - nested sections add their own rules (see each type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusteringConfiguration {
    /// Replication topology. Default: local.
    #[serde(default = "default_cache_mode")]
    cache_mode: CacheMode,
    /// How long a synchronous remote call may take before it fails.
    #[serde(default = "default_remote_timeout")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    remote_timeout: Duration,
    /// Key ownership layout for distributed modes.
    #[serde(default)]
    hash: HashConfiguration,
    /// Near-cache for remotely owned entries.
    #[serde(default)]
    l1: L1Configuration,
    /// State transfer to joining nodes.
    #[serde(default)]
    state_transfer: StateTransferConfiguration,
    /// Split-brain policy.
    #[serde(default)]
    partition_handling: PartitionHandlingConfiguration,
}

impl ClusteringConfiguration {
    /// Replication topology of the cache.
    #[must_use]
    pub const fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }

    /// Timeout for synchronous remote calls.
    #[must_use]
    pub const fn remote_timeout(&self) -> Duration {
        self.remote_timeout
    }

    /// Key ownership settings.
    #[must_use]
    pub const fn hash(&self) -> &HashConfiguration {
        &self.hash
    }

    /// L1 near-cache settings.
    #[must_use]
    pub const fn l1(&self) -> &L1Configuration {
        &self.l1
    }

    /// State transfer settings.
    #[must_use]
    pub const fn state_transfer(&self) -> &StateTransferConfiguration {
        &self.state_transfer
    }

    /// Partition handling settings.
    #[must_use]
    pub const fn partition_handling(&self) -> &PartitionHandlingConfiguration {
        &self.partition_handling
    }
}

impl Default for ClusteringConfiguration {
    fn default() -> Self {
        ClusteringBuilder::default().create()
    }
}

/// Builder for [`ClusteringConfiguration`] and its nested sections.
#[derive(Debug, Clone)]
pub struct ClusteringBuilder {
    pub(crate) cache_mode: CacheMode,
    remote_timeout: Duration,
    hash: HashBuilder,
    l1: L1Builder,
    state_transfer: StateTransferBuilder,
    partition_handling: PartitionHandlingBuilder,
}

impl Default for ClusteringBuilder {
    fn default() -> Self {
        Self {
            cache_mode: default_cache_mode(),
            remote_timeout: default_remote_timeout(),
            hash: HashBuilder::default(),
            l1: L1Builder::default(),
            state_transfer: StateTransferBuilder::default(),
            partition_handling: PartitionHandlingBuilder::default(),
        }
    }
}

impl ClusteringBuilder {
    /// Sets the replication topology.
    pub fn cache_mode(&mut self, cache_mode: CacheMode) -> &mut Self {
        self.cache_mode = cache_mode;
        self
    }

    /// Sets the timeout for synchronous remote calls.
    pub fn remote_timeout(&mut self, remote_timeout: Duration) -> &mut Self {
        self.remote_timeout = remote_timeout;
        self
    }

    /// Nested key-ownership builder.
    pub fn hash(&mut self) -> &mut HashBuilder {
        &mut self.hash
    }

    /// Nested L1 builder.
    pub fn l1(&mut self) -> &mut L1Builder {
        &mut self.l1
    }

    /// Nested state-transfer builder.
    pub fn state_transfer(&mut self) -> &mut StateTransferBuilder {
        &mut self.state_transfer
    }

    /// Nested partition-handling builder.
    pub fn partition_handling(&mut self) -> &mut PartitionHandlingBuilder {
        &mut self.partition_handling
    }

    /// Resets this builder and its nested builders from a built record.
    pub fn read(&mut self, template: &ClusteringConfiguration) -> &mut Self {
        self.cache_mode = template.cache_mode;
        self.remote_timeout = template.remote_timeout;
        self.hash.read(&template.hash);
        self.l1.read(&template.l1);
        self.state_transfer.read(&template.state_transfer);
        self.partition_handling.read(&template.partition_handling);
        self
    }
}

impl ChildBuilder for ClusteringBuilder {
    type Configuration = ClusteringConfiguration;

    fn section(&self) -> Section {
        Section::Clustering
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.cache_mode.is_clustered()
            && self.cache_mode.is_synchronous()
            && self.remote_timeout.is_zero()
        {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: format!(
                    "remote_timeout must be nonzero for synchronous clustered modes ({})",
                    self.cache_mode
                ),
            });
        }
        self.hash.validate(ctx)?;
        self.l1.validate(ctx)?;
        self.state_transfer.validate(ctx)?;
        self.partition_handling.validate(ctx)?;
        Ok(())
    }

    fn create(&self) -> ClusteringConfiguration {
        ClusteringConfiguration {
            cache_mode: self.cache_mode,
            remote_timeout: self.remote_timeout,
            hash: self.hash.create(),
            l1: self.l1.create(),
            state_transfer: self.state_transfer.create(),
            partition_handling: self.partition_handling.create(),
        }
    }
}

// =========================================================================
// Hash
// =========================================================================

fn default_num_owners() -> u32 {
    2
}

fn default_num_segments() -> u32 {
    256
}

fn default_capacity_factor() -> f32 {
    1.0
}

/// Key ownership layout for distributed caches.
///
/// # Validation Rules
///
/// - `num_owners` and `num_segments` must be >= 1
/// - `capacity_factor` must be a positive finite number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HashConfiguration {
    /// Copies kept of each entry. Default: 2.
    #[serde(default = "default_num_owners")]
    num_owners: u32,
    /// Hash-wheel segments the key space is divided into. Default: 256.
    #[serde(default = "default_num_segments")]
    num_segments: u32,
    /// Relative share of segments this node volunteers for. Default: 1.0.
    #[serde(default = "default_capacity_factor")]
    capacity_factor: f32,
}

impl HashConfiguration {
    /// Copies kept of each entry.
    #[must_use]
    pub const fn num_owners(&self) -> u32 {
        self.num_owners
    }

    /// Segments the key space is divided into.
    #[must_use]
    pub const fn num_segments(&self) -> u32 {
        self.num_segments
    }

    /// Relative capacity weight of this node.
    #[must_use]
    pub const fn capacity_factor(&self) -> f32 {
        self.capacity_factor
    }
}

impl Default for HashConfiguration {
    fn default() -> Self {
        HashBuilder::default().create()
    }
}

/// Builder for [`HashConfiguration`].
#[derive(Debug, Clone)]
pub struct HashBuilder {
    num_owners: u32,
    num_segments: u32,
    capacity_factor: f32,
}

impl Default for HashBuilder {
    fn default() -> Self {
        Self {
            num_owners: default_num_owners(),
            num_segments: default_num_segments(),
            capacity_factor: default_capacity_factor(),
        }
    }
}

impl HashBuilder {
    /// Sets how many nodes hold a copy of each entry.
    pub fn num_owners(&mut self, num_owners: u32) -> &mut Self {
        self.num_owners = num_owners;
        self
    }

    /// Sets how many segments the key space is divided into.
    pub fn num_segments(&mut self, num_segments: u32) -> &mut Self {
        self.num_segments = num_segments;
        self
    }

    /// Sets this node's relative capacity weight.
    pub fn capacity_factor(&mut self, capacity_factor: f32) -> &mut Self {
        self.capacity_factor = capacity_factor;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &HashConfiguration) -> &mut Self {
        self.num_owners = template.num_owners;
        self.num_segments = template.num_segments;
        self.capacity_factor = template.capacity_factor;
        self
    }
}

impl ChildBuilder for HashBuilder {
    type Configuration = HashConfiguration;

    fn section(&self) -> Section {
        Section::Hash
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.num_owners == 0 {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "num_owners must be >= 1".to_string(),
            });
        }
        if self.num_segments == 0 {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "num_segments must be >= 1".to_string(),
            });
        }
        if !self.capacity_factor.is_finite() || self.capacity_factor <= 0.0 {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: format!(
                    "capacity_factor must be a positive finite number, got {}",
                    self.capacity_factor
                ),
            });
        }
        if !ctx.cache_mode.is_distributed() && self.num_owners != default_num_owners() {
            warn!(
                num_owners = self.num_owners,
                cache_mode = %ctx.cache_mode,
                "num_owners has no effect outside distributed cache modes"
            );
        }
        Ok(())
    }

    fn create(&self) -> HashConfiguration {
        HashConfiguration {
            num_owners: self.num_owners,
            num_segments: self.num_segments,
            capacity_factor: self.capacity_factor,
        }
    }
}

// =========================================================================
// L1
// =========================================================================

fn default_l1_lifespan() -> Duration {
    Duration::from_secs(600)
}

fn default_cleanup_task_frequency() -> Duration {
    Duration::from_secs(600)
}

/// L1 near-cache settings: entries read from a remote owner are kept
/// locally until they expire or the owner writes to them.
///
/// # Validation Rules
///
/// - only distributed cache modes can enable L1
/// - `lifespan` and `cleanup_task_frequency` must be nonzero while enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct L1Configuration {
    /// Whether remotely owned entries are cached locally. Default: false.
    #[serde(default)]
    enabled: bool,
    /// How long an L1 entry stays valid. Default: 10 minutes.
    #[serde(default = "default_l1_lifespan")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    lifespan: Duration,
    /// Number of invalidations above which a multicast is used instead of
    /// individual messages. Zero disables the threshold. Default: 0.
    #[serde(default)]
    invalidation_threshold: u32,
    /// How often stale L1 entries are purged. Default: 10 minutes.
    #[serde(default = "default_cleanup_task_frequency")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    cleanup_task_frequency: Duration,
}

impl L1Configuration {
    /// Whether the L1 cache is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Lifespan of L1 entries.
    #[must_use]
    pub const fn lifespan(&self) -> Duration {
        self.lifespan
    }

    /// Invalidation multicast threshold.
    #[must_use]
    pub const fn invalidation_threshold(&self) -> u32 {
        self.invalidation_threshold
    }

    /// Interval between L1 cleanup runs.
    #[must_use]
    pub const fn cleanup_task_frequency(&self) -> Duration {
        self.cleanup_task_frequency
    }
}

impl Default for L1Configuration {
    fn default() -> Self {
        L1Builder::default().create()
    }
}

/// Builder for [`L1Configuration`].
#[derive(Debug, Clone)]
pub struct L1Builder {
    enabled: bool,
    lifespan: Duration,
    invalidation_threshold: u32,
    cleanup_task_frequency: Duration,
}

impl Default for L1Builder {
    fn default() -> Self {
        Self {
            enabled: false,
            lifespan: default_l1_lifespan(),
            invalidation_threshold: 0,
            cleanup_task_frequency: default_cleanup_task_frequency(),
        }
    }
}

impl L1Builder {
    /// Sets whether the L1 cache is enabled.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Enables the L1 cache.
    pub fn enable(&mut self) -> &mut Self {
        self.enabled(true)
    }

    /// Disables the L1 cache.
    pub fn disable(&mut self) -> &mut Self {
        self.enabled(false)
    }

    /// Sets the lifespan of L1 entries.
    pub fn lifespan(&mut self, lifespan: Duration) -> &mut Self {
        self.lifespan = lifespan;
        self
    }

    /// Sets the invalidation multicast threshold.
    pub fn invalidation_threshold(&mut self, invalidation_threshold: u32) -> &mut Self {
        self.invalidation_threshold = invalidation_threshold;
        self
    }

    /// Sets the interval between L1 cleanup runs.
    pub fn cleanup_task_frequency(&mut self, cleanup_task_frequency: Duration) -> &mut Self {
        self.cleanup_task_frequency = cleanup_task_frequency;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &L1Configuration) -> &mut Self {
        self.enabled = template.enabled;
        self.lifespan = template.lifespan;
        self.invalidation_threshold = template.invalidation_threshold;
        self.cleanup_task_frequency = template.cleanup_task_frequency;
        self
    }
}

impl ChildBuilder for L1Builder {
    type Configuration = L1Configuration;

    fn section(&self) -> Section {
        Section::L1
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if !self.enabled {
            return Ok(());
        }
        if !ctx.cache_mode.is_distributed() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: format!(
                    "l1 is only available with distributed cache modes, got {}",
                    ctx.cache_mode
                ),
            });
        }
        if self.lifespan.is_zero() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "lifespan must be nonzero when l1 is enabled".to_string(),
            });
        }
        if self.cleanup_task_frequency.is_zero() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "cleanup_task_frequency must be nonzero when l1 is enabled".to_string(),
            });
        }
        Ok(())
    }

    fn create(&self) -> L1Configuration {
        L1Configuration {
            enabled: self.enabled,
            lifespan: self.lifespan,
            invalidation_threshold: self.invalidation_threshold,
            cleanup_task_frequency: self.cleanup_task_frequency,
        }
    }
}

// =========================================================================
// StateTransfer
// =========================================================================

fn default_fetch_in_memory_state() -> bool {
    true
}

fn default_await_initial_transfer() -> bool {
    true
}

fn default_state_transfer_timeout() -> Duration {
    Duration::from_secs(240)
}

fn default_chunk_size() -> u32 {
    512
}

/// State transfer settings for nodes joining or leaving the cluster.
///
/// # Validation Rules
///
/// - `chunk_size` must be >= 1
/// - `await_initial_transfer` requires `fetch_in_memory_state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StateTransferConfiguration {
    /// Whether a joining node pulls the current in-memory state.
    /// Default: true.
    #[serde(default = "default_fetch_in_memory_state")]
    fetch_in_memory_state: bool,
    /// Whether cache start blocks until the initial transfer finishes.
    /// Default: true.
    #[serde(default = "default_await_initial_transfer")]
    await_initial_transfer: bool,
    /// Overall state transfer deadline. Default: 4 minutes.
    #[serde(default = "default_state_transfer_timeout")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    timeout: Duration,
    /// Entries per transferred chunk. Default: 512.
    #[serde(default = "default_chunk_size")]
    chunk_size: u32,
}

impl StateTransferConfiguration {
    /// Whether joining nodes pull in-memory state.
    #[must_use]
    pub const fn fetch_in_memory_state(&self) -> bool {
        self.fetch_in_memory_state
    }

    /// Whether cache start blocks on the initial transfer.
    #[must_use]
    pub const fn await_initial_transfer(&self) -> bool {
        self.await_initial_transfer
    }

    /// State transfer deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Entries per transferred chunk.
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }
}

impl Default for StateTransferConfiguration {
    fn default() -> Self {
        StateTransferBuilder::default().create()
    }
}

/// Builder for [`StateTransferConfiguration`].
#[derive(Debug, Clone)]
pub struct StateTransferBuilder {
    fetch_in_memory_state: bool,
    await_initial_transfer: bool,
    timeout: Duration,
    chunk_size: u32,
}

impl Default for StateTransferBuilder {
    fn default() -> Self {
        Self {
            fetch_in_memory_state: default_fetch_in_memory_state(),
            await_initial_transfer: default_await_initial_transfer(),
            timeout: default_state_transfer_timeout(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl StateTransferBuilder {
    /// Sets whether joining nodes pull the current in-memory state.
    pub fn fetch_in_memory_state(&mut self, fetch_in_memory_state: bool) -> &mut Self {
        self.fetch_in_memory_state = fetch_in_memory_state;
        self
    }

    /// Sets whether cache start blocks until the initial transfer finishes.
    pub fn await_initial_transfer(&mut self, await_initial_transfer: bool) -> &mut Self {
        self.await_initial_transfer = await_initial_transfer;
        self
    }

    /// Sets the overall state transfer deadline.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of entries per transferred chunk.
    pub fn chunk_size(&mut self, chunk_size: u32) -> &mut Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &StateTransferConfiguration) -> &mut Self {
        self.fetch_in_memory_state = template.fetch_in_memory_state;
        self.await_initial_transfer = template.await_initial_transfer;
        self.timeout = template.timeout;
        self.chunk_size = template.chunk_size;
        self
    }
}

impl ChildBuilder for StateTransferBuilder {
    type Configuration = StateTransferConfiguration;

    fn section(&self) -> Section {
        Section::StateTransfer
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.chunk_size == 0 {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "chunk_size must be >= 1".to_string(),
            });
        }
        if self.await_initial_transfer && !self.fetch_in_memory_state {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "await_initial_transfer requires fetch_in_memory_state".to_string(),
            });
        }
        if !ctx.cache_mode.is_clustered()
            && (self.timeout != default_state_transfer_timeout()
                || self.chunk_size != default_chunk_size())
        {
            warn!(
                cache_mode = %ctx.cache_mode,
                "state transfer settings have no effect without a clustered cache mode"
            );
        }
        Ok(())
    }

    fn create(&self) -> StateTransferConfiguration {
        StateTransferConfiguration {
            fetch_in_memory_state: self.fetch_in_memory_state,
            await_initial_transfer: self.await_initial_transfer,
            timeout: self.timeout,
            chunk_size: self.chunk_size,
        }
    }
}

// =========================================================================
// PartitionHandling
// =========================================================================

fn default_when_split() -> PartitionHandling {
    PartitionHandling::AllowReadWrites
}

fn default_merge_policy() -> MergePolicy {
    MergePolicy::None
}

/// Split-brain policy: availability during a partition and conflict
/// resolution when partitions merge.
///
/// # Validation Rules
///
/// - any policy other than the allow-everything defaults requires a
///   clustered cache mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PartitionHandlingConfiguration {
    /// Availability policy while the cluster is split.
    /// Default: allow-read-writes.
    #[serde(default = "default_when_split")]
    when_split: PartitionHandling,
    /// Conflict resolution applied when partitions merge. Default: none.
    #[serde(default = "default_merge_policy")]
    merge_policy: MergePolicy,
}

impl PartitionHandlingConfiguration {
    /// Availability policy while the cluster is split.
    #[must_use]
    pub const fn when_split(&self) -> PartitionHandling {
        self.when_split
    }

    /// Conflict resolution applied on merge.
    #[must_use]
    pub const fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }
}

impl Default for PartitionHandlingConfiguration {
    fn default() -> Self {
        PartitionHandlingBuilder::default().create()
    }
}

/// Builder for [`PartitionHandlingConfiguration`].
#[derive(Debug, Clone)]
pub struct PartitionHandlingBuilder {
    when_split: PartitionHandling,
    merge_policy: MergePolicy,
}

impl Default for PartitionHandlingBuilder {
    fn default() -> Self {
        Self { when_split: default_when_split(), merge_policy: default_merge_policy() }
    }
}

impl PartitionHandlingBuilder {
    /// Sets the availability policy applied while the cluster is split.
    pub fn when_split(&mut self, when_split: PartitionHandling) -> &mut Self {
        self.when_split = when_split;
        self
    }

    /// Sets the conflict resolution applied when partitions merge.
    pub fn merge_policy(&mut self, merge_policy: MergePolicy) -> &mut Self {
        self.merge_policy = merge_policy;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &PartitionHandlingConfiguration) -> &mut Self {
        self.when_split = template.when_split;
        self.merge_policy = template.merge_policy;
        self
    }
}

impl ChildBuilder for PartitionHandlingBuilder {
    type Configuration = PartitionHandlingConfiguration;

    fn section(&self) -> Section {
        Section::PartitionHandling
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        let customized = self.when_split != PartitionHandling::AllowReadWrites
            || self.merge_policy != MergePolicy::None;
        if customized && !ctx.cache_mode.is_clustered() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: format!(
                    "partition handling requires a clustered cache mode, got {}",
                    ctx.cache_mode
                ),
            });
        }
        Ok(())
    }

    fn create(&self) -> PartitionHandlingConfiguration {
        PartitionHandlingConfiguration {
            when_split: self.when_split,
            merge_policy: self.merge_policy,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::policy::{CacheMode, MergePolicy, PartitionHandling};

    fn distributed_ctx() -> ValidationContext {
        ValidationContext { cache_mode: CacheMode::DistSync, ..ValidationContext::default() }
    }

    #[test]
    fn test_clustering_defaults_are_valid() {
        let builder = ClusteringBuilder::default();
        builder.validate(&ValidationContext::default()).unwrap();
        let config = builder.create();
        assert_eq!(config.cache_mode(), CacheMode::Local);
        assert_eq!(config.remote_timeout(), Duration::from_secs(15));
        assert_eq!(config.hash().num_owners(), 2);
        assert_eq!(config.hash().num_segments(), 256);
        assert!(!config.l1().enabled());
        assert!(config.state_transfer().fetch_in_memory_state());
        assert_eq!(config.partition_handling().when_split(), PartitionHandling::AllowReadWrites);
    }

    #[test]
    fn test_zero_remote_timeout_rejected_for_sync_clustered_mode() {
        let mut builder = ClusteringBuilder::default();
        builder.cache_mode(CacheMode::ReplSync).remote_timeout(Duration::ZERO);
        let ctx = ValidationContext {
            cache_mode: CacheMode::ReplSync,
            ..ValidationContext::default()
        };
        let err = builder.validate(&ctx).unwrap_err();
        assert_eq!(err.section(), Some(Section::Clustering));
        assert!(err.to_string().contains("remote_timeout"));
    }

    #[test]
    fn test_zero_remote_timeout_allowed_for_async_and_local_modes() {
        let mut builder = ClusteringBuilder::default();
        builder.cache_mode(CacheMode::ReplAsync).remote_timeout(Duration::ZERO);
        let ctx = ValidationContext {
            cache_mode: CacheMode::ReplAsync,
            ..ValidationContext::default()
        };
        builder.validate(&ctx).unwrap();

        let mut builder = ClusteringBuilder::default();
        builder.remote_timeout(Duration::ZERO);
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_hash_rejects_zero_owners() {
        let mut builder = HashBuilder::default();
        builder.num_owners(0);
        let err = builder.validate(&distributed_ctx()).unwrap_err();
        assert_eq!(err.section(), Some(Section::Hash));
        assert!(err.to_string().contains("num_owners"));
    }

    #[test]
    fn test_hash_rejects_zero_segments() {
        let mut builder = HashBuilder::default();
        builder.num_segments(0);
        let err = builder.validate(&distributed_ctx()).unwrap_err();
        assert!(err.to_string().contains("num_segments"));
    }

    #[test]
    fn test_hash_rejects_non_positive_or_non_finite_capacity() {
        for capacity in [0.0f32, -1.0, f32::NAN, f32::INFINITY] {
            let mut builder = HashBuilder::default();
            builder.capacity_factor(capacity);
            let err = builder.validate(&distributed_ctx()).unwrap_err();
            assert!(err.to_string().contains("capacity_factor"), "capacity {capacity}");
        }
    }

    #[test]
    fn test_l1_requires_distributed_mode() {
        let mut builder = L1Builder::default();
        builder.enable();
        let ctx = ValidationContext {
            cache_mode: CacheMode::ReplSync,
            ..ValidationContext::default()
        };
        let err = builder.validate(&ctx).unwrap_err();
        assert_eq!(err.section(), Some(Section::L1));
        assert!(err.to_string().contains("distributed"));

        builder.validate(&distributed_ctx()).unwrap();
    }

    #[test]
    fn test_l1_rejects_zero_lifespan_when_enabled() {
        let mut builder = L1Builder::default();
        builder.enable().lifespan(Duration::ZERO);
        let err = builder.validate(&distributed_ctx()).unwrap_err();
        assert!(err.to_string().contains("lifespan"));
    }

    #[test]
    fn test_l1_disabled_skips_value_checks() {
        let mut builder = L1Builder::default();
        builder.lifespan(Duration::ZERO).cleanup_task_frequency(Duration::ZERO);
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_state_transfer_await_requires_fetch() {
        let mut builder = StateTransferBuilder::default();
        builder.fetch_in_memory_state(false);
        let err = builder.validate(&distributed_ctx()).unwrap_err();
        assert_eq!(err.section(), Some(Section::StateTransfer));
        assert!(err.to_string().contains("await_initial_transfer"));

        builder.await_initial_transfer(false);
        builder.validate(&distributed_ctx()).unwrap();
    }

    #[test]
    fn test_state_transfer_rejects_zero_chunk_size() {
        let mut builder = StateTransferBuilder::default();
        builder.chunk_size(0);
        let err = builder.validate(&distributed_ctx()).unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_partition_handling_requires_clustered_mode() {
        let mut builder = PartitionHandlingBuilder::default();
        builder.when_split(PartitionHandling::DenyReadWrites);
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert_eq!(err.section(), Some(Section::PartitionHandling));

        builder.validate(&distributed_ctx()).unwrap();

        let mut builder = PartitionHandlingBuilder::default();
        builder.merge_policy(MergePolicy::RemoveAll);
        assert!(builder.validate(&ValidationContext::default()).is_err());
    }

    #[test]
    fn test_default_partition_handling_is_valid_on_local_cache() {
        let builder = PartitionHandlingBuilder::default();
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_nested_validation_order_hash_before_l1() {
        let mut builder = ClusteringBuilder::default();
        builder.cache_mode(CacheMode::ReplSync);
        builder.hash().num_owners(0);
        builder.l1().enable();
        let ctx = ValidationContext {
            cache_mode: CacheMode::ReplSync,
            ..ValidationContext::default()
        };
        // Both hash and l1 are invalid here; hash is declared first.
        let err = builder.validate(&ctx).unwrap_err();
        assert_eq!(err.section(), Some(Section::Hash));
    }

    #[test]
    fn test_create_twice_yields_equal_independent_records() {
        let mut builder = ClusteringBuilder::default();
        builder.cache_mode(CacheMode::DistSync);
        builder.l1().enable().lifespan(Duration::from_secs(60));

        let first = builder.create();
        let second = builder.create();
        assert_eq!(first, second);

        builder.l1().lifespan(Duration::from_secs(1));
        assert_eq!(first.l1().lifespan(), Duration::from_secs(60));
        assert_eq!(first, second);
        assert_ne!(builder.create(), first);
    }

    #[test]
    fn test_read_round_trip() {
        let mut builder = ClusteringBuilder::default();
        builder.cache_mode(CacheMode::DistAsync).remote_timeout(Duration::from_secs(30));
        builder.hash().num_owners(3).num_segments(512).capacity_factor(1.5);
        builder.l1().enable().invalidation_threshold(50);
        builder.state_transfer().chunk_size(1024);
        builder.partition_handling().when_split(PartitionHandling::AllowReads);
        let original = builder.create();

        let mut copy = ClusteringBuilder::default();
        copy.read(&original);
        assert_eq!(copy.create(), original);
    }

    #[test]
    fn test_serde_defaults_round_trip() {
        let config: ClusteringConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClusteringConfiguration::default());

        let json = serde_json::to_string(&ClusteringConfiguration::default()).unwrap();
        let back: ClusteringConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ClusteringConfiguration::default());
    }

    #[test]
    fn test_serde_rejects_unknown_cache_mode_token() {
        let result =
            serde_json::from_str::<ClusteringConfiguration>(r#"{"cache_mode":"REPL_SYNC"}"#);
        assert!(result.is_err());
    }
}
