//! Transaction, recovery, and invocation batching configuration.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;
use crate::policy::{LockingMode, TransactionMode};

fn default_transaction_mode() -> TransactionMode {
    TransactionMode::NonTransactional
}

fn default_locking_mode() -> LockingMode {
    LockingMode::Optimistic
}

fn default_auto_commit() -> bool {
    true
}

fn default_cache_stop_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_sync_commit_phase() -> bool {
    true
}

fn default_use_synchronization() -> bool {
    true
}

/// Transaction settings, with the nested recovery section.
///
/// # Validation Rules
///
/// - nested recovery adds its own rules (see
///   [`RecoveryConfiguration`])
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TransactionConfiguration {
    /// Whether cache operations run inside transactions.
    /// Default: non-transactional.
    #[serde(default = "default_transaction_mode")]
    transaction_mode: TransactionMode,
    /// When write locks are acquired. Default: optimistic.
    #[serde(default = "default_locking_mode")]
    locking_mode: LockingMode,
    /// Whether single operations outside an explicit transaction are
    /// committed implicitly. Default: true.
    #[serde(default = "default_auto_commit")]
    auto_commit: bool,
    /// How long cache shutdown waits for in-flight transactions.
    /// Default: 30 seconds.
    #[serde(default = "default_cache_stop_timeout")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    cache_stop_timeout: Duration,
    /// Whether the commit phase is performed synchronously. Default: true.
    #[serde(default = "default_sync_commit_phase")]
    sync_commit_phase: bool,
    /// Whether the rollback phase is performed synchronously.
    /// Default: false.
    #[serde(default)]
    sync_rollback_phase: bool,
    /// Whether the cache registers with the transaction manager as a
    /// synchronization instead of a full XA resource. Default: true.
    #[serde(default = "default_use_synchronization")]
    use_synchronization: bool,
    /// Transaction recovery settings.
    #[serde(default)]
    recovery: RecoveryConfiguration,
}

impl TransactionConfiguration {
    /// Whether cache operations run inside transactions.
    #[must_use]
    pub const fn transaction_mode(&self) -> TransactionMode {
        self.transaction_mode
    }

    /// When write locks are acquired.
    #[must_use]
    pub const fn locking_mode(&self) -> LockingMode {
        self.locking_mode
    }

    /// Whether implicit single-operation transactions are committed
    /// automatically.
    #[must_use]
    pub const fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// Shutdown deadline for in-flight transactions.
    #[must_use]
    pub const fn cache_stop_timeout(&self) -> Duration {
        self.cache_stop_timeout
    }

    /// Whether the commit phase is synchronous.
    #[must_use]
    pub const fn sync_commit_phase(&self) -> bool {
        self.sync_commit_phase
    }

    /// Whether the rollback phase is synchronous.
    #[must_use]
    pub const fn sync_rollback_phase(&self) -> bool {
        self.sync_rollback_phase
    }

    /// Whether the cache enlists as a synchronization rather than an XA
    /// resource.
    #[must_use]
    pub const fn use_synchronization(&self) -> bool {
        self.use_synchronization
    }

    /// Transaction recovery settings.
    #[must_use]
    pub const fn recovery(&self) -> &RecoveryConfiguration {
        &self.recovery
    }
}

impl Default for TransactionConfiguration {
    fn default() -> Self {
        TransactionBuilder::default().create()
    }
}

/// Builder for [`TransactionConfiguration`].
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    pub(crate) transaction_mode: TransactionMode,
    pub(crate) locking_mode: LockingMode,
    auto_commit: bool,
    cache_stop_timeout: Duration,
    sync_commit_phase: bool,
    sync_rollback_phase: bool,
    use_synchronization: bool,
    recovery: RecoveryBuilder,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self {
            transaction_mode: default_transaction_mode(),
            locking_mode: default_locking_mode(),
            auto_commit: default_auto_commit(),
            cache_stop_timeout: default_cache_stop_timeout(),
            sync_commit_phase: default_sync_commit_phase(),
            sync_rollback_phase: false,
            use_synchronization: default_use_synchronization(),
            recovery: RecoveryBuilder::default(),
        }
    }
}

impl TransactionBuilder {
    /// Sets whether cache operations run inside transactions.
    pub fn transaction_mode(&mut self, transaction_mode: TransactionMode) -> &mut Self {
        self.transaction_mode = transaction_mode;
        self
    }

    /// Sets when write locks are acquired.
    pub fn locking_mode(&mut self, locking_mode: LockingMode) -> &mut Self {
        self.locking_mode = locking_mode;
        self
    }

    /// Sets whether implicit single-operation transactions are committed
    /// automatically.
    pub fn auto_commit(&mut self, auto_commit: bool) -> &mut Self {
        self.auto_commit = auto_commit;
        self
    }

    /// Sets how long cache shutdown waits for in-flight transactions.
    pub fn cache_stop_timeout(&mut self, cache_stop_timeout: Duration) -> &mut Self {
        self.cache_stop_timeout = cache_stop_timeout;
        self
    }

    /// Sets whether the commit phase is synchronous.
    pub fn sync_commit_phase(&mut self, sync_commit_phase: bool) -> &mut Self {
        self.sync_commit_phase = sync_commit_phase;
        self
    }

    /// Sets whether the rollback phase is synchronous.
    pub fn sync_rollback_phase(&mut self, sync_rollback_phase: bool) -> &mut Self {
        self.sync_rollback_phase = sync_rollback_phase;
        self
    }

    /// Sets whether the cache enlists as a synchronization instead of an
    /// XA resource.
    pub fn use_synchronization(&mut self, use_synchronization: bool) -> &mut Self {
        self.use_synchronization = use_synchronization;
        self
    }

    /// Nested recovery builder.
    pub fn recovery(&mut self) -> &mut RecoveryBuilder {
        &mut self.recovery
    }

    /// Resets this builder and its nested builder from a built record.
    pub fn read(&mut self, template: &TransactionConfiguration) -> &mut Self {
        self.transaction_mode = template.transaction_mode;
        self.locking_mode = template.locking_mode;
        self.auto_commit = template.auto_commit;
        self.cache_stop_timeout = template.cache_stop_timeout;
        self.sync_commit_phase = template.sync_commit_phase;
        self.sync_rollback_phase = template.sync_rollback_phase;
        self.use_synchronization = template.use_synchronization;
        self.recovery.read(&template.recovery);
        self
    }
}

impl ChildBuilder for TransactionBuilder {
    type Configuration = TransactionConfiguration;

    fn section(&self) -> Section {
        Section::Transaction
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        self.recovery.validate(ctx)
    }

    fn create(&self) -> TransactionConfiguration {
        TransactionConfiguration {
            transaction_mode: self.transaction_mode,
            locking_mode: self.locking_mode,
            auto_commit: self.auto_commit,
            cache_stop_timeout: self.cache_stop_timeout,
            sync_commit_phase: self.sync_commit_phase,
            sync_rollback_phase: self.sync_rollback_phase,
            use_synchronization: self.use_synchronization,
            recovery: self.recovery.create(),
        }
    }
}

// =========================================================================
// Recovery
// =========================================================================

fn default_recovery_info_cache_name() -> String {
    "__recoveryInfoCacheName__".to_string()
}

/// Transaction recovery settings. Recovery stores in-doubt transaction
/// state in a dedicated cache so an administrator can complete or roll
/// back transactions after a crash.
///
/// # Validation Rules
///
/// - recovery can only be enabled on a transactional cache
/// - `recovery_info_cache_name` must not be empty while enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecoveryConfiguration {
    /// Whether in-doubt transaction state is retained. Default: false.
    #[serde(default)]
    enabled: bool,
    /// Name of the cache holding recovery state.
    #[serde(default = "default_recovery_info_cache_name")]
    recovery_info_cache_name: String,
}

impl RecoveryConfiguration {
    /// Whether recovery is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Name of the cache holding recovery state.
    #[must_use]
    pub fn recovery_info_cache_name(&self) -> &str {
        &self.recovery_info_cache_name
    }
}

impl Default for RecoveryConfiguration {
    fn default() -> Self {
        RecoveryBuilder::default().create()
    }
}

/// Builder for [`RecoveryConfiguration`].
#[derive(Debug, Clone)]
pub struct RecoveryBuilder {
    enabled: bool,
    recovery_info_cache_name: String,
}

impl Default for RecoveryBuilder {
    fn default() -> Self {
        Self { enabled: false, recovery_info_cache_name: default_recovery_info_cache_name() }
    }
}

impl RecoveryBuilder {
    /// Sets whether in-doubt transaction state is retained.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Enables recovery.
    pub fn enable(&mut self) -> &mut Self {
        self.enabled(true)
    }

    /// Disables recovery.
    pub fn disable(&mut self) -> &mut Self {
        self.enabled(false)
    }

    /// Sets the name of the cache holding recovery state.
    pub fn recovery_info_cache_name(
        &mut self,
        recovery_info_cache_name: impl Into<String>,
    ) -> &mut Self {
        self.recovery_info_cache_name = recovery_info_cache_name.into();
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &RecoveryConfiguration) -> &mut Self {
        self.enabled = template.enabled;
        self.recovery_info_cache_name = template.recovery_info_cache_name.clone();
        self
    }
}

impl ChildBuilder for RecoveryBuilder {
    type Configuration = RecoveryConfiguration;

    fn section(&self) -> Section {
        Section::Recovery
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if !self.enabled {
            return Ok(());
        }
        if !ctx.transaction_mode.is_transactional() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "recovery requires a transactional cache".to_string(),
            });
        }
        if self.recovery_info_cache_name.is_empty() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "recovery_info_cache_name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn create(&self) -> RecoveryConfiguration {
        RecoveryConfiguration {
            enabled: self.enabled,
            recovery_info_cache_name: self.recovery_info_cache_name.clone(),
        }
    }
}

// =========================================================================
// InvocationBatching
// =========================================================================

/// Invocation batching settings. Batching groups several operations into
/// one unit applied atomically through the transaction layer.
///
/// # Validation Rules
///
/// - batching can only be enabled on a transactional cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InvocationBatchingConfiguration {
    /// Whether batching is available. Default: false.
    #[serde(default)]
    enabled: bool,
}

impl InvocationBatchingConfiguration {
    /// Whether batching is available.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for InvocationBatchingConfiguration {
    fn default() -> Self {
        InvocationBatchingBuilder::default().create()
    }
}

/// Builder for [`InvocationBatchingConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct InvocationBatchingBuilder {
    enabled: bool,
}

impl InvocationBatchingBuilder {
    /// Sets whether batching is available.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Enables batching.
    pub fn enable(&mut self) -> &mut Self {
        self.enabled(true)
    }

    /// Disables batching.
    pub fn disable(&mut self) -> &mut Self {
        self.enabled(false)
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &InvocationBatchingConfiguration) -> &mut Self {
        self.enabled = template.enabled;
        self
    }
}

impl ChildBuilder for InvocationBatchingBuilder {
    type Configuration = InvocationBatchingConfiguration;

    fn section(&self) -> Section {
        Section::InvocationBatching
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.enabled && !ctx.transaction_mode.is_transactional() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "invocation batching requires a transactional cache".to_string(),
            });
        }
        Ok(())
    }

    fn create(&self) -> InvocationBatchingConfiguration {
        InvocationBatchingConfiguration { enabled: self.enabled }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn transactional_ctx() -> ValidationContext {
        ValidationContext {
            transaction_mode: TransactionMode::Transactional,
            ..ValidationContext::default()
        }
    }

    #[test]
    fn test_transaction_defaults_are_valid() {
        let builder = TransactionBuilder::default();
        builder.validate(&ValidationContext::default()).unwrap();
        let config = builder.create();
        assert_eq!(config.transaction_mode(), TransactionMode::NonTransactional);
        assert_eq!(config.locking_mode(), LockingMode::Optimistic);
        assert!(config.auto_commit());
        assert_eq!(config.cache_stop_timeout(), Duration::from_secs(30));
        assert!(config.sync_commit_phase());
        assert!(!config.sync_rollback_phase());
        assert!(config.use_synchronization());
        assert!(!config.recovery().enabled());
        assert_eq!(config.recovery().recovery_info_cache_name(), "__recoveryInfoCacheName__");
    }

    #[test]
    fn test_recovery_requires_transactional_cache() {
        let mut builder = TransactionBuilder::default();
        builder.recovery().enable();
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert_eq!(err.section(), Some(Section::Recovery));
        assert!(err.to_string().contains("transactional"));

        builder.transaction_mode(TransactionMode::Transactional);
        builder.validate(&transactional_ctx()).unwrap();
    }

    #[test]
    fn test_recovery_rejects_empty_cache_name() {
        let mut builder = RecoveryBuilder::default();
        builder.enable().recovery_info_cache_name("");
        let err = builder.validate(&transactional_ctx()).unwrap_err();
        assert!(err.to_string().contains("recovery_info_cache_name"));
    }

    #[test]
    fn test_disabled_recovery_skips_name_check() {
        let mut builder = RecoveryBuilder::default();
        builder.recovery_info_cache_name("");
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_batching_requires_transactional_cache() {
        let mut builder = InvocationBatchingBuilder::default();
        builder.enable();
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert_eq!(err.section(), Some(Section::InvocationBatching));

        builder.validate(&transactional_ctx()).unwrap();
    }

    #[test]
    fn test_create_twice_yields_equal_independent_records() {
        let mut builder = TransactionBuilder::default();
        builder.transaction_mode(TransactionMode::Transactional);
        builder.recovery().enable().recovery_info_cache_name("recovery-cache");

        let first = builder.create();
        let second = builder.create();
        assert_eq!(first, second);

        builder.recovery().recovery_info_cache_name("other");
        assert_eq!(first.recovery().recovery_info_cache_name(), "recovery-cache");
        assert_ne!(builder.create(), first);
    }

    #[test]
    fn test_read_round_trip() {
        let mut builder = TransactionBuilder::default();
        builder
            .transaction_mode(TransactionMode::Transactional)
            .locking_mode(LockingMode::Pessimistic)
            .auto_commit(false)
            .sync_rollback_phase(true);
        builder.recovery().enable();
        let original = builder.create();

        let mut copy = TransactionBuilder::default();
        copy.read(&original);
        assert_eq!(copy.create(), original);
    }

    #[test]
    fn test_serde_defaults() {
        let config: TransactionConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TransactionConfiguration::default());

        let batching: InvocationBatchingConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(batching, InvocationBatchingConfiguration::default());
    }
}
