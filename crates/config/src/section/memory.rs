//! Eviction and expiration configuration.
//!
//! Eviction bounds how many entries the data container holds; expiration
//! bounds how long an entry stays alive. Unbounded and immortal are the
//! defaults, expressed as `None` rather than sentinel values.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;
use crate::policy::EvictionStrategy;

fn default_eviction_strategy() -> EvictionStrategy {
    EvictionStrategy::None
}

/// Entry-count bound for the data container.
///
/// # Validation Rules
///
/// - `max_entries` must be >= 1 when set
/// - an enabled eviction strategy requires `max_entries`
/// - exception-based eviction requires a transactional cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EvictionConfiguration {
    /// What happens when the container exceeds its bound. Default: none.
    #[serde(default = "default_eviction_strategy")]
    strategy: EvictionStrategy,
    /// Maximum number of entries, or `None` for unbounded.
    /// Default: unbounded.
    #[serde(default)]
    max_entries: Option<u64>,
}

impl EvictionConfiguration {
    /// Strategy applied when the container exceeds its bound.
    #[must_use]
    pub const fn strategy(&self) -> EvictionStrategy {
        self.strategy
    }

    /// Maximum number of entries, or `None` for unbounded.
    #[must_use]
    pub const fn max_entries(&self) -> Option<u64> {
        self.max_entries
    }
}

impl Default for EvictionConfiguration {
    fn default() -> Self {
        EvictionBuilder::default().create()
    }
}

/// Builder for [`EvictionConfiguration`].
#[derive(Debug, Clone)]
pub struct EvictionBuilder {
    pub(crate) strategy: EvictionStrategy,
    max_entries: Option<u64>,
}

impl Default for EvictionBuilder {
    fn default() -> Self {
        Self { strategy: default_eviction_strategy(), max_entries: None }
    }
}

impl EvictionBuilder {
    /// Sets the strategy applied when the container exceeds its bound.
    pub fn strategy(&mut self, strategy: EvictionStrategy) -> &mut Self {
        self.strategy = strategy;
        self
    }

    /// Sets the maximum number of entries; `None` removes the bound.
    pub fn max_entries(&mut self, max_entries: impl Into<Option<u64>>) -> &mut Self {
        self.max_entries = max_entries.into();
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &EvictionConfiguration) -> &mut Self {
        self.strategy = template.strategy;
        self.max_entries = template.max_entries;
        self
    }
}

impl ChildBuilder for EvictionBuilder {
    type Configuration = EvictionConfiguration;

    fn section(&self) -> Section {
        Section::Eviction
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.max_entries == Some(0) {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "max_entries must be >= 1 when bounded".to_string(),
            });
        }
        if self.strategy.is_enabled() && self.max_entries.is_none() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: format!(
                    "eviction strategy {} requires max_entries to be set",
                    self.strategy
                ),
            });
        }
        if self.strategy.is_exception_based() && !ctx.transaction_mode.is_transactional() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "exception-based eviction requires a transactional cache".to_string(),
            });
        }
        if self.max_entries.is_some() && !self.strategy.is_enabled() {
            warn!(
                strategy = %self.strategy,
                "max_entries is set but the eviction strategy does not evict"
            );
        }
        Ok(())
    }

    fn create(&self) -> EvictionConfiguration {
        EvictionConfiguration { strategy: self.strategy, max_entries: self.max_entries }
    }
}

// =========================================================================
// Expiration
// =========================================================================

fn default_wakeup_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_reaper_enabled() -> bool {
    true
}

/// Entry lifetime bounds and the background expiration reaper.
///
/// # Validation Rules
///
/// - `lifespan` and `max_idle` must be nonzero when set
/// - `wakeup_interval` must be nonzero while the reaper is enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExpirationConfiguration {
    /// Maximum lifetime of an entry from creation, or `None` for
    /// immortal entries. Default: immortal.
    #[serde(default, with = "super::humantime_serde::option")]
    #[schemars(with = "Option<String>")]
    lifespan: Option<Duration>,
    /// Maximum time an entry may go unread, or `None` for no idle bound.
    /// Default: none.
    #[serde(default, with = "super::humantime_serde::option")]
    #[schemars(with = "Option<String>")]
    max_idle: Option<Duration>,
    /// Whether a background task purges expired entries. Default: true.
    #[serde(default = "default_reaper_enabled")]
    reaper_enabled: bool,
    /// Interval between reaper runs. Default: 1 minute.
    #[serde(default = "default_wakeup_interval")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    wakeup_interval: Duration,
}

impl ExpirationConfiguration {
    /// Maximum lifetime of an entry from creation.
    #[must_use]
    pub const fn lifespan(&self) -> Option<Duration> {
        self.lifespan
    }

    /// Maximum time an entry may go unread.
    #[must_use]
    pub const fn max_idle(&self) -> Option<Duration> {
        self.max_idle
    }

    /// Whether the background reaper is enabled.
    #[must_use]
    pub const fn reaper_enabled(&self) -> bool {
        self.reaper_enabled
    }

    /// Interval between reaper runs.
    #[must_use]
    pub const fn wakeup_interval(&self) -> Duration {
        self.wakeup_interval
    }
}

impl Default for ExpirationConfiguration {
    fn default() -> Self {
        ExpirationBuilder::default().create()
    }
}

/// Builder for [`ExpirationConfiguration`].
#[derive(Debug, Clone)]
pub struct ExpirationBuilder {
    lifespan: Option<Duration>,
    max_idle: Option<Duration>,
    reaper_enabled: bool,
    wakeup_interval: Duration,
}

impl Default for ExpirationBuilder {
    fn default() -> Self {
        Self {
            lifespan: None,
            max_idle: None,
            reaper_enabled: default_reaper_enabled(),
            wakeup_interval: default_wakeup_interval(),
        }
    }
}

impl ExpirationBuilder {
    /// Sets the maximum lifetime of an entry; `None` makes entries
    /// immortal.
    pub fn lifespan(&mut self, lifespan: impl Into<Option<Duration>>) -> &mut Self {
        self.lifespan = lifespan.into();
        self
    }

    /// Sets the maximum idle time of an entry; `None` removes the bound.
    pub fn max_idle(&mut self, max_idle: impl Into<Option<Duration>>) -> &mut Self {
        self.max_idle = max_idle.into();
        self
    }

    /// Sets whether the background reaper runs.
    pub fn reaper_enabled(&mut self, reaper_enabled: bool) -> &mut Self {
        self.reaper_enabled = reaper_enabled;
        self
    }

    /// Sets the interval between reaper runs.
    pub fn wakeup_interval(&mut self, wakeup_interval: Duration) -> &mut Self {
        self.wakeup_interval = wakeup_interval;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &ExpirationConfiguration) -> &mut Self {
        self.lifespan = template.lifespan;
        self.max_idle = template.max_idle;
        self.reaper_enabled = template.reaper_enabled;
        self.wakeup_interval = template.wakeup_interval;
        self
    }
}

impl ChildBuilder for ExpirationBuilder {
    type Configuration = ExpirationConfiguration;

    fn section(&self) -> Section {
        Section::Expiration
    }

    fn validate(&self, _ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.lifespan == Some(Duration::ZERO) {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "lifespan must be nonzero when set".to_string(),
            });
        }
        if self.max_idle == Some(Duration::ZERO) {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "max_idle must be nonzero when set".to_string(),
            });
        }
        if self.reaper_enabled && self.wakeup_interval.is_zero() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "wakeup_interval must be nonzero while the reaper is enabled"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn create(&self) -> ExpirationConfiguration {
        ExpirationConfiguration {
            lifespan: self.lifespan,
            max_idle: self.max_idle,
            reaper_enabled: self.reaper_enabled,
            wakeup_interval: self.wakeup_interval,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::policy::TransactionMode;

    #[test]
    fn test_eviction_defaults_are_valid() {
        let builder = EvictionBuilder::default();
        builder.validate(&ValidationContext::default()).unwrap();
        let config = builder.create();
        assert_eq!(config.strategy(), EvictionStrategy::None);
        assert_eq!(config.max_entries(), None);
    }

    #[test]
    fn test_enabled_strategy_requires_max_entries() {
        let mut builder = EvictionBuilder::default();
        builder.strategy(EvictionStrategy::Remove);
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert_eq!(err.section(), Some(Section::Eviction));
        assert!(err.to_string().contains("max_entries"));

        builder.max_entries(1000);
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_zero_max_entries_rejected() {
        let mut builder = EvictionBuilder::default();
        builder.strategy(EvictionStrategy::Remove).max_entries(0);
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert!(err.to_string().contains(">= 1"));
    }

    #[test]
    fn test_exception_strategy_requires_transactional_cache() {
        let mut builder = EvictionBuilder::default();
        builder.strategy(EvictionStrategy::Exception).max_entries(500);
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert!(err.to_string().contains("transactional"));

        let ctx = ValidationContext {
            transaction_mode: TransactionMode::Transactional,
            ..ValidationContext::default()
        };
        builder.validate(&ctx).unwrap();
    }

    #[test]
    fn test_manual_strategy_accepts_max_entries_without_transactions() {
        let mut builder = EvictionBuilder::default();
        builder.strategy(EvictionStrategy::Manual).max_entries(100);
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_expiration_defaults_are_valid() {
        let builder = ExpirationBuilder::default();
        builder.validate(&ValidationContext::default()).unwrap();
        let config = builder.create();
        assert_eq!(config.lifespan(), None);
        assert_eq!(config.max_idle(), None);
        assert!(config.reaper_enabled());
        assert_eq!(config.wakeup_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_lifespan_and_max_idle_rejected() {
        let mut builder = ExpirationBuilder::default();
        builder.lifespan(Duration::ZERO);
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert!(err.to_string().contains("lifespan"));

        let mut builder = ExpirationBuilder::default();
        builder.max_idle(Duration::ZERO);
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert!(err.to_string().contains("max_idle"));
    }

    #[test]
    fn test_zero_wakeup_interval_rejected_only_while_reaper_enabled() {
        let mut builder = ExpirationBuilder::default();
        builder.wakeup_interval(Duration::ZERO);
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert_eq!(err.section(), Some(Section::Expiration));
        assert!(err.to_string().contains("wakeup_interval"));

        builder.reaper_enabled(false);
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_create_twice_yields_equal_independent_records() {
        let mut builder = ExpirationBuilder::default();
        builder.lifespan(Duration::from_secs(300)).max_idle(Duration::from_secs(60));
        let first = builder.create();
        let second = builder.create();
        assert_eq!(first, second);

        builder.lifespan(None);
        assert_eq!(first.lifespan(), Some(Duration::from_secs(300)));
        assert_ne!(builder.create(), first);
    }

    #[test]
    fn test_read_round_trip() {
        let mut builder = EvictionBuilder::default();
        builder.strategy(EvictionStrategy::Remove).max_entries(2048);
        let original = builder.create();

        let mut copy = EvictionBuilder::default();
        copy.read(&original);
        assert_eq!(copy.create(), original);
    }

    #[test]
    fn test_serde_optional_durations() {
        let config: ExpirationConfiguration =
            serde_json::from_str(r#"{"lifespan":"5m","max_idle":null}"#).unwrap();
        assert_eq!(config.lifespan(), Some(Duration::from_secs(300)));
        assert_eq!(config.max_idle(), None);

        let json = serde_json::to_string(&config).unwrap();
        let back: ExpirationConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_serde_defaults() {
        let eviction: EvictionConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(eviction, EvictionConfiguration::default());

        let expiration: ExpirationConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(expiration, ExpirationConfiguration::default());
    }
}
