//! Locking and deadlock detection configuration.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;
use crate::policy::{IsolationLevel, LockingMode, VersioningScheme};

fn default_isolation_level() -> IsolationLevel {
    IsolationLevel::ReadCommitted
}

fn default_lock_acquisition_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_concurrency_level() -> u32 {
    32
}

/// Per-entry lock settings.
///
/// # Validation Rules
///
/// - `concurrency_level` must be >= 1
/// - only read-committed and repeatable-read isolation are supported
/// - `write_skew_check` requires repeatable-read isolation and optimistic
///   locking, and on clustered caches additionally simple versioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LockingConfiguration {
    /// Isolation level for transactional reads. Default: read-committed.
    #[serde(default = "default_isolation_level")]
    isolation_level: IsolationLevel,
    /// How long a lock request waits before failing. Default: 10 seconds.
    #[serde(default = "default_lock_acquisition_timeout")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    lock_acquisition_timeout: Duration,
    /// Expected number of concurrent lock holders, used to size the lock
    /// table. Default: 32.
    #[serde(default = "default_concurrency_level")]
    concurrency_level: u32,
    /// Whether a fixed pool of shared locks is used instead of one lock
    /// per entry. Default: false.
    #[serde(default)]
    use_lock_striping: bool,
    /// Whether write skew is detected and rejected at commit time.
    /// Default: false.
    #[serde(default)]
    write_skew_check: bool,
}

impl LockingConfiguration {
    /// Isolation level for transactional reads.
    #[must_use]
    pub const fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    /// Lock acquisition deadline.
    #[must_use]
    pub const fn lock_acquisition_timeout(&self) -> Duration {
        self.lock_acquisition_timeout
    }

    /// Expected number of concurrent lock holders.
    #[must_use]
    pub const fn concurrency_level(&self) -> u32 {
        self.concurrency_level
    }

    /// Whether lock striping is enabled.
    #[must_use]
    pub const fn use_lock_striping(&self) -> bool {
        self.use_lock_striping
    }

    /// Whether write skew is rejected at commit time.
    #[must_use]
    pub const fn write_skew_check(&self) -> bool {
        self.write_skew_check
    }
}

impl Default for LockingConfiguration {
    fn default() -> Self {
        LockingBuilder::default().create()
    }
}

/// Builder for [`LockingConfiguration`].
#[derive(Debug, Clone)]
pub struct LockingBuilder {
    isolation_level: IsolationLevel,
    lock_acquisition_timeout: Duration,
    concurrency_level: u32,
    use_lock_striping: bool,
    write_skew_check: bool,
}

impl Default for LockingBuilder {
    fn default() -> Self {
        Self {
            isolation_level: default_isolation_level(),
            lock_acquisition_timeout: default_lock_acquisition_timeout(),
            concurrency_level: default_concurrency_level(),
            use_lock_striping: false,
            write_skew_check: false,
        }
    }
}

impl LockingBuilder {
    /// Sets the isolation level for transactional reads.
    pub fn isolation_level(&mut self, isolation_level: IsolationLevel) -> &mut Self {
        self.isolation_level = isolation_level;
        self
    }

    /// Sets how long a lock request waits before failing.
    pub fn lock_acquisition_timeout(&mut self, lock_acquisition_timeout: Duration) -> &mut Self {
        self.lock_acquisition_timeout = lock_acquisition_timeout;
        self
    }

    /// Sets the expected number of concurrent lock holders.
    pub fn concurrency_level(&mut self, concurrency_level: u32) -> &mut Self {
        self.concurrency_level = concurrency_level;
        self
    }

    /// Sets whether a fixed pool of shared locks is used.
    pub fn use_lock_striping(&mut self, use_lock_striping: bool) -> &mut Self {
        self.use_lock_striping = use_lock_striping;
        self
    }

    /// Sets whether write skew is rejected at commit time.
    pub fn write_skew_check(&mut self, write_skew_check: bool) -> &mut Self {
        self.write_skew_check = write_skew_check;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &LockingConfiguration) -> &mut Self {
        self.isolation_level = template.isolation_level;
        self.lock_acquisition_timeout = template.lock_acquisition_timeout;
        self.concurrency_level = template.concurrency_level;
        self.use_lock_striping = template.use_lock_striping;
        self.write_skew_check = template.write_skew_check;
        self
    }
}

impl ChildBuilder for LockingBuilder {
    type Configuration = LockingConfiguration;

    fn section(&self) -> Section {
        Section::Locking
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.concurrency_level == 0 {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "concurrency_level must be >= 1".to_string(),
            });
        }
        if !matches!(
            self.isolation_level,
            IsolationLevel::ReadCommitted | IsolationLevel::RepeatableRead
        ) {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: format!(
                    "isolation level {} is not supported, use read-committed or repeatable-read",
                    self.isolation_level
                ),
            });
        }
        if self.write_skew_check {
            if self.isolation_level != IsolationLevel::RepeatableRead {
                return Err(ConfigurationError::Validation {
                    section: self.section(),
                    message: format!(
                        "write_skew_check requires repeatable-read isolation, got {}",
                        self.isolation_level
                    ),
                });
            }
            if ctx.locking_mode == LockingMode::Pessimistic {
                return Err(ConfigurationError::Validation {
                    section: self.section(),
                    message: "write_skew_check requires optimistic locking".to_string(),
                });
            }
            let versioned = ctx.versioning_enabled
                && ctx.versioning_scheme == VersioningScheme::Simple;
            if ctx.cache_mode.is_clustered() && !versioned {
                return Err(ConfigurationError::Validation {
                    section: self.section(),
                    message: "write_skew_check on a clustered cache requires simple versioning"
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    fn create(&self) -> LockingConfiguration {
        LockingConfiguration {
            isolation_level: self.isolation_level,
            lock_acquisition_timeout: self.lock_acquisition_timeout,
            concurrency_level: self.concurrency_level,
            use_lock_striping: self.use_lock_striping,
            write_skew_check: self.write_skew_check,
        }
    }
}

// =========================================================================
// DeadlockDetection
// =========================================================================

fn default_spin_duration() -> Duration {
    Duration::from_millis(100)
}

/// Deadlock detection settings.
///
/// # Validation Rules
///
/// - `spin_duration` must be nonzero while detection is enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeadlockDetectionConfiguration {
    /// Whether deadlock detection runs for lock acquisitions.
    /// Default: false.
    #[serde(default)]
    enabled: bool,
    /// How long a lock owner spins before checking for a deadlock cycle.
    /// Default: 100 milliseconds.
    #[serde(default = "default_spin_duration")]
    #[serde(with = "super::humantime_serde")]
    #[schemars(with = "String")]
    spin_duration: Duration,
}

impl DeadlockDetectionConfiguration {
    /// Whether deadlock detection is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Spin interval between deadlock checks.
    #[must_use]
    pub const fn spin_duration(&self) -> Duration {
        self.spin_duration
    }
}

impl Default for DeadlockDetectionConfiguration {
    fn default() -> Self {
        DeadlockDetectionBuilder::default().create()
    }
}

/// Builder for [`DeadlockDetectionConfiguration`].
#[derive(Debug, Clone)]
pub struct DeadlockDetectionBuilder {
    enabled: bool,
    spin_duration: Duration,
}

impl Default for DeadlockDetectionBuilder {
    fn default() -> Self {
        Self { enabled: false, spin_duration: default_spin_duration() }
    }
}

impl DeadlockDetectionBuilder {
    /// Sets whether deadlock detection runs for lock acquisitions.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Enables deadlock detection.
    pub fn enable(&mut self) -> &mut Self {
        self.enabled(true)
    }

    /// Disables deadlock detection.
    pub fn disable(&mut self) -> &mut Self {
        self.enabled(false)
    }

    /// Sets how long a lock owner spins before checking for a cycle.
    pub fn spin_duration(&mut self, spin_duration: Duration) -> &mut Self {
        self.spin_duration = spin_duration;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &DeadlockDetectionConfiguration) -> &mut Self {
        self.enabled = template.enabled;
        self.spin_duration = template.spin_duration;
        self
    }
}

impl ChildBuilder for DeadlockDetectionBuilder {
    type Configuration = DeadlockDetectionConfiguration;

    fn section(&self) -> Section {
        Section::DeadlockDetection
    }

    fn validate(&self, _ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.enabled && self.spin_duration.is_zero() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "spin_duration must be nonzero when deadlock detection is enabled"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn create(&self) -> DeadlockDetectionConfiguration {
        DeadlockDetectionConfiguration {
            enabled: self.enabled,
            spin_duration: self.spin_duration,
        }
    }
}
