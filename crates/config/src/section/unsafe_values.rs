//! Unsafe behavior flags.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;

/// Flags that trade correctness guarantees for speed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UnsafeConfiguration {
    /// Whether write operations may return a stale or absent previous
    /// value instead of fetching it from the owner. Default: false.
    #[serde(default)]
    unreliable_return_values: bool,
}

impl UnsafeConfiguration {
    /// Whether write operations may skip fetching the previous value.
    #[must_use]
    pub const fn unreliable_return_values(&self) -> bool {
        self.unreliable_return_values
    }
}

/// Builder for [`UnsafeConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct UnsafeBuilder {
    unreliable_return_values: bool,
}

impl UnsafeBuilder {
    /// Sets whether write operations may skip fetching the previous
    /// value.
    pub fn unreliable_return_values(&mut self, unreliable_return_values: bool) -> &mut Self {
        self.unreliable_return_values = unreliable_return_values;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &UnsafeConfiguration) -> &mut Self {
        self.unreliable_return_values = template.unreliable_return_values;
        self
    }
}

impl ChildBuilder for UnsafeBuilder {
    type Configuration = UnsafeConfiguration;

    fn section(&self) -> Section {
        Section::UnsafeValues
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.unreliable_return_values && !ctx.cache_mode.is_distributed() {
            warn!(
                cache_mode = %ctx.cache_mode,
                "unreliable_return_values only skips remote fetches in distributed modes"
            );
        }
        Ok(())
    }

    fn create(&self) -> UnsafeConfiguration {
        UnsafeConfiguration { unreliable_return_values: self.unreliable_return_values }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::policy::CacheMode;

    #[test]
    fn test_defaults_are_valid() {
        let builder = UnsafeBuilder::default();
        builder.validate(&ValidationContext::default()).unwrap();
        assert!(!builder.create().unreliable_return_values());
    }

    #[test]
    fn test_unreliable_return_values_valid_in_any_mode() {
        let mut builder = UnsafeBuilder::default();
        builder.unreliable_return_values(true);
        builder.validate(&ValidationContext::default()).unwrap();

        let ctx = ValidationContext {
            cache_mode: CacheMode::DistAsync,
            ..ValidationContext::default()
        };
        builder.validate(&ctx).unwrap();
        assert!(builder.create().unreliable_return_values());
    }

    #[test]
    fn test_serde_defaults() {
        let config: UnsafeConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(config, UnsafeConfiguration::default());
    }
}
