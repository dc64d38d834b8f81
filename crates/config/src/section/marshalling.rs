//! Binary storage configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;

fn default_store_keys_as_binary() -> bool {
    true
}

fn default_store_values_as_binary() -> bool {
    true
}

/// Controls whether entries are kept in serialized form instead of as
/// live objects, which avoids re-serialization on every remote call.
///
/// # Validation Rules
///
/// - when enabled, at least one of keys or values must be stored as
///   binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoreAsBinaryConfiguration {
    /// Whether entries are kept serialized. Default: false.
    #[serde(default)]
    enabled: bool,
    /// Whether keys are kept serialized. Default: true.
    #[serde(default = "default_store_keys_as_binary")]
    store_keys_as_binary: bool,
    /// Whether values are kept serialized. Default: true.
    #[serde(default = "default_store_values_as_binary")]
    store_values_as_binary: bool,
}

impl StoreAsBinaryConfiguration {
    /// Whether entries are kept serialized.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether keys are kept serialized.
    #[must_use]
    pub const fn store_keys_as_binary(&self) -> bool {
        self.store_keys_as_binary
    }

    /// Whether values are kept serialized.
    #[must_use]
    pub const fn store_values_as_binary(&self) -> bool {
        self.store_values_as_binary
    }
}

impl Default for StoreAsBinaryConfiguration {
    fn default() -> Self {
        StoreAsBinaryBuilder::default().create()
    }
}

/// Builder for [`StoreAsBinaryConfiguration`].
#[derive(Debug, Clone)]
pub struct StoreAsBinaryBuilder {
    enabled: bool,
    store_keys_as_binary: bool,
    store_values_as_binary: bool,
}

impl Default for StoreAsBinaryBuilder {
    fn default() -> Self {
        Self {
            enabled: false,
            store_keys_as_binary: default_store_keys_as_binary(),
            store_values_as_binary: default_store_values_as_binary(),
        }
    }
}

impl StoreAsBinaryBuilder {
    /// Sets whether entries are kept serialized.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Enables binary storage.
    pub fn enable(&mut self) -> &mut Self {
        self.enabled(true)
    }

    /// Disables binary storage.
    pub fn disable(&mut self) -> &mut Self {
        self.enabled(false)
    }

    /// Sets whether keys are kept serialized.
    pub fn store_keys_as_binary(&mut self, store_keys_as_binary: bool) -> &mut Self {
        self.store_keys_as_binary = store_keys_as_binary;
        self
    }

    /// Sets whether values are kept serialized.
    pub fn store_values_as_binary(&mut self, store_values_as_binary: bool) -> &mut Self {
        self.store_values_as_binary = store_values_as_binary;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &StoreAsBinaryConfiguration) -> &mut Self {
        self.enabled = template.enabled;
        self.store_keys_as_binary = template.store_keys_as_binary;
        self.store_values_as_binary = template.store_values_as_binary;
        self
    }
}

impl ChildBuilder for StoreAsBinaryBuilder {
    type Configuration = StoreAsBinaryConfiguration;

    fn section(&self) -> Section {
        Section::StoreAsBinary
    }

    fn validate(&self, _ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.enabled && !self.store_keys_as_binary && !self.store_values_as_binary {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "binary storage is enabled but neither keys nor values are stored \
                          as binary"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn create(&self) -> StoreAsBinaryConfiguration {
        StoreAsBinaryConfiguration {
            enabled: self.enabled,
            store_keys_as_binary: self.store_keys_as_binary,
            store_values_as_binary: self.store_values_as_binary,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let builder = StoreAsBinaryBuilder::default();
        builder.validate(&ValidationContext::default()).unwrap();
        let config = builder.create();
        assert!(!config.enabled());
        assert!(config.store_keys_as_binary());
        assert!(config.store_values_as_binary());
    }

    #[test]
    fn test_enabled_requires_keys_or_values() {
        let mut builder = StoreAsBinaryBuilder::default();
        builder.enable().store_keys_as_binary(false).store_values_as_binary(false);
        let err = builder.validate(&ValidationContext::default()).unwrap_err();
        assert_eq!(err.section(), Some(Section::StoreAsBinary));
        assert!(err.to_string().contains("neither"));

        builder.store_values_as_binary(true);
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_disabled_skips_key_value_check() {
        let mut builder = StoreAsBinaryBuilder::default();
        builder.store_keys_as_binary(false).store_values_as_binary(false);
        builder.validate(&ValidationContext::default()).unwrap();
    }

    #[test]
    fn test_create_twice_yields_equal_independent_records() {
        let mut builder = StoreAsBinaryBuilder::default();
        builder.enable();
        let first = builder.create();
        assert_eq!(first, builder.create());

        builder.store_keys_as_binary(false);
        assert!(first.store_keys_as_binary());
        assert_ne!(builder.create(), first);
    }

    #[test]
    fn test_serde_defaults() {
        let config: StoreAsBinaryConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StoreAsBinaryConfiguration::default());
    }
}
