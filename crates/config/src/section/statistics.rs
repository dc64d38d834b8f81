//! Statistics configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;

/// Controls whether per-cache statistics are collected and exposed to
/// management tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JmxStatisticsConfiguration {
    /// Whether statistics are collected. Default: false.
    #[serde(default)]
    enabled: bool,
}

impl JmxStatisticsConfiguration {
    /// Whether statistics are collected.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Builder for [`JmxStatisticsConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct JmxStatisticsBuilder {
    enabled: bool,
}

impl JmxStatisticsBuilder {
    /// Sets whether statistics are collected.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Enables statistics collection.
    pub fn enable(&mut self) -> &mut Self {
        self.enabled(true)
    }

    /// Disables statistics collection.
    pub fn disable(&mut self) -> &mut Self {
        self.enabled(false)
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &JmxStatisticsConfiguration) -> &mut Self {
        self.enabled = template.enabled;
        self
    }
}

impl ChildBuilder for JmxStatisticsBuilder {
    type Configuration = JmxStatisticsConfiguration;

    fn section(&self) -> Section {
        Section::JmxStatistics
    }

    fn validate(&self, _ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        Ok(())
    }

    fn create(&self) -> JmxStatisticsConfiguration {
        JmxStatisticsConfiguration { enabled: self.enabled }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_disabled_by_default() {
        let builder = JmxStatisticsBuilder::default();
        builder.validate(&ValidationContext::default()).unwrap();
        assert!(!builder.create().enabled());
    }

    #[test]
    fn test_enable_and_disable() {
        let mut builder = JmxStatisticsBuilder::default();
        assert!(builder.enable().create().enabled());
        assert!(!builder.disable().create().enabled());
    }

    #[test]
    fn test_serde_defaults() {
        let config: JmxStatisticsConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(config, JmxStatisticsConfiguration::default());
    }
}
