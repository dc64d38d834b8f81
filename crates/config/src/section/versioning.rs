//! Entry versioning configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::builder::{ChildBuilder, Section, ValidationContext};
use crate::error::ConfigurationError;
use crate::policy::VersioningScheme;

fn default_versioning_scheme() -> VersioningScheme {
    VersioningScheme::None
}

/// Entry versioning settings. Versioned entries carry a monotonic
/// version used to detect conflicting concurrent writes.
///
/// # Validation Rules
///
/// - an enabled versioning section requires a scheme that generates
///   versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VersioningConfiguration {
    /// Whether entries carry versions. Default: false.
    #[serde(default)]
    enabled: bool,
    /// How versions are generated. Default: none.
    #[serde(default = "default_versioning_scheme")]
    scheme: VersioningScheme,
}

impl VersioningConfiguration {
    /// Whether entries carry versions.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// How versions are generated.
    #[must_use]
    pub const fn scheme(&self) -> VersioningScheme {
        self.scheme
    }
}

impl Default for VersioningConfiguration {
    fn default() -> Self {
        VersioningBuilder::default().create()
    }
}

/// Builder for [`VersioningConfiguration`].
#[derive(Debug, Clone)]
pub struct VersioningBuilder {
    pub(crate) enabled: bool,
    pub(crate) scheme: VersioningScheme,
}

impl Default for VersioningBuilder {
    fn default() -> Self {
        Self { enabled: false, scheme: default_versioning_scheme() }
    }
}

impl VersioningBuilder {
    /// Sets whether entries carry versions.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Enables versioning.
    pub fn enable(&mut self) -> &mut Self {
        self.enabled(true)
    }

    /// Disables versioning.
    pub fn disable(&mut self) -> &mut Self {
        self.enabled(false)
    }

    /// Sets how versions are generated.
    pub fn scheme(&mut self, scheme: VersioningScheme) -> &mut Self {
        self.scheme = scheme;
        self
    }

    /// Resets this builder from a built record.
    pub fn read(&mut self, template: &VersioningConfiguration) -> &mut Self {
        self.enabled = template.enabled;
        self.scheme = template.scheme;
        self
    }
}

impl ChildBuilder for VersioningBuilder {
    type Configuration = VersioningConfiguration;

    fn section(&self) -> Section {
        Section::Versioning
    }

    fn validate(&self, _ctx: &ValidationContext) -> Result<(), ConfigurationError> {
        if self.enabled && !self.scheme.is_enabled() {
            return Err(ConfigurationError::Validation {
                section: self.section(),
                message: "versioning is enabled but the scheme generates no versions"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn create(&self) -> VersioningConfiguration {
        VersioningConfiguration { enabled: self.enabled, scheme: self.scheme }
    }
}
