//! Entry lifecycle policies: eviction strategy and entry versioning.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// How the container sheds entries when it reaches its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionStrategy {
    /// The container is unbounded; nothing is ever evicted.
    None,
    /// The container is bounded but entries are only removed by explicit
    /// application calls.
    Manual,
    /// Overflowing entries are removed (and passivated if a store is
    /// configured).
    Remove,
    /// Writes that would overflow the container fail instead of evicting.
    Exception,
}

impl EvictionStrategy {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] = &["none", "manual", "remove", "exception"];

    const KIND: &'static str = "eviction strategy";
    const COUNT: u8 = 4;

    /// Returns the external token for this strategy.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            EvictionStrategy::None => "none",
            EvictionStrategy::Manual => "manual",
            EvictionStrategy::Remove => "remove",
            EvictionStrategy::Exception => "exception",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// an eviction strategy.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "none" => Ok(EvictionStrategy::None),
            "manual" => Ok(EvictionStrategy::Manual),
            "remove" => Ok(EvictionStrategy::Remove),
            "exception" => Ok(EvictionStrategy::Exception),
            _ => Err(ConfigurationError::UnknownToken {
                kind: Self::KIND,
                token: token.to_string(),
                expected: Self::TOKENS,
            }),
        }
    }

    /// Returns the declaration-order ordinal of this strategy.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Decodes a declaration-order ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::OrdinalOutOfRange`] for ordinals >= 4.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, ConfigurationError> {
        match ordinal {
            0 => Ok(EvictionStrategy::None),
            1 => Ok(EvictionStrategy::Manual),
            2 => Ok(EvictionStrategy::Remove),
            3 => Ok(EvictionStrategy::Exception),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }

    /// True when the container actively enforces its bound.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, EvictionStrategy::Remove | EvictionStrategy::Exception)
    }

    /// True when overflow raises an error instead of evicting.
    #[must_use]
    pub const fn is_exception_based(self) -> bool {
        matches!(self, EvictionStrategy::Exception)
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for EvictionStrategy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

// =========================================================================
// VersioningScheme
// =========================================================================

/// Scheme used to version entries for write-skew detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum VersioningScheme {
    /// Entries carry no version metadata.
    None,
    /// Entries carry a simple monotonic version counter.
    Simple,
}

impl VersioningScheme {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] = &["none", "simple"];

    const KIND: &'static str = "versioning scheme";
    const COUNT: u8 = 2;

    /// Returns the external token for this scheme.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            VersioningScheme::None => "none",
            VersioningScheme::Simple => "simple",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// a versioning scheme.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "none" => Ok(VersioningScheme::None),
            "simple" => Ok(VersioningScheme::Simple),
            _ => Err(ConfigurationError::UnknownToken {
                kind: Self::KIND,
                token: token.to_string(),
                expected: Self::TOKENS,
            }),
        }
    }

    /// Returns the declaration-order ordinal of this scheme.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Decodes a declaration-order ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::OrdinalOutOfRange`] for ordinals >= 2.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, ConfigurationError> {
        match ordinal {
            0 => Ok(VersioningScheme::None),
            1 => Ok(VersioningScheme::Simple),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }

    /// True when entries carry version metadata.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, VersioningScheme::Simple)
    }
}

impl fmt::Display for VersioningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for VersioningScheme {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}
