//! Indexing policies: which nodes index which entries, and where the
//! index itself lives.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Which entries a node indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Index {
    /// Every node indexes every entry it sees.
    All,
    /// Each node indexes only the entries it stores locally.
    Local,
    /// Indexing is disabled.
    None,
    /// Only the primary owner of an entry indexes it.
    PrimaryOwner,
}

impl Index {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] = &["all", "local", "none", "primary-owner"];

    const KIND: &'static str = "index mode";
    const COUNT: u8 = 4;

    /// Returns the external token for this mode.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Index::All => "all",
            Index::Local => "local",
            Index::None => "none",
            Index::PrimaryOwner => "primary-owner",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// an index mode.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "all" => Ok(Index::All),
            "local" => Ok(Index::Local),
            "none" => Ok(Index::None),
            "primary-owner" => Ok(Index::PrimaryOwner),
            _ => Err(ConfigurationError::UnknownToken {
                kind: Self::KIND,
                token: token.to_string(),
                expected: Self::TOKENS,
            }),
        }
    }

    /// Returns the declaration-order ordinal of this mode.
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
            0 => Ok(Index::All),
            1 => Ok(Index::Local),
            2 => Ok(Index::None),
            3 => Ok(Index::PrimaryOwner),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }

    /// True when any indexing happens at all.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Index::None)
    }

    /// True when each node indexes only its locally stored entries.
    #[must_use]
    pub const fn is_local_only(self) -> bool {
        matches!(self, Index::Local)
    }

    /// True when only primary owners index their entries.
    #[must_use]
    pub const fn is_primary_owner_only(self) -> bool {
        matches!(self, Index::PrimaryOwner)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Index {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

// =========================================================================
// IndexStorage
// =========================================================================

/// Where the index for an indexed cache is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IndexStorage {
    /// Index segments persisted on the node's filesystem.
    Filesystem,
    /// Index kept on the heap, rebuilt on restart.
    LocalHeap,
}

impl IndexStorage {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] = &["filesystem", "local-heap"];

    const KIND: &'static str = "index storage";
    const COUNT: u8 = 2;

    /// Returns the external token for this storage kind.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            IndexStorage::Filesystem => "filesystem",
            IndexStorage::LocalHeap => "local-heap",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// an index storage kind.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "filesystem" => Ok(IndexStorage::Filesystem),
            "local-heap" => Ok(IndexStorage::LocalHeap),
            _ => Err(ConfigurationError::UnknownToken {
                kind: Self::KIND,
                token: token.to_string(),
                expected: Self::TOKENS,
            }),
        }
    }

    /// Returns the declaration-order ordinal of this storage kind.
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
            0 => Ok(IndexStorage::Filesystem),
            1 => Ok(IndexStorage::LocalHeap),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }

    /// True when the index survives a node restart.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        matches!(self, IndexStorage::Filesystem)
    }
}

impl fmt::Display for IndexStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for IndexStorage {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}
