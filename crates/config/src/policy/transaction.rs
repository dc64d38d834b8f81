//! Transactional policies: isolation level, lock acquisition mode, and
//! whether a cache is transactional at all.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Isolation level observed by transactions reading the cache.
///
/// The full ANSI ladder is representable so external tooling can name any
/// level, but the locking section only accepts `ReadCommitted` and
/// `RepeatableRead`; the others are rejected at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationLevel {
    /// No isolation guarantees.
    None,
    /// Dirty reads are visible.
    ReadUncommitted,
    /// Reads only see committed data.
    ReadCommitted,
    /// Reads within one transaction are stable.
    RepeatableRead,
    /// Full serializability.
    Serializable,
}

impl IsolationLevel {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] =
        &["none", "read-uncommitted", "read-committed", "repeatable-read", "serializable"];

    const KIND: &'static str = "isolation level";
    const COUNT: u8 = 5;

    /// Returns the external token for this level.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            IsolationLevel::None => "none",
            IsolationLevel::ReadUncommitted => "read-uncommitted",
            IsolationLevel::ReadCommitted => "read-committed",
            IsolationLevel::RepeatableRead => "repeatable-read",
            IsolationLevel::Serializable => "serializable",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// an isolation level.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "none" => Ok(IsolationLevel::None),
            "read-uncommitted" => Ok(IsolationLevel::ReadUncommitted),
            "read-committed" => Ok(IsolationLevel::ReadCommitted),
            "repeatable-read" => Ok(IsolationLevel::RepeatableRead),
            "serializable" => Ok(IsolationLevel::Serializable),
            _ => Err(ConfigurationError::UnknownToken {
                kind: Self::KIND,
                token: token.to_string(),
                expected: Self::TOKENS,
            }),
        }
    }

    /// Returns the declaration-order ordinal of this level.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Decodes a declaration-order ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::OrdinalOutOfRange`] for ordinals >= 5.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, ConfigurationError> {
        match ordinal {
            0 => Ok(IsolationLevel::None),
            1 => Ok(IsolationLevel::ReadUncommitted),
            2 => Ok(IsolationLevel::ReadCommitted),
            3 => Ok(IsolationLevel::RepeatableRead),
            4 => Ok(IsolationLevel::Serializable),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for IsolationLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

// =========================================================================
// LockingMode
// =========================================================================

/// When a transaction acquires locks on the keys it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LockingMode {
    /// Locks are acquired at prepare time.
    Optimistic,
    /// Locks are acquired as each write executes.
    Pessimistic,
}

impl LockingMode {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] = &["optimistic", "pessimistic"];

    const KIND: &'static str = "locking mode";
    const COUNT: u8 = 2;

    /// Returns the external token for this mode.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            LockingMode::Optimistic => "optimistic",
            LockingMode::Pessimistic => "pessimistic",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// a locking mode.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "optimistic" => Ok(LockingMode::Optimistic),
            "pessimistic" => Ok(LockingMode::Pessimistic),
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
    /// Returns [`ConfigurationError::OrdinalOutOfRange`] for ordinals >= 2.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, ConfigurationError> {
        match ordinal {
            0 => Ok(LockingMode::Optimistic),
            1 => Ok(LockingMode::Pessimistic),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }
}

impl fmt::Display for LockingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for LockingMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

// =========================================================================
// TransactionMode
// =========================================================================

/// Whether cache operations run inside transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionMode {
    /// Operations are individual, non-transactional invocations.
    NonTransactional,
    /// Operations enlist in a transaction.
    Transactional,
}

impl TransactionMode {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] = &["non-transactional", "transactional"];

    const KIND: &'static str = "transaction mode";
    const COUNT: u8 = 2;

    /// Returns the external token for this mode.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            TransactionMode::NonTransactional => "non-transactional",
            TransactionMode::Transactional => "transactional",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// a transaction mode.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "non-transactional" => Ok(TransactionMode::NonTransactional),
            "transactional" => Ok(TransactionMode::Transactional),
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
    /// Returns [`ConfigurationError::OrdinalOutOfRange`] for ordinals >= 2.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, ConfigurationError> {
        match ordinal {
            0 => Ok(TransactionMode::NonTransactional),
            1 => Ok(TransactionMode::Transactional),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }

    /// True when operations enlist in transactions.
    #[must_use]
    pub const fn is_transactional(self) -> bool {
        matches!(self, TransactionMode::Transactional)
    }
}

impl fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for TransactionMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}
