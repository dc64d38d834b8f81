//! Topology and partition policies: cache mode, split-brain handling,
//! conflict merge resolution.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Replication topology of a cache, combined with its synchronicity.
///
/// `Local` caches never talk to other nodes. Replicated modes copy every
/// entry to every node, invalidation modes only broadcast removals, and
/// distributed modes place each entry on a bounded number of owners.
///
/// Declaration order is the ordinal encoding and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    /// Entries live only on the node that wrote them.
    Local,
    /// Every entry is copied to every node, writes block on the cluster.
    ReplSync,
    /// Every entry is copied to every node, writes return immediately.
    ReplAsync,
    /// Writes broadcast an invalidation for the key, synchronously.
    InvalidationSync,
    /// Writes broadcast an invalidation for the key, asynchronously.
    InvalidationAsync,
    /// Entries are stored on `num_owners` nodes, writes block on the owners.
    DistSync,
    /// Entries are stored on `num_owners` nodes, writes return immediately.
    DistAsync,
}

impl CacheMode {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] = &[
        "local",
        "repl-sync",
        "repl-async",
        "invalidation-sync",
        "invalidation-async",
        "dist-sync",
        "dist-async",
    ];

    const KIND: &'static str = "cache mode";
    const COUNT: u8 = 7;

    /// Returns the external token for this mode.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            CacheMode::Local => "local",
            CacheMode::ReplSync => "repl-sync",
            CacheMode::ReplAsync => "repl-async",
            CacheMode::InvalidationSync => "invalidation-sync",
            CacheMode::InvalidationAsync => "invalidation-async",
            CacheMode::DistSync => "dist-sync",
            CacheMode::DistAsync => "dist-async",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// a cache mode.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "local" => Ok(CacheMode::Local),
            "repl-sync" => Ok(CacheMode::ReplSync),
            "repl-async" => Ok(CacheMode::ReplAsync),
            "invalidation-sync" => Ok(CacheMode::InvalidationSync),
            "invalidation-async" => Ok(CacheMode::InvalidationAsync),
            "dist-sync" => Ok(CacheMode::DistSync),
            "dist-async" => Ok(CacheMode::DistAsync),
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
    /// Returns [`ConfigurationError::OrdinalOutOfRange`] for ordinals >= 7;
    /// out-of-range values are never wrapped or clamped.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, ConfigurationError> {
        match ordinal {
            0 => Ok(CacheMode::Local),
            1 => Ok(CacheMode::ReplSync),
            2 => Ok(CacheMode::ReplAsync),
            3 => Ok(CacheMode::InvalidationSync),
            4 => Ok(CacheMode::InvalidationAsync),
            5 => Ok(CacheMode::DistSync),
            6 => Ok(CacheMode::DistAsync),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }

    /// True for every mode that involves other nodes.
    #[must_use]
    pub const fn is_clustered(self) -> bool {
        !matches!(self, CacheMode::Local)
    }

    /// True for the distributed modes.
    #[must_use]
    pub const fn is_distributed(self) -> bool {
        matches!(self, CacheMode::DistSync | CacheMode::DistAsync)
    }

    /// True for the replicated modes.
    #[must_use]
    pub const fn is_replicated(self) -> bool {
        matches!(self, CacheMode::ReplSync | CacheMode::ReplAsync)
    }

    /// True for the invalidation modes.
    #[must_use]
    pub const fn is_invalidation(self) -> bool {
        matches!(self, CacheMode::InvalidationSync | CacheMode::InvalidationAsync)
    }

    /// True when writes block until the cluster has acknowledged them.
    /// `Local` counts as synchronous.
    #[must_use]
    pub const fn is_synchronous(self) -> bool {
        matches!(
            self,
            CacheMode::Local
                | CacheMode::ReplSync
                | CacheMode::InvalidationSync
                | CacheMode::DistSync
        )
    }

    /// Returns the synchronous counterpart of this mode. `Local` maps to
    /// itself.
    #[must_use]
    pub const fn to_sync(self) -> Self {
        match self {
            CacheMode::ReplAsync => CacheMode::ReplSync,
            CacheMode::InvalidationAsync => CacheMode::InvalidationSync,
            CacheMode::DistAsync => CacheMode::DistSync,
            other => other,
        }
    }

    /// Returns the asynchronous counterpart of this mode. `Local` maps to
    /// itself.
    #[must_use]
    pub const fn to_async(self) -> Self {
        match self {
            CacheMode::ReplSync => CacheMode::ReplAsync,
            CacheMode::InvalidationSync => CacheMode::InvalidationAsync,
            CacheMode::DistSync => CacheMode::DistAsync,
            other => other,
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for CacheMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

// =========================================================================
// PartitionHandling
// =========================================================================

/// Availability policy applied when the cluster splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionHandling {
    /// Every partition stays fully available and entries may diverge.
    AllowReadWrites,
    /// Minority partitions degrade to read-only.
    AllowReads,
    /// Minority partitions reject both reads and writes.
    DenyReadWrites,
}

impl PartitionHandling {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] =
        &["allow-read-writes", "allow-reads", "deny-read-writes"];

    const KIND: &'static str = "partition handling";
    const COUNT: u8 = 3;

    /// Returns the external token for this policy.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            PartitionHandling::AllowReadWrites => "allow-read-writes",
            PartitionHandling::AllowReads => "allow-reads",
            PartitionHandling::DenyReadWrites => "deny-read-writes",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// a partition handling policy.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "allow-read-writes" => Ok(PartitionHandling::AllowReadWrites),
            "allow-reads" => Ok(PartitionHandling::AllowReads),
            "deny-read-writes" => Ok(PartitionHandling::DenyReadWrites),
            _ => Err(ConfigurationError::UnknownToken {
                kind: Self::KIND,
                token: token.to_string(),
                expected: Self::TOKENS,
            }),
        }
    }

    /// Returns the declaration-order ordinal of this policy.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Decodes a declaration-order ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::OrdinalOutOfRange`] for ordinals >= 3.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, ConfigurationError> {
        match ordinal {
            0 => Ok(PartitionHandling::AllowReadWrites),
            1 => Ok(PartitionHandling::AllowReads),
            2 => Ok(PartitionHandling::DenyReadWrites),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }

    /// True when a minority partition may still serve reads.
    #[must_use]
    pub const fn allows_reads(self) -> bool {
        !matches!(self, PartitionHandling::DenyReadWrites)
    }

    /// True when a minority partition may still accept writes.
    #[must_use]
    pub const fn allows_writes(self) -> bool {
        matches!(self, PartitionHandling::AllowReadWrites)
    }
}

impl fmt::Display for PartitionHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for PartitionHandling {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

// =========================================================================
// MergePolicy
// =========================================================================

/// Conflict resolution applied when split partitions merge back together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Conflicts are left as-is; readers see whichever copy their node has.
    None,
    /// The preferred (topology-majority) partition's entry always wins.
    PreferredAlways,
    /// The preferred partition's entry wins unless it is a removal.
    PreferredNonNull,
    /// Conflicting entries are removed from all partitions.
    RemoveAll,
}

impl MergePolicy {
    /// Every token this enum recognizes, in ordinal order.
    pub const TOKENS: &'static [&'static str] =
        &["none", "preferred-always", "preferred-non-null", "remove-all"];

    const KIND: &'static str = "merge policy";
    const COUNT: u8 = 4;

    /// Returns the external token for this policy.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            MergePolicy::None => "none",
            MergePolicy::PreferredAlways => "preferred-always",
            MergePolicy::PreferredNonNull => "preferred-non-null",
            MergePolicy::RemoveAll => "remove-all",
        }
    }

    /// Parses an external token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownToken`] if `token` does not name
    /// a merge policy.
    pub fn from_token(token: &str) -> Result<Self, ConfigurationError> {
        match token {
            "none" => Ok(MergePolicy::None),
            "preferred-always" => Ok(MergePolicy::PreferredAlways),
            "preferred-non-null" => Ok(MergePolicy::PreferredNonNull),
            "remove-all" => Ok(MergePolicy::RemoveAll),
            _ => Err(ConfigurationError::UnknownToken {
                kind: Self::KIND,
                token: token.to_string(),
                expected: Self::TOKENS,
            }),
        }
    }

    /// Returns the declaration-order ordinal of this policy.
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
            0 => Ok(MergePolicy::None),
            1 => Ok(MergePolicy::PreferredAlways),
            2 => Ok(MergePolicy::PreferredNonNull),
            3 => Ok(MergePolicy::RemoveAll),
            _ => Err(ConfigurationError::OrdinalOutOfRange {
                kind: Self::KIND,
                ordinal,
                count: Self::COUNT,
            }),
        }
    }

    /// True when merging actively resolves conflicting entries.
    #[must_use]
    pub const fn resolves_conflicts(self) -> bool {
        !matches!(self, MergePolicy::None)
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for MergePolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn all_cache_modes() -> Vec<CacheMode> {
        vec![
            CacheMode::Local,
            CacheMode::ReplSync,
            CacheMode::ReplAsync,
            CacheMode::InvalidationSync,
            CacheMode::InvalidationAsync,
            CacheMode::DistSync,
            CacheMode::DistAsync,
        ]
    }

    #[test]
    fn test_cache_mode_token_round_trip() {
        for mode in all_cache_modes() {
            assert_eq!(CacheMode::from_token(mode.token()).unwrap(), mode);
        }
    }

    #[test]
    fn test_cache_mode_token_matches_declared_list() {
        for (i, mode) in all_cache_modes().into_iter().enumerate() {
            assert_eq!(CacheMode::TOKENS[i], mode.token());
        }
    }

    #[test]
    fn test_cache_mode_unknown_token() {
        let err = CacheMode::from_token("repl_sync").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownToken { kind: "cache mode", .. }));
    }

    #[test]
    fn test_cache_mode_ordinal_round_trip() {
        for (i, mode) in all_cache_modes().into_iter().enumerate() {
            assert_eq!(mode.ordinal(), u8::try_from(i).unwrap());
            assert_eq!(CacheMode::from_ordinal(mode.ordinal()).unwrap(), mode);
        }
    }

    #[test]
    fn test_cache_mode_ordinal_out_of_range() {
        for ordinal in [7u8, 8, u8::MAX] {
            let err = CacheMode::from_ordinal(ordinal).unwrap_err();
            assert!(matches!(
                err,
                ConfigurationError::OrdinalOutOfRange { ordinal: o, count: 7, .. } if o == ordinal
            ));
        }
    }

    #[test]
    fn test_cache_mode_serde_token_agreement() {
        for mode in all_cache_modes() {
            let json = serde_json::to_value(mode).unwrap();
            assert_eq!(json.as_str().unwrap(), mode.token());
            let back: CacheMode = serde_json::from_value(json).unwrap();
            assert_eq!(back, mode);
        }
    }

    #[test]
    fn test_cache_mode_predicates() {
        let cases = [
            // (mode, clustered, distributed, replicated, invalidation, synchronous)
            (CacheMode::Local, false, false, false, false, true),
            (CacheMode::ReplSync, true, false, true, false, true),
            (CacheMode::ReplAsync, true, false, true, false, false),
            (CacheMode::InvalidationSync, true, false, false, true, true),
            (CacheMode::InvalidationAsync, true, false, false, true, false),
            (CacheMode::DistSync, true, true, false, false, true),
            (CacheMode::DistAsync, true, true, false, false, false),
        ];
        for (mode, clustered, distributed, replicated, invalidation, synchronous) in cases {
            assert_eq!(mode.is_clustered(), clustered, "{mode}");
            assert_eq!(mode.is_distributed(), distributed, "{mode}");
            assert_eq!(mode.is_replicated(), replicated, "{mode}");
            assert_eq!(mode.is_invalidation(), invalidation, "{mode}");
            assert_eq!(mode.is_synchronous(), synchronous, "{mode}");
        }
    }

    #[test]
    fn test_cache_mode_sync_async_converters() {
        assert_eq!(CacheMode::ReplAsync.to_sync(), CacheMode::ReplSync);
        assert_eq!(CacheMode::DistSync.to_async(), CacheMode::DistAsync);
        assert_eq!(CacheMode::Local.to_sync(), CacheMode::Local);
        assert_eq!(CacheMode::Local.to_async(), CacheMode::Local);
    }

    #[test]
    fn test_cache_mode_display_from_str() {
        let mode: CacheMode = "dist-sync".parse().unwrap();
        assert_eq!(mode, CacheMode::DistSync);
        assert_eq!(mode.to_string(), "dist-sync");
    }

    #[test]
    fn test_partition_handling_token_and_ordinal() {
        let cases = [
            (PartitionHandling::AllowReadWrites, "allow-read-writes", 0),
            (PartitionHandling::AllowReads, "allow-reads", 1),
            (PartitionHandling::DenyReadWrites, "deny-read-writes", 2),
        ];
        for (policy, token, ordinal) in cases {
            assert_eq!(policy.token(), token);
            assert_eq!(PartitionHandling::from_token(token).unwrap(), policy);
            assert_eq!(policy.ordinal(), ordinal);
            assert_eq!(PartitionHandling::from_ordinal(ordinal).unwrap(), policy);
        }
        assert!(PartitionHandling::from_token("deny").is_err());
        assert!(PartitionHandling::from_ordinal(3).is_err());
    }

    #[test]
    fn test_partition_handling_predicates() {
        assert!(PartitionHandling::AllowReadWrites.allows_reads());
        assert!(PartitionHandling::AllowReadWrites.allows_writes());
        assert!(PartitionHandling::AllowReads.allows_reads());
        assert!(!PartitionHandling::AllowReads.allows_writes());
        assert!(!PartitionHandling::DenyReadWrites.allows_reads());
        assert!(!PartitionHandling::DenyReadWrites.allows_writes());
    }

    #[test]
    fn test_merge_policy_token_and_ordinal() {
        let cases = [
            (MergePolicy::None, "none", 0),
            (MergePolicy::PreferredAlways, "preferred-always", 1),
            (MergePolicy::PreferredNonNull, "preferred-non-null", 2),
            (MergePolicy::RemoveAll, "remove-all", 3),
        ];
        for (policy, token, ordinal) in cases {
            assert_eq!(policy.token(), token);
            assert_eq!(MergePolicy::from_token(token).unwrap(), policy);
            assert_eq!(policy.ordinal(), ordinal);
            assert_eq!(MergePolicy::from_ordinal(ordinal).unwrap(), policy);
        }
        assert!(MergePolicy::from_ordinal(4).is_err());
    }

    #[test]
    fn test_merge_policy_resolves_conflicts() {
        assert!(!MergePolicy::None.resolves_conflicts());
        assert!(MergePolicy::PreferredAlways.resolves_conflicts());
        assert!(MergePolicy::PreferredNonNull.resolves_conflicts());
        assert!(MergePolicy::RemoveAll.resolves_conflicts());
    }

    mod proptest_cache_mode {
        use proptest::prelude::*;

        use super::*;

        fn arb_cache_mode() -> impl Strategy<Value = CacheMode> {
            proptest::sample::select(all_cache_modes())
        }

        proptest! {
            /// Tokens survive a full parse-format-parse cycle.
            #[test]
            fn prop_token_round_trip(mode in arb_cache_mode()) {
                let reparsed = CacheMode::from_token(mode.token()).unwrap();
                prop_assert_eq!(reparsed, mode);
                prop_assert_eq!(CacheMode::from_token(reparsed.token()).unwrap(), reparsed);
            }

            /// Ordinals decode back to the mode they came from.
            #[test]
            fn prop_ordinal_round_trip(mode in arb_cache_mode()) {
                prop_assert_eq!(CacheMode::from_ordinal(mode.ordinal()).unwrap(), mode);
            }

            /// `to_sync` always yields a synchronous mode, preserves the
            /// topology, and is idempotent; same for `to_async` mirrored.
            #[test]
            fn prop_sync_async_preserve_topology(mode in arb_cache_mode()) {
                let sync = mode.to_sync();
                prop_assert!(sync.is_synchronous());
                prop_assert_eq!(sync.is_distributed(), mode.is_distributed());
                prop_assert_eq!(sync.is_replicated(), mode.is_replicated());
                prop_assert_eq!(sync.is_invalidation(), mode.is_invalidation());
                prop_assert_eq!(sync.to_sync(), sync);

                let async_mode = mode.to_async();
                prop_assert_eq!(async_mode.is_distributed(), mode.is_distributed());
                prop_assert_eq!(async_mode.to_async(), async_mode);
            }
        }
    }
}
