//! Error types for configuration assembly.
//!
//! Every failure in this crate is a [`ConfigurationError`]. Parse failures
//! (unknown tokens, out-of-range ordinals) are raised where the bad value is
//! seen; validation failures are collected by the builder tree's validation
//! pass and abort the build before any record is created.

use snafu::Snafu;

use crate::builder::Section;

/// Result alias for configuration operations.
pub type Result<T, E = ConfigurationError> = std::result::Result<T, E>;

/// Error raised while parsing policy tokens or building a configuration.
///
/// `Validation` is the user-facing kind: the accumulated builder settings
/// violate a documented rule, and the message names the rule.
/// `InvariantViolation` trips only after validation has already passed,
/// when the assembled records still disagree; it points at this crate,
/// not at the input.
#[derive(Debug, Snafu)]
pub enum ConfigurationError {
    /// A token does not name any variant of a policy enum.
    #[snafu(display("unknown {kind} token {token:?}, expected one of {expected:?}"))]
    UnknownToken {
        /// The policy enum the token was parsed against.
        kind: &'static str,
        /// The rejected token.
        token: String,
        /// Every token the enum recognizes.
        expected: &'static [&'static str],
    },

    /// An ordinal does not map to any variant of a policy enum.
    #[snafu(display("{kind} ordinal {ordinal} out of range, expected 0..{count}"))]
    OrdinalOutOfRange {
        /// The policy enum the ordinal was decoded against.
        kind: &'static str,
        /// The rejected ordinal.
        ordinal: u8,
        /// Number of declared variants.
        count: u8,
    },

    /// A builder's accumulated settings violate a validation rule.
    #[snafu(display("invalid {section} configuration: {message}"))]
    Validation {
        /// The section builder that rejected its settings.
        section: Section,
        /// Description of the violated rule.
        message: String,
    },

    /// A cross-section invariant failed after validation had passed.
    #[snafu(display("configuration invariant violated in {section} section: {message}"))]
    InvariantViolation {
        /// The section the inconsistent record belongs to.
        section: Section,
        /// Description of the inconsistency.
        message: String,
    },
}

impl ConfigurationError {
    /// Returns the section a validation or invariant failure is attributed
    /// to, or `None` for parse-time failures.
    #[must_use]
    pub fn section(&self) -> Option<Section> {
        match self {
            ConfigurationError::Validation { section, .. }
            | ConfigurationError::InvariantViolation { section, .. } => Some(*section),
            ConfigurationError::UnknownToken { .. }
            | ConfigurationError::OrdinalOutOfRange { .. } => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_token_display_names_kind_and_candidates() {
        let err = ConfigurationError::UnknownToken {
            kind: "index storage",
            token: "bogus".to_string(),
            expected: &["filesystem", "local-heap"],
        };
        let text = err.to_string();
        assert!(text.contains("index storage"));
        assert!(text.contains("\"bogus\""));
        assert!(text.contains("filesystem"));
        assert!(text.contains("local-heap"));
    }

    #[test]
    fn test_ordinal_out_of_range_display() {
        let err =
            ConfigurationError::OrdinalOutOfRange { kind: "cache mode", ordinal: 9, count: 7 };
        assert_eq!(err.to_string(), "cache mode ordinal 9 out of range, expected 0..7");
    }

    #[test]
    fn test_validation_display_names_section() {
        let err = ConfigurationError::Validation {
            section: Section::SingletonStore,
            message: "push_state_timeout must be nonzero".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid singleton-store configuration: push_state_timeout must be nonzero"
        );
    }

    #[test]
    fn test_section_accessor() {
        let err = ConfigurationError::Validation {
            section: Section::Locking,
            message: "x".to_string(),
        };
        assert_eq!(err.section(), Some(Section::Locking));

        let err = ConfigurationError::UnknownToken {
            kind: "cache mode",
            token: "x".to_string(),
            expected: &[],
        };
        assert_eq!(err.section(), None);
    }
}
