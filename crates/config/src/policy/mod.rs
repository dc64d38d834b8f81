//! Enumerated policy types.
//!
//! Each policy enum is a closed set of named behaviors with three stable
//! representations: the Rust variant, a kebab-case token (the external
//! string form, also used by serde), and a declaration-order ordinal (the
//! compact numeric form). Token and ordinal mappings are total and
//! injective; an unrecognized token or out-of-range ordinal is a
//! [`ConfigurationError`](crate::ConfigurationError), never a default.
//!
//! Behavior flags derived from a variant (`is_clustered`, `is_local_only`,
//! ...) are computed predicates, not stored state.

mod clustering;
mod indexing;
mod storage;
mod transaction;

pub use clustering::*;
pub use indexing::*;
pub use storage::*;
pub use transaction::*;
