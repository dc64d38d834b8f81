//! Immutable cache configuration model and builder tree for GridStore.
//!
//! This crate provides the configuration layer used to assemble caches:
//! - Policy enums with stable tokens and ordinals (cache mode, eviction
//!   strategy, isolation level, etc.)
//! - Immutable per-section configuration records with read-only accessors
//! - A builder tree with fluent setters, deferred validation, and a fixed
//!   validate-then-create build order
//! - Error types using snafu

pub mod builder;
pub mod configuration;
pub mod error;
pub mod policy;
pub mod section;

// Re-export commonly used types at crate root
pub use builder::{ChildBuilder, Section, ValidationContext};
pub use configuration::{Configuration, ConfigurationBuilder};
pub use error::{ConfigurationError, Result};
pub use policy::*;
pub use section::*;
