//! Configuration sections: one immutable record plus one builder per
//! configuration area.
//!
//! Every file pairs the records of one area with the builders that
//! assemble them. Builders hold plain mutable fields and defer all
//! checking to `validate`; records are only ever constructed by `create`
//! after the whole tree validated, so no published record can hold a
//! rejected combination. Defaults are shared between serde, `Default`,
//! and the builders through the `default_*` functions in each file.

mod clustering;
mod indexing;
mod locking;
mod marshalling;
mod memory;
mod persistence;
mod statistics;
mod transaction;
mod unsafe_values;
mod versioning;

pub use clustering::*;
pub use indexing::*;
pub use locking::*;
pub use marshalling::*;
pub use memory::*;
pub use persistence::*;
pub use statistics::*;
pub use transaction::*;
pub use unsafe_values::*;
pub use versioning::*;

/// Duration serialization using humantime format.
pub(crate) mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Same format for `Option<Duration>`; `None` maps to null.
    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(
            duration: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(duration) => super::serialize(duration, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = Option::<String>::deserialize(deserializer)?;
            s.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
