//! Cache module - In-process caching using Moka.
//!
//! Used by the MongoDB subscriber store to remember which ids are already
//! persisted, so repeat `/start` commands and join requests skip the database.

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
