//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Time-to-live for cache entries.
    pub ttl: Option<Duration>,

    /// Time-to-idle for cache entries.
    pub tti: Option<Duration>,
}

impl CacheConfig {
    /// Config for the set of already-stored subscriber ids.
    ///
    /// Subscribers are never deleted, so entries only leave by capacity
    /// or idleness.
    pub fn known_subscribers() -> Self {
        Self {
            max_capacity: 100_000,
            ttl: None,
            tti: Some(Duration::from_secs(6 * 3600)),
        }
    }
}
