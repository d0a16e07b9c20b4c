//! Cache configuration builder.
//!
//! A small front door over [`ReplacementPolicy`]'s factory methods for
//! callers that want to set capacity and default TTL in one place:
//!
//! ```
//! use std::time::Duration;
//! use evictkit::builder::CacheBuilder;
//! use evictkit::ReplacementPolicy;
//!
//! let cache = CacheBuilder::new(1024)
//!     .default_ttl(Duration::from_secs(300))
//!     .build::<String, Vec<u8>>(ReplacementPolicy::Lru);
//!
//! cache.store("session".to_string(), vec![1, 2, 3]);
//! assert_eq!(cache.ttl(), Duration::from_secs(300));
//! ```

use std::hash::Hash;
use std::time::Duration;

use crate::policy::ReplacementPolicy;
use crate::sync::SyncCache;
use crate::traits::Cache;

/// Builder for cache instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    capacity: usize,
    default_ttl: Duration,
}

impl CacheBuilder {
    /// Starts a builder with the given capacity (`0` means unbounded).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            default_ttl: Duration::ZERO,
        }
    }

    /// Sets the default TTL applied by `store` (`Duration::ZERO`, the
    /// default, disables expiry).
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Builds a thread-safe cache with the chosen policy.
    pub fn build<K, V>(self, policy: ReplacementPolicy) -> SyncCache<K, V>
    where
        K: Eq + Hash + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        let cache = policy.new(self.capacity);
        cache.set_ttl(self.default_ttl);
        cache
    }

    /// Builds a non-thread-safe cache with the chosen policy.
    pub fn build_unsafe<K, V>(self, policy: ReplacementPolicy) -> Box<dyn Cache<K, V> + Send>
    where
        K: Eq + Hash + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        let mut cache = policy.new_unsafe(self.capacity);
        cache.set_ttl(self.default_ttl);
        cache
    }
}
