//! Replacement policies and the policy factory.
//!
//! Each submodule contributes either a [`Collection`](crate::engine::Collection)
//! that the skeletal engine is instantiated over (FIFO, LIFO, LRU, MRU,
//! LFU), or a complete [`Cache`] implementation of its own (ARC, IDLE).
//! [`ReplacementPolicy`] names them all and builds caches without the
//! caller naming concrete types.

pub mod arc;
pub mod fifo;
pub mod idle;
pub mod lfu;
pub mod lifo;
pub mod lru;
pub mod mru;

use std::fmt;
use std::hash::Hash;

use crate::sync::SyncCache;
use crate::traits::Cache;

/// Identifies a cache replacement policy.
///
/// Every variant is always available; the enum doubles as the policy
/// registry, so there is no way to ask for an unlinked policy.
///
/// # Example
///
/// ```
/// use evictkit::{Cache, ReplacementPolicy};
///
/// let mut cache = ReplacementPolicy::Fifo.new_unsafe(128);
/// cache.store("a", 1);
/// assert_eq!(cache.load(&"a"), Some(1));
/// assert_eq!(ReplacementPolicy::Fifo.to_string(), "FIFO");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplacementPolicy {
    /// Stores nothing; every lookup misses.
    Idle,
    /// Evicts in insertion order.
    Fifo,
    /// Evicts the most recent insertion first.
    Lifo,
    /// Evicts the least recently used entry.
    Lru,
    /// Evicts the most recently used entry.
    Mru,
    /// Evicts the least frequently used entry.
    Lfu,
    /// Adapts between recency and frequency.
    Arc,
}

impl ReplacementPolicy {
    /// All policies, in declaration order.
    pub const ALL: [ReplacementPolicy; 7] = [
        ReplacementPolicy::Idle,
        ReplacementPolicy::Fifo,
        ReplacementPolicy::Lifo,
        ReplacementPolicy::Lru,
        ReplacementPolicy::Mru,
        ReplacementPolicy::Lfu,
        ReplacementPolicy::Arc,
    ];

    /// Returns the policy's display name.
    pub fn as_str(self) -> &'static str {
        match self {
            ReplacementPolicy::Idle => "IDLE",
            ReplacementPolicy::Fifo => "FIFO",
            ReplacementPolicy::Lifo => "LIFO",
            ReplacementPolicy::Lru => "LRU",
            ReplacementPolicy::Mru => "MRU",
            ReplacementPolicy::Lfu => "LFU",
            ReplacementPolicy::Arc => "ARC",
        }
    }

    /// Builds a thread-safe cache with this policy.
    ///
    /// Capacity `0` disables eviction on admission.
    pub fn new<K, V>(self, capacity: usize) -> SyncCache<K, V>
    where
        K: Eq + Hash + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        SyncCache::new(self.new_unsafe(capacity))
    }

    /// Builds a non-thread-safe cache with this policy.
    pub fn new_unsafe<K, V>(self, capacity: usize) -> Box<dyn Cache<K, V> + Send>
    where
        K: Eq + Hash + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        match self {
            ReplacementPolicy::Idle => Box::new(idle::IdleCache::new(capacity)),
            ReplacementPolicy::Fifo => Box::new(fifo::FifoCache::new(capacity)),
            ReplacementPolicy::Lifo => Box::new(lifo::LifoCache::new(capacity)),
            ReplacementPolicy::Lru => Box::new(lru::LruCache::new(capacity)),
            ReplacementPolicy::Mru => Box::new(mru::MruCache::new(capacity)),
            ReplacementPolicy::Lfu => Box::new(lfu::LfuCache::new(capacity)),
            ReplacementPolicy::Arc => Box::new(arc::ArcCache::new(capacity)),
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_match_identifiers() {
        let names: Vec<_> = ReplacementPolicy::ALL
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["IDLE", "FIFO", "LIFO", "LRU", "MRU", "LFU", "ARC"]
        );
    }

    #[test]
    fn factory_builds_working_caches() {
        for policy in ReplacementPolicy::ALL {
            let mut cache = policy.new_unsafe(4);
            cache.store(1u32, 1u32);
            if policy == ReplacementPolicy::Idle {
                assert_eq!(cache.load(&1), None, "{policy}");
            } else {
                assert_eq!(cache.load(&1), Some(1), "{policy}");
                assert_eq!(cache.cap(), 4, "{policy}");
            }
        }
    }

    #[test]
    fn thread_safe_factory_shares_across_threads() {
        let cache = ReplacementPolicy::Lru.new::<u32, u32>(0);
        std::thread::scope(|scope| {
            scope.spawn(|| cache.store(1, 1));
            scope.spawn(|| cache.store(2, 2));
        });
        assert_eq!(cache.len(), 2);
    }
}
