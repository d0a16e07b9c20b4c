//! Adaptive Replacement Cache (ARC).
//!
//! ARC balances recency against frequency by splitting residents across
//! two LRU caches and remembering recently evicted keys in two ghost
//! lists:
//!
//! ```text
//!   T1  resident, seen once        T2  resident, seen again
//!   B1  ghost of T1 evictions      B2  ghost of T2 evictions
//! ```
//!
//! A hit on a B1 ghost means the recency side was evicting too eagerly, so
//! the target size `p` for T1 grows; a B2 ghost hit shrinks it. The
//! `replace` step then evicts from whichever resident list exceeds its
//! target, pushing the victim's key into the matching ghost list.
//!
//! Here ARC is a composition: all four lists are full cache engines over
//! the LRU collection — the ghosts store `()` values — so TTLs survive the
//! T1→T2 promotion and sub-cache expiry behaves like any other engine.
//! Events are relayed from the resident caches only; ghosts are invisible
//! to subscribers.
//!
//! Reference: Megiddo & Modha, "ARC: A Self-Tuning, Low Overhead
//! Replacement Cache", FAST 2003.

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::event::{Event, Op};
use crate::policy::lru::LruCache;
use crate::traits::Cache;

#[cfg(any(test, debug_assertions))]
use crate::error::InvariantError;

/// Adaptive cache mixing two resident LRU lists and two ghost lists.
pub struct ArcCache<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    /// Adaptive target size for T1, always within `[0, cap]`.
    p: usize,
    t1: LruCache<K, V>,
    t2: LruCache<K, V>,
    b1: LruCache<K, ()>,
    b2: LruCache<K, ()>,
}

impl<K, V> ArcCache<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    /// Creates an ARC cache with the given capacity (`0` means unbounded).
    ///
    /// Every sub-cache is built with the same capacity; the ARC layer
    /// additionally keeps `|T1| + |T2|` within it.
    pub fn new(capacity: usize) -> Self {
        Self {
            p: 0,
            t1: LruCache::new(capacity),
            t2: LruCache::new(capacity),
            b1: LruCache::new(capacity),
            b2: LruCache::new(capacity),
        }
    }

    /// Current adaptive target size for T1.
    pub fn p(&self) -> usize {
        self.p
    }

    /// Number of residents seen exactly once.
    pub fn t1_len(&self) -> usize {
        self.t1.len()
    }

    /// Number of residents seen more than once.
    pub fn t2_len(&self) -> usize {
        self.t2.len()
    }

    /// Number of remembered T1 evictions.
    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    /// Number of remembered T2 evictions.
    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    fn store_cases(&mut self, key: K, value: V, ttl: Duration) {
        // Resident in T1: a second touch proves reuse, move to T2.
        if self.t1.contains(&key) {
            self.t1.delete_silently(&key);
            self.t2.store_with_ttl(key, value, ttl);
            return;
        }

        if self.t2.contains(&key) {
            self.t2.store_with_ttl(key, value, ttl);
            return;
        }

        // Ghost hit in B1: recency side deserved more room.
        if self.b1.contains(&key) {
            let step = (self.b2.len() / self.b1.len()).max(1);
            self.p = (self.p + step).min(self.cap());
            self.b1.delete(&key);
            self.t2.store_with_ttl(key, value, ttl);
            return;
        }

        // Ghost hit in B2: frequency side deserved more room.
        if self.b2.contains(&key) {
            let step = (self.b1.len() / self.b2.len()).max(1);
            self.p = self.p.saturating_sub(step);
            self.b2.delete(&key);
            self.t2.store_with_ttl(key, value, ttl);
            return;
        }

        // Complete miss: trim ghost histories to their budgets, then admit
        // into T1.
        if self.b1.len() > self.cap().saturating_sub(self.p) {
            self.b1.discard();
        }
        if self.b2.len() > self.p {
            self.b2.discard();
        }
        self.t1.store_with_ttl(key, value, ttl);
    }

    /// Evicts one resident per the adaptive rule, remembering the victim's
    /// key in the matching ghost list.
    fn replace(&mut self, key: &K) {
        if (self.t1.len() > 0 && self.b2.contains(key) && self.t1.len() == self.p)
            || self.t1.len() > self.p
        {
            if let Some((victim, _)) = self.t1.discard() {
                self.b1.store(victim, ());
            }
            return;
        }

        if let Some((victim, _)) = self.t2.discard() {
            self.b2.store(victim, ());
        }
    }

    /// Validates ARC's structural invariants.
    #[cfg(any(test, debug_assertions))]
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        use std::collections::HashSet;

        let cap = self.cap();
        if cap != 0 {
            if self.t1.len() + self.t2.len() > cap {
                return Err(InvariantError::new("residents exceed capacity"));
            }
            if self.b1.len() > cap || self.b2.len() > cap {
                return Err(InvariantError::new("ghost list exceeds capacity"));
            }
            if self.p > cap {
                return Err(InvariantError::new("p exceeds capacity"));
            }
        }

        let lists = [
            self.t1.keys(),
            self.t2.keys(),
            self.b1.keys(),
            self.b2.keys(),
        ];
        let mut seen: HashSet<&K> = HashSet::new();
        for keys in &lists {
            for key in keys {
                if !seen.insert(key) {
                    return Err(InvariantError::new("key present in two ARC lists"));
                }
            }
        }

        self.t1.check_invariants()?;
        self.t2.check_invariants()?;
        self.b1.check_invariants()?;
        self.b2.check_invariants()
    }
}

impl<K, V> Cache<K, V> for ArcCache<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    fn load(&mut self, key: &K) -> Option<V> {
        // A T1 hit proves reuse: carry the remaining TTL over into T2.
        if let Some(value) = self.t1.peek(key) {
            let expiry = self.t1.expiry(key).flatten();
            self.t1.delete_silently(key);
            let ttl = expiry
                .map(|at| at.saturating_duration_since(Instant::now()))
                .unwrap_or(Duration::ZERO);
            self.t2.store_with_ttl(key.clone(), value.clone(), ttl);
            return Some(value);
        }

        self.t2.load(key)
    }

    fn peek(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.t1.peek(key) {
            return Some(value);
        }
        self.t2.peek(key)
    }

    fn update(&mut self, key: &K, value: V) {
        if self.t1.contains(key) {
            self.t1.update(key, value.clone());
        }
        self.t2.update(key, value);
    }

    fn store_with_ttl(&mut self, key: K, value: V, ttl: Duration) {
        self.store_cases(key.clone(), value, ttl);
        if self.cap() != 0 && self.t1.len() + self.t2.len() > self.cap() {
            self.replace(&key);
        }
    }

    fn delete(&mut self, key: &K) {
        // Lists are disjoint, but deleting everywhere keeps this
        // idempotent no matter which list holds the key.
        self.t1.delete(key);
        self.t2.delete(key);
        self.b1.delete(key);
        self.b2.delete(key);
    }

    fn delete_silently(&mut self, key: &K) {
        self.t1.delete_silently(key);
        self.t2.delete_silently(key);
        self.b1.delete_silently(key);
        self.b2.delete_silently(key);
    }

    fn expiry(&mut self, key: &K) -> Option<Option<Instant>> {
        if self.t1.contains(key) {
            return self.t1.expiry(key);
        }
        self.t2.expiry(key)
    }

    fn contains(&mut self, key: &K) -> bool {
        self.t1.contains(key) || self.t2.contains(key)
    }

    fn keys(&self) -> Vec<K> {
        let mut keys = self.t1.keys();
        keys.extend(self.t2.keys());
        keys
    }

    fn len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    fn cap(&self) -> usize {
        // All sub-caches share one capacity.
        self.t1.cap()
    }

    fn front(&mut self) -> Option<K> {
        self.t1.front().or_else(|| self.t2.front())
    }

    fn back(&mut self) -> Option<K> {
        self.t2.back().or_else(|| self.t1.back())
    }

    fn purge(&mut self) {
        self.t1.purge();
        self.t2.purge();
        self.b1.purge();
        self.b2.purge();
    }

    fn resize(&mut self, capacity: usize) -> usize {
        self.b1.resize(capacity);
        self.b2.resize(capacity);
        self.t1.resize(capacity) + self.t2.resize(capacity)
    }

    fn discard(&mut self) -> Option<(K, V)> {
        let from_t1 = self.t1.len() > 0 && (self.t1.len() > self.p || self.t2.len() == 0);
        if from_t1 {
            let (key, value) = self.t1.discard()?;
            self.b1.store(key.clone(), ());
            Some((key, value))
        } else {
            let (key, value) = self.t2.discard()?;
            self.b2.store(key.clone(), ());
            Some((key, value))
        }
    }

    fn ttl(&self) -> Duration {
        // T1 and T2 always carry the same default TTL.
        self.t1.ttl()
    }

    fn set_ttl(&mut self, ttl: Duration) {
        self.t1.set_ttl(ttl);
        self.t2.set_ttl(ttl);
    }

    fn notify(&mut self, ch: Sender<Event<K, V>>, ops: &[Op]) {
        self.t1.notify(ch.clone(), ops);
        self.t2.notify(ch, ops);
    }

    fn ignore(&mut self, ch: &Sender<Event<K, V>>, ops: &[Op]) {
        self.t1.ignore(ch, ops);
        self.t2.ignore(ch, ops);
    }

    fn register_on_evicted(&mut self, f: Box<dyn Fn(K, V) + Send + Sync>) {
        let f: Arc<dyn Fn(K, V) + Send + Sync> = Arc::from(f);
        let g = Arc::clone(&f);
        self.t1.register_on_evicted(Box::new(move |key, value| f(key, value)));
        self.t2.register_on_evicted(Box::new(move |key, value| g(key, value)));
    }

    fn register_on_expired(&mut self, f: Box<dyn Fn(K, V) + Send + Sync>) {
        let f: Arc<dyn Fn(K, V) + Send + Sync> = Arc::from(f);
        let g = Arc::clone(&f);
        self.t1.register_on_expired(Box::new(move |key, value| f(key, value)));
        self.t2.register_on_expired(Box::new(move |key, value| g(key, value)));
    }

    fn gc(&mut self) -> Duration {
        let t1 = self.t1.gc();
        let t2 = self.t2.gc();
        // Zero means "nothing scheduled" and loses to any real deadline.
        if t2.is_zero() {
            t1
        } else if t1.is_zero() {
            t2
        } else {
            t1.min(t2)
        }
    }
}

impl<K, V> std::fmt::Debug for ArcCache<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcCache")
            .field("p", &self.p)
            .field("t1", &self.t1.len())
            .field("t2", &self.t2.len())
            .field("b1", &self.b1.len())
            .field("b2", &self.b2.len())
            .field("capacity", &self.t1.cap())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn load_promotes_t1_to_t2() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(10);
        cache.store(1, 100);
        assert_eq!(cache.t1_len(), 1);
        assert_eq!(cache.t2_len(), 0);

        assert_eq!(cache.load(&1), Some(100));
        assert_eq!(cache.t1_len(), 0);
        assert_eq!(cache.t2_len(), 1);

        // Further loads stay in T2.
        assert_eq!(cache.load(&1), Some(100));
        assert_eq!(cache.t2_len(), 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn restore_of_t1_resident_moves_it_to_t2() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(10);
        cache.store(1, 1);
        cache.store(1, 2);
        assert_eq!(cache.t1_len(), 0);
        assert_eq!(cache.t2_len(), 1);
        assert_eq!(cache.peek(&1), Some(2));
    }

    #[test]
    fn eviction_records_ghost_and_ghost_hit_adapts() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(3);
        cache.store(1, 1);
        cache.store(2, 2);
        cache.store(3, 3);
        cache.store(4, 4); // T1 at its own capacity evicts 1 internally

        assert!(!cache.contains(&1));
        cache.check_invariants().unwrap();

        // Promote 2 and 3, then overflow so replace() pushes into B1.
        cache.load(&2);
        cache.load(&3);
        cache.store(5, 5);
        cache.store(6, 6);
        assert!(cache.b1_len() + cache.b2_len() > 0);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn adaptive_mix_reaches_expected_state() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(4);
        for key in 0..4 {
            cache.store(key, key);
        }
        cache.load(&0);
        cache.load(&1);
        cache.store(4, 4);
        cache.store(2, 2);
        cache.store(4, 4);
        cache.store(5, 5);
        cache.store(0, 0);

        assert_eq!(cache.t1_len(), 0);
        assert_eq!(cache.t2_len(), 4);
        assert_eq!(cache.b1_len(), 2);
        assert_eq!(cache.b2_len(), 0);
        assert_eq!(cache.p(), 0);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn delete_reaches_every_list() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(2);
        cache.store(1, 1);
        cache.store(2, 2);
        cache.store(3, 3);

        cache.delete(&1);
        cache.delete(&2);
        cache.delete(&3);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.b1_len(), 0);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn ttl_survives_promotion() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(10);
        cache.store_with_ttl(1, 1, Duration::from_secs(60));
        assert_eq!(cache.load(&1), Some(1)); // promoted into T2

        let deadline = cache.expiry(&1).expect("present").expect("has ttl");
        let remaining = deadline.saturating_duration_since(Instant::now());
        assert!(remaining > Duration::from_secs(59));
        assert!(remaining <= Duration::from_secs(60));

        let next = cache.gc();
        assert!(!next.is_zero());
    }

    #[test]
    fn notify_observes_both_resident_caches() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(0);
        let (tx, rx) = bounded(32);
        cache.notify(tx, &[]);

        cache.load(&1);
        cache.store_with_ttl(1, 0, Duration::from_secs(1));
        cache.peek(&1);
        cache.delete(&1);

        // Misses probe T1 then T2, so lookups count twice; ghost probes
        // are silent.
        assert_eq!(rx.try_iter().count(), 7);
    }

    #[test]
    fn keys_exclude_ghosts() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(2);
        cache.store(1, 1);
        cache.store(2, 2);
        cache.store(3, 3);

        let mut keys = cache.keys();
        keys.sort_unstable();
        assert_eq!(keys.len(), 2);
        assert!(!keys.contains(&1));
    }

    #[test]
    fn purge_clears_all_lists() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(2);
        for key in 0..5 {
            cache.store(key, key);
        }
        cache.purge();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.b1_len(), 0);
        assert_eq!(cache.b2_len(), 0);
    }

    #[test]
    fn zero_capacity_is_unbounded() {
        let mut cache: ArcCache<u32, u32> = ArcCache::new(0);
        for key in 0..100 {
            cache.store(key, key);
        }
        assert_eq!(cache.len(), 100);
        cache.check_invariants().unwrap();
    }
}
