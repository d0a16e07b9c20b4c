//! The cache operation surface.
//!
//! [`Cache`] is the single contract every replacement policy implements:
//! the skeletal [`Engine`](crate::engine::Engine) behind FIFO/LIFO/LRU/
//! MRU/LFU, the composed [`ArcCache`](crate::policy::arc::ArcCache), and
//! the degenerate [`IdleCache`](crate::policy::idle::IdleCache). The trait
//! is object safe; the [`ReplacementPolicy`](crate::policy::ReplacementPolicy)
//! factory hands out `Box<dyn Cache<K, V> + Send>`.
//!
//! Read operations take `&mut self` on purpose: every lookup first drains
//! expired entries, and a hit may reorder the eviction structure. There is
//! no read-only entrypoint to hide behind a shared reference.
//!
//! # Example
//!
//! ```
//! use evictkit::{Cache, ReplacementPolicy};
//!
//! let mut cache = ReplacementPolicy::Lru.new_unsafe(2);
//! cache.store(1, "one");
//! cache.store(2, "two");
//! cache.store(3, "three"); // evicts key 1
//!
//! assert_eq!(cache.load(&3), Some("three"));
//! assert!(!cache.contains(&1));
//! ```

use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::event::{Event, Op};

/// An in-memory key→value cache with TTL expiry and change events.
///
/// Misses are `None`, not errors; no operation returns a recoverable
/// error. Expiration is lazy: each read/write entrypoint evicts entries
/// whose deadline has passed before doing anything else, so an expired key
/// is never observable.
pub trait Cache<K, V> {
    /// Returns the value for `key` and promotes it per the policy.
    fn load(&mut self, key: &K) -> Option<V>;

    /// Returns the value for `key` without touching its eviction rank.
    fn peek(&mut self, key: &K) -> Option<V>;

    /// Replaces the value for an existing `key` without touching its
    /// eviction rank. Absent keys are left absent.
    fn update(&mut self, key: &K, value: V);

    /// Stores `key` with the cache's default TTL.
    fn store(&mut self, key: K, value: V) {
        let ttl = self.ttl();
        self.store_with_ttl(key, value, ttl);
    }

    /// Stores `key` with an explicit TTL; `Duration::ZERO` means the entry
    /// never expires. Storing an existing key silently replaces it. When
    /// the cache is at capacity, one victim is discarded first — the new
    /// key always survives the store that admitted it.
    fn store_with_ttl(&mut self, key: K, value: V, ttl: Duration);

    /// Removes `key`, emitting a REMOVE event if it was present.
    fn delete(&mut self, key: &K);

    /// Removes `key` without emitting an event.
    fn delete_silently(&mut self, key: &K);

    /// Returns `key`'s expiration: `None` when absent, `Some(None)` when
    /// resident without a TTL, `Some(Some(at))` when it expires at `at`.
    fn expiry(&mut self, key: &K) -> Option<Option<Instant>>;

    /// Reports whether `key` is resident. Equivalent to
    /// `peek(key).is_some()`, including the READ event that implies.
    fn contains(&mut self, key: &K) -> bool;

    /// Returns all resident keys, in no particular order.
    fn keys(&self) -> Vec<K>;

    /// Returns the number of resident entries.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured capacity (`0` means unbounded).
    fn cap(&self) -> usize;

    /// Returns the key at the collection's front endpoint.
    fn front(&mut self) -> Option<K>;

    /// Returns the key at the collection's back endpoint.
    fn back(&mut self) -> Option<K>;

    /// Removes every entry. With REMOVE listeners registered, each entry
    /// is evicted individually and observed; otherwise storage is cleared
    /// wholesale.
    fn purge(&mut self);

    /// Sets a new capacity and discards entries until it fits, returning
    /// how many were evicted.
    fn resize(&mut self, capacity: usize) -> usize;

    /// Evicts the policy's next victim, returning its key and value.
    fn discard(&mut self) -> Option<(K, V)>;

    /// Returns the default TTL applied by [`store`](Self::store).
    fn ttl(&self) -> Duration;

    /// Sets the default TTL (`Duration::ZERO` disables expiry).
    fn set_ttl(&mut self, ttl: Duration);

    /// Relays events for `ops` to `ch`; an empty `ops` slice subscribes to
    /// all operations. Delivery is non-blocking: events to a full or
    /// disconnected channel are dropped.
    fn notify(&mut self, ch: Sender<Event<K, V>>, ops: &[Op]);

    /// Undoes [`notify`](Self::notify) for the given operations; an empty
    /// `ops` slice removes the channel entirely.
    fn ignore(&mut self, ch: &Sender<Event<K, V>>, ops: &[Op]);

    /// Calls `f` whenever an entry leaves the cache.
    ///
    /// Deprecated helper kept for parity with the original callback API;
    /// prefer [`notify`](Self::notify) with [`Op::Remove`]. The callback
    /// runs inline and cannot be unregistered.
    fn register_on_evicted(&mut self, f: Box<dyn Fn(K, V) + Send + Sync>);

    /// Calls `f` whenever an entry whose deadline has passed leaves the
    /// cache.
    ///
    /// Deprecated helper; prefer [`notify`](Self::notify). A removal at
    /// the expiration instant is indistinguishable from expiry.
    fn register_on_expired(&mut self, f: Box<dyn Fn(K, V) + Send + Sync>);

    /// Evicts all expired entries now and returns the time until the next
    /// deadline, or `Duration::ZERO` when nothing is scheduled.
    fn gc(&mut self) -> Duration;
}
