//! Thread-safety wrapper.
//!
//! [`SyncCache`] serializes every operation of a boxed [`Cache`] behind a
//! single `parking_lot::Mutex`, making all operations linearizable across
//! threads. A reader/writer lock would be wrong here: even `load`, `peek`,
//! and `contains` mutate — they drain expired entries and may reorder the
//! eviction structure — so every entrypoint takes the exclusive lock.
//!
//! Synchronous callback subscribers run while the lock is held. A callback
//! that re-enters the cache will deadlock; re-entrant observers must use
//! channel sinks via [`SyncCache::notify`] instead.

use std::fmt;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use crate::event::{Event, Op};
use crate::traits::Cache;

/// A [`Cache`] behind a mutex, safe to share by reference across threads.
pub struct SyncCache<K, V> {
    inner: Mutex<Box<dyn Cache<K, V> + Send>>,
}

impl<K, V> SyncCache<K, V> {
    /// Wraps a non-thread-safe cache.
    pub fn new(inner: Box<dyn Cache<K, V> + Send>) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Returns the value for `key` and promotes it per the policy.
    pub fn load(&self, key: &K) -> Option<V> {
        self.inner.lock().load(key)
    }

    /// Returns the value for `key` without touching its eviction rank.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().peek(key)
    }

    /// Replaces the value for an existing `key` without promoting it.
    pub fn update(&self, key: &K, value: V) {
        self.inner.lock().update(key, value);
    }

    /// Stores `key` with the default TTL.
    pub fn store(&self, key: K, value: V) {
        self.inner.lock().store(key, value);
    }

    /// Stores `key` with an explicit TTL (`Duration::ZERO` = no expiry).
    pub fn store_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.inner.lock().store_with_ttl(key, value, ttl);
    }

    /// Removes `key`, emitting a REMOVE event if present.
    pub fn delete(&self, key: &K) {
        self.inner.lock().delete(key);
    }

    /// Removes `key` without emitting an event.
    pub fn delete_silently(&self, key: &K) {
        self.inner.lock().delete_silently(key);
    }

    /// Returns `key`'s expiration; see [`Cache::expiry`].
    pub fn expiry(&self, key: &K) -> Option<Option<Instant>> {
        self.inner.lock().expiry(key)
    }

    /// Reports whether `key` is resident.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// Returns all resident keys.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys()
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured capacity (`0` = unbounded).
    pub fn cap(&self) -> usize {
        self.inner.lock().cap()
    }

    /// Returns the key at the collection's front endpoint.
    pub fn front(&self) -> Option<K> {
        self.inner.lock().front()
    }

    /// Returns the key at the collection's back endpoint.
    pub fn back(&self) -> Option<K> {
        self.inner.lock().back()
    }

    /// Removes every entry.
    pub fn purge(&self) {
        self.inner.lock().purge();
    }

    /// Sets a new capacity, discarding down to it; returns the eviction
    /// count.
    pub fn resize(&self, capacity: usize) -> usize {
        self.inner.lock().resize(capacity)
    }

    /// Evicts the policy's next victim.
    pub fn discard(&self) -> Option<(K, V)> {
        self.inner.lock().discard()
    }

    /// Returns the default TTL.
    pub fn ttl(&self) -> Duration {
        self.inner.lock().ttl()
    }

    /// Sets the default TTL.
    pub fn set_ttl(&self, ttl: Duration) {
        self.inner.lock().set_ttl(ttl);
    }

    /// Relays events for `ops` to `ch`; empty `ops` subscribes to all.
    pub fn notify(&self, ch: Sender<Event<K, V>>, ops: &[Op]) {
        self.inner.lock().notify(ch, ops);
    }

    /// Undoes [`notify`](Self::notify); empty `ops` removes the channel.
    pub fn ignore(&self, ch: &Sender<Event<K, V>>, ops: &[Op]) {
        self.inner.lock().ignore(ch, ops);
    }

    /// Calls `f` on every eviction. The callback runs under the cache
    /// lock and must not re-enter the cache.
    pub fn register_on_evicted(&self, f: Box<dyn Fn(K, V) + Send + Sync>) {
        self.inner.lock().register_on_evicted(f);
    }

    /// Calls `f` on every expiry. Same locking caveat as
    /// [`register_on_evicted`](Self::register_on_evicted).
    pub fn register_on_expired(&self, f: Box<dyn Fn(K, V) + Send + Sync>) {
        self.inner.lock().register_on_expired(f);
    }

    /// Evicts expired entries and returns the time until the next
    /// deadline (`ZERO` when none).
    pub fn gc(&self) -> Duration {
        self.inner.lock().gc()
    }
}

impl<K, V> fmt::Debug for SyncCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCache")
            .field("len", &self.len())
            .field("cap", &self.cap())
            .finish()
    }
}
