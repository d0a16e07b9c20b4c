//! Skeletal cache engine shared by every replacement policy.
//!
//! [`Engine`] combines three structures that are mutated in lockstep:
//!
//! ```text
//!   index: FxHashMap<K, EntryId>        authoritative membership
//!   entries: SlotArena<Entry>           owns key, value, TTL, back-pointers
//!   coll: C (Collection)                eviction order over EntryIds
//!   heap: ExpiringHeap                  TTL'd entries by deadline
//! ```
//!
//! The ordering policy is supplied as a [`Collection`]: the engine tells it
//! when an entry is admitted, re-accessed, or removed, and asks it which
//! entry to evict when over capacity. The collection knows nothing about
//! TTLs or events.
//!
//! Expiration is lazy: every read/write entrypoint first drains expired
//! roots from the heap, so an expired entry is never observable. The
//! opt-in driver in [`crate::gc`] narrows the window between expiry and
//! collection.
//!
//! All removal paths funnel through one helper that detaches the entry
//! from the collection, the heap (guarded interior removal), the arena,
//! and the index before the entry is dropped.

use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use rustc_hash::FxHashMap;

use crate::ds::{Deadline, ExpiringHeap, SlotArena, SlotId, NO_SLOT};
use crate::event::{Dispatcher, Event, Op};
use crate::traits::Cache;

#[cfg(any(test, debug_assertions))]
use crate::error::InvariantError;

/// Stable identifier of a live entry inside an engine.
pub type EntryId = SlotId;

/// Ordering discipline over cache entries.
///
/// Implementations decide where a new entry is admitted, how a hit
/// reorders it, and which entry is the next eviction victim. `add` returns
/// a handle the engine stores on the entry and passes back for `touch` and
/// `remove`; `discard` removes the victim from the collection itself, so
/// the handle it consumed must not be used again.
pub trait Collection: Default {
    /// Back-pointer from an entry into the collection's structure.
    type Handle: Copy + PartialEq;

    /// Admits a newly stored entry at the policy's admission position.
    fn add(&mut self, id: EntryId) -> Self::Handle;
    /// Reacts to a hit on the entry behind `handle`.
    fn touch(&mut self, handle: Self::Handle);
    /// Excises the entry behind `handle` with no ordering side effects.
    fn remove(&mut self, handle: Self::Handle);
    /// Removes and returns the entry the policy would evict next.
    fn discard(&mut self) -> Option<EntryId>;
    /// Peeks the front endpoint.
    fn front(&self) -> Option<EntryId>;
    /// Peeks the back endpoint.
    fn back(&self) -> Option<EntryId>;
    /// Number of entries held.
    fn len(&self) -> usize;
    /// Resets to empty.
    fn clear(&mut self);
}

/// A stored entry and its structural back-pointers.
struct Entry<K, V, H> {
    key: K,
    value: V,
    expires_at: Option<Instant>,
    /// Collection handle; `None` only inside a store, or after the
    /// collection's own `discard` already consumed it.
    node: Option<H>,
    heap_slot: usize,
}

impl<K, V, H> Deadline for Entry<K, V, H> {
    fn deadline(&self) -> Option<Instant> {
        self.expires_at
    }
    fn heap_slot(&self) -> usize {
        self.heap_slot
    }
    fn set_heap_slot(&mut self, slot: usize) {
        self.heap_slot = slot;
    }
}

/// Skeletal cache engine, generic over the eviction [`Collection`].
///
/// `Engine` implements the whole [`Cache`] contract; the policy aliases in
/// [`crate::policy`] are thin instantiations of it.
pub struct Engine<K, V, C: Collection> {
    entries: SlotArena<Entry<K, V, C::Handle>>,
    index: FxHashMap<K, EntryId>,
    heap: ExpiringHeap,
    coll: C,
    events: Dispatcher<K, V>,
    default_ttl: Duration,
    capacity: usize,
}

impl<K, V, C> Engine<K, V, C>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
    C: Collection,
{
    /// Creates an engine with the given capacity (`0` means unbounded).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: SlotArena::new(),
            index: FxHashMap::default(),
            heap: ExpiringHeap::new(),
            coll: C::default(),
            events: Dispatcher::new(),
            default_ttl: Duration::ZERO,
            capacity,
        }
    }

    fn lookup(&mut self, key: &K, peek: bool) -> Option<V> {
        self.drain_expired();

        let Some(&id) = self.index.get(key) else {
            self.events.dispatch(Event {
                op: Op::Read,
                key: key.clone(),
                value: None,
                expiry: None,
                ok: false,
            });
            return None;
        };

        if !peek {
            if let Some(handle) = self.entries.get(id).and_then(|e| e.node) {
                self.coll.touch(handle);
            }
        }

        let entry = self.entries.get(id)?;
        let value = entry.value.clone();
        let expiry = entry.expires_at;
        self.events.dispatch(Event {
            op: Op::Read,
            key: key.clone(),
            value: Some(value.clone()),
            expiry,
            ok: true,
        });
        Some(value)
    }

    /// Detaches `id` from the collection, heap, arena, and index.
    fn remove_entry(&mut self, id: EntryId) -> Option<Entry<K, V, C::Handle>> {
        let node = self.entries.get(id)?.node;
        if let Some(handle) = node {
            self.coll.remove(handle);
        }
        self.heap.remove(&mut self.entries, id);
        let entry = self.entries.remove(id)?;
        self.index.remove(&entry.key);
        Some(entry)
    }

    /// Removes `id` and emits a REMOVE event.
    fn evict(&mut self, id: EntryId) -> Option<(K, V)> {
        let entry = self.remove_entry(id)?;
        self.events.dispatch(Event {
            op: Op::Remove,
            key: entry.key.clone(),
            value: Some(entry.value.clone()),
            expiry: entry.expires_at,
            ok: false,
        });
        Some((entry.key, entry.value))
    }

    /// Evicts every expired heap root, returning the time until the next
    /// deadline (`ZERO` when none is scheduled).
    fn drain_expired(&mut self) -> Duration {
        loop {
            let Some(root) = self.heap.peek() else {
                return Duration::ZERO;
            };
            let Some(deadline) = self.entries.get(root).and_then(|e| e.expires_at) else {
                return Duration::ZERO;
            };
            let now = Instant::now();
            if deadline > now {
                return deadline - now;
            }
            self.evict(root);
        }
    }

    /// Validates the engine's structural invariants.
    #[cfg(any(test, debug_assertions))]
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.index.len() != self.coll.len() {
            return Err(InvariantError::new(format!(
                "index has {} keys but collection holds {}",
                self.index.len(),
                self.coll.len()
            )));
        }
        if self.index.len() != self.entries.len() {
            return Err(InvariantError::new("index and entry arena disagree"));
        }
        if self.capacity != 0 && self.index.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries resident with capacity {}",
                self.index.len(),
                self.capacity
            )));
        }

        let mut with_deadline = 0usize;
        for (key, &id) in &self.index {
            let Some(entry) = self.entries.get(id) else {
                return Err(InvariantError::new("index points at dead entry"));
            };
            if entry.key != *key {
                return Err(InvariantError::new("index key does not match entry key"));
            }
            match entry.expires_at {
                Some(_) => {
                    with_deadline += 1;
                    if !self.heap.contains(&self.entries, id) {
                        return Err(InvariantError::new("TTL entry missing from heap"));
                    }
                }
                None => {
                    if self.heap.contains(&self.entries, id) {
                        return Err(InvariantError::new("non-TTL entry present in heap"));
                    }
                }
            }
        }
        if with_deadline != self.heap.len() {
            return Err(InvariantError::new(format!(
                "heap holds {} entries but {} carry deadlines",
                self.heap.len(),
                with_deadline
            )));
        }
        self.heap.debug_validate_invariants(&self.entries);
        Ok(())
    }
}

impl<K, V, C> Cache<K, V> for Engine<K, V, C>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
    C: Collection,
{
    fn load(&mut self, key: &K) -> Option<V> {
        self.lookup(key, false)
    }

    fn peek(&mut self, key: &K) -> Option<V> {
        self.lookup(key, true)
    }

    fn expiry(&mut self, key: &K) -> Option<Option<Instant>> {
        if !self.contains(key) {
            return None;
        }
        let id = *self.index.get(key)?;
        self.entries.get(id).map(|e| e.expires_at)
    }

    fn store_with_ttl(&mut self, key: K, value: V, ttl: Duration) {
        self.drain_expired();

        if let Some(&id) = self.index.get(&key) {
            self.remove_entry(id);
        }

        let expires_at = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        let id = self.entries.insert(Entry {
            key: key.clone(),
            value,
            expires_at,
            node: None,
            heap_slot: NO_SLOT,
        });
        if expires_at.is_some() {
            self.heap.push(&mut self.entries, id);
        }
        self.index.insert(key, id);

        // Admission check runs against the residents only: the incoming
        // entry is indexed but not yet in the collection, so it can never
        // be its own victim.
        if self.capacity != 0 && self.coll.len() >= self.capacity {
            self.discard();
        }

        let handle = self.coll.add(id);
        let mut written = None;
        if let Some(entry) = self.entries.get_mut(id) {
            entry.node = Some(handle);
            written = Some((entry.key.clone(), entry.value.clone(), entry.expires_at));
        }
        if let Some((key, value, expiry)) = written {
            self.events.dispatch(Event {
                op: Op::Write,
                key,
                value: Some(value),
                expiry,
                ok: false,
            });
        }
    }

    fn update(&mut self, key: &K, value: V) {
        self.drain_expired();
        if !self.contains(key) {
            return;
        }
        let Some(&id) = self.index.get(key) else {
            return;
        };
        let mut written = None;
        if let Some(entry) = self.entries.get_mut(id) {
            entry.value = value;
            written = Some((entry.key.clone(), entry.value.clone(), entry.expires_at));
        }
        if let Some((key, value, expiry)) = written {
            self.events.dispatch(Event {
                op: Op::Write,
                key,
                value: Some(value),
                expiry,
                ok: false,
            });
        }
    }

    fn delete(&mut self, key: &K) {
        if let Some(&id) = self.index.get(key) {
            self.evict(id);
        }
    }

    fn delete_silently(&mut self, key: &K) {
        if let Some(&id) = self.index.get(key) {
            self.remove_entry(id);
        }
    }

    fn contains(&mut self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    fn keys(&self) -> Vec<K> {
        self.index.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.coll.len()
    }

    fn cap(&self) -> usize {
        self.capacity
    }

    fn front(&mut self) -> Option<K> {
        self.drain_expired();
        self.coll
            .front()
            .and_then(|id| self.entries.get(id))
            .map(|e| e.key.clone())
    }

    fn back(&mut self) -> Option<K> {
        self.drain_expired();
        self.coll
            .back()
            .and_then(|id| self.entries.get(id))
            .map(|e| e.key.clone())
    }

    fn purge(&mut self) {
        if !self.events.wants(Op::Remove) {
            self.entries.clear();
            self.index.clear();
            self.heap.clear();
            self.coll.clear();
            return;
        }

        let ids: Vec<EntryId> = self.index.values().copied().collect();
        for id in ids {
            self.evict(id);
        }
        self.coll.clear();
    }

    fn resize(&mut self, capacity: usize) -> usize {
        self.capacity = capacity;
        let evicted = self.len().saturating_sub(capacity);
        for _ in 0..evicted {
            self.discard();
        }
        evicted
    }

    fn discard(&mut self) -> Option<(K, V)> {
        let id = self.coll.discard()?;
        if let Some(entry) = self.entries.get_mut(id) {
            // The collection's discard already consumed the handle.
            entry.node = None;
        }
        self.evict(id)
    }

    fn ttl(&self) -> Duration {
        self.default_ttl
    }

    fn set_ttl(&mut self, ttl: Duration) {
        self.default_ttl = ttl;
    }

    fn notify(&mut self, ch: Sender<Event<K, V>>, ops: &[Op]) {
        self.events.subscribe_channel(ch, ops);
    }

    fn ignore(&mut self, ch: &Sender<Event<K, V>>, ops: &[Op]) {
        self.events.unsubscribe_channel(ch, ops);
    }

    fn register_on_evicted(&mut self, f: Box<dyn Fn(K, V) + Send + Sync>) {
        self.events.subscribe_callback(
            Box::new(move |event: Event<K, V>| {
                if let Some(value) = event.value {
                    f(event.key, value);
                }
            }),
            &[Op::Remove],
        );
    }

    fn register_on_expired(&mut self, f: Box<dyn Fn(K, V) + Send + Sync>) {
        self.events.subscribe_callback(
            Box::new(move |event: Event<K, V>| {
                // A removal at or before the deadline is indistinguishable
                // from expiry; entries without a deadline never fire.
                if event.expiry.is_some_and(|at| at < Instant::now()) {
                    if let Some(value) = event.value {
                        f(event.key, value);
                    }
                }
            }),
            &[Op::Remove],
        );
    }

    fn gc(&mut self) -> Duration {
        self.drain_expired()
    }
}

impl<K, V, C: Collection> fmt::Debug for Engine<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("len", &self.coll.len())
            .field("capacity", &self.capacity)
            .field("scheduled", &self.heap.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::fifo::FifoCache;
    use crate::policy::lru::LruCache;
    use crossbeam_channel::bounded;
    use std::thread::sleep;

    #[test]
    fn store_load_roundtrip() {
        let mut cache: LruCache<u32, &str> = LruCache::new(0);
        cache.store(1, "one");
        assert_eq!(cache.load(&1), Some("one"));
        assert_eq!(cache.load(&2), None);
        assert_eq!(cache.len(), 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn restore_replaces_single_entry() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        cache.store(1, 10);
        cache.store(1, 20);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek(&1), Some(20));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn capacity_admission_evicts_one() {
        let mut cache: FifoCache<u32, u32> = FifoCache::new(2);
        cache.store(1, 1);
        cache.store(2, 2);
        cache.store(3, 3);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.front(), Some(2));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn peek_does_not_promote() {
        let mut cache: LruCache<u32, u32> = LruCache::new(3);
        cache.store(1, 0);
        cache.store(2, 0);
        cache.store(3, 0);
        cache.peek(&1);
        cache.store(4, 0);
        // Key 1 stayed least recently used despite the peek.
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
    }

    #[test]
    fn update_replaces_value_without_promoting() {
        let mut cache: LruCache<u32, u32> = LruCache::new(3);
        cache.store(1, 0);
        cache.store(2, 0);
        cache.store(3, 0);
        cache.update(&1, 9);
        assert_eq!(cache.peek(&1), Some(9));
        cache.store(4, 0);
        assert!(!cache.contains(&1));
    }

    #[test]
    fn update_absent_key_is_noop() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        cache.update(&1, 9);
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entries_vanish_on_next_access() {
        let mut cache: LruCache<String, u32> = LruCache::new(0);
        cache.store_with_ttl("short".into(), 1, Duration::from_millis(20));
        cache.store("long".into(), 2);

        sleep(Duration::from_millis(30));
        assert_eq!(cache.peek(&"missing".to_string()), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.keys(), vec!["long".to_string()]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn deleting_one_ttl_entry_leaves_heap_consistent() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        cache.store_with_ttl(1, 1, Duration::from_millis(40));
        cache.store_with_ttl(2, 2, Duration::from_millis(200));
        cache.delete(&2);
        assert_eq!(cache.keys(), vec![1]);
        cache.check_invariants().unwrap();

        sleep(Duration::from_millis(50));
        cache.peek(&0);
        assert_eq!(cache.len(), 0);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn expiry_reports_deadline() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        cache.store_with_ttl(1, 1, Duration::from_secs(3600));
        cache.store(2, 2);

        let deadline = cache.expiry(&1).expect("present").expect("has ttl");
        let remaining = deadline - Instant::now();
        assert!(remaining <= Duration::from_secs(3600));
        assert!(remaining > Duration::from_secs(3590));

        assert_eq!(cache.expiry(&2), Some(None));
        assert_eq!(cache.expiry(&3), None);
    }

    #[test]
    fn gc_returns_time_to_next_deadline() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        assert_eq!(cache.gc(), Duration::ZERO);

        cache.store_with_ttl(1, 1, Duration::from_secs(60));
        let remaining = cache.gc();
        assert!(remaining > Duration::from_secs(59));
        assert!(remaining <= Duration::from_secs(60));
    }

    #[test]
    fn default_ttl_applies_to_store() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        cache.set_ttl(Duration::from_millis(20));
        assert_eq!(cache.ttl(), Duration::from_millis(20));

        cache.store(1, 1);
        sleep(Duration::from_millis(30));
        assert!(!cache.contains(&1));
    }

    #[test]
    fn resize_discards_down_to_new_capacity() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        for i in 0..5 {
            cache.store(i, i);
        }
        assert_eq!(cache.resize(2), 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.resize(10), 0);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn purge_fast_path_and_evented_path() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        cache.store_with_ttl(1, 1, Duration::from_secs(60));
        cache.store(2, 2);
        cache.purge();
        assert_eq!(cache.len(), 0);
        cache.check_invariants().unwrap();

        let (tx, rx) = bounded(8);
        cache.notify(tx, &[Op::Remove]);
        cache.store(3, 3);
        cache.store(4, 4);
        cache.purge();
        assert_eq!(cache.len(), 0);
        let mut removed: Vec<_> = rx.try_iter().map(|e| e.key).collect();
        removed.sort_unstable();
        assert_eq!(removed, vec![3, 4]);
    }

    #[test]
    fn events_fire_in_program_order() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        let (tx, rx) = bounded(16);
        cache.notify(tx, &[]);

        cache.load(&1);
        cache.store(1, 10);
        cache.peek(&1);
        cache.delete(&1);

        let got: Vec<_> = rx.try_iter().map(|e| (e.op, e.ok)).collect();
        assert_eq!(
            got,
            vec![
                (Op::Read, false),
                (Op::Write, false),
                (Op::Read, true),
                (Op::Remove, false),
            ]
        );
    }

    #[test]
    fn delete_silently_emits_nothing() {
        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        let (tx, rx) = bounded(8);
        cache.notify(tx, &[Op::Remove]);
        cache.store(1, 1);
        cache.delete_silently(&1);
        assert!(rx.try_iter().next().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn discard_reports_victim_and_emits_remove() {
        let mut cache: FifoCache<u32, u32> = FifoCache::new(0);
        let (tx, rx) = bounded(8);
        cache.notify(tx, &[Op::Remove]);

        cache.store(1, 10);
        cache.store(2, 20);
        assert_eq!(cache.discard(), Some((1, 10)));
        assert_eq!(rx.try_iter().map(|e| e.key).collect::<Vec<_>>(), vec![1]);
        assert_eq!(cache.len(), 1);
        cache.check_invariants().unwrap();

        cache.purge();
        assert_eq!(cache.discard(), None);
    }

    #[test]
    fn on_evicted_sees_capacity_victims() {
        use std::sync::{Arc, Mutex};

        let mut cache: FifoCache<u32, u32> = FifoCache::new(2);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        cache.register_on_evicted(Box::new(move |key, _value| {
            sink.lock().unwrap().push(key);
        }));

        for i in 0..4 {
            cache.store(i, i);
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn on_expired_ignores_manual_deletes() {
        use std::sync::{Arc, Mutex};

        let mut cache: LruCache<u32, u32> = LruCache::new(0);
        let expired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&expired);
        cache.register_on_expired(Box::new(move |key, _value| {
            sink.lock().unwrap().push(key);
        }));

        cache.store(1, 1);
        cache.delete(&1);
        assert!(expired.lock().unwrap().is_empty());

        cache.store_with_ttl(2, 2, Duration::from_millis(20));
        sleep(Duration::from_millis(30));
        cache.peek(&0);
        assert_eq!(*expired.lock().unwrap(), vec![2]);
    }
}
