//! IDLE policy: a cache that never stores anything.
//!
//! Every read misses, every write is discarded, length and capacity are
//! zero, and no events are ever emitted. Useful as a drop-in to disable
//! caching without touching call sites.

use std::marker::PhantomData;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::event::{Event, Op};
use crate::traits::Cache;

/// Cache that stores nothing and finds nothing.
#[derive(Debug, Default)]
pub struct IdleCache<K, V> {
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> IdleCache<K, V> {
    /// Creates an idle cache; the capacity argument is accepted for
    /// factory symmetry and ignored.
    pub fn new(_capacity: usize) -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K, V> Cache<K, V> for IdleCache<K, V> {
    fn load(&mut self, _key: &K) -> Option<V> {
        None
    }

    fn peek(&mut self, _key: &K) -> Option<V> {
        None
    }

    fn update(&mut self, _key: &K, _value: V) {}

    fn store_with_ttl(&mut self, _key: K, _value: V, _ttl: Duration) {}

    fn delete(&mut self, _key: &K) {}

    fn delete_silently(&mut self, _key: &K) {}

    fn expiry(&mut self, _key: &K) -> Option<Option<Instant>> {
        None
    }

    fn contains(&mut self, _key: &K) -> bool {
        false
    }

    fn keys(&self) -> Vec<K> {
        Vec::new()
    }

    fn len(&self) -> usize {
        0
    }

    fn cap(&self) -> usize {
        0
    }

    fn front(&mut self) -> Option<K> {
        None
    }

    fn back(&mut self) -> Option<K> {
        None
    }

    fn purge(&mut self) {}

    fn resize(&mut self, _capacity: usize) -> usize {
        0
    }

    fn discard(&mut self) -> Option<(K, V)> {
        None
    }

    fn ttl(&self) -> Duration {
        Duration::ZERO
    }

    fn set_ttl(&mut self, _ttl: Duration) {}

    fn notify(&mut self, _ch: Sender<Event<K, V>>, _ops: &[Op]) {}

    fn ignore(&mut self, _ch: &Sender<Event<K, V>>, _ops: &[Op]) {}

    fn register_on_evicted(&mut self, _f: Box<dyn Fn(K, V) + Send + Sync>) {}

    fn register_on_expired(&mut self, _f: Box<dyn Fn(K, V) + Send + Sync>) {}

    fn gc(&mut self) -> Duration {
        Duration::ZERO
    }
}
