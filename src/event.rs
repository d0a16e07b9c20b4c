//! Cache change events and subscriber dispatch.
//!
//! Every cache mutation or lookup emits an [`Event`] tagged with an [`Op`].
//! Subscribers are *sinks* paired with an operation mask:
//!
//! - **Channel sinks** (`crossbeam_channel::Sender`) receive events via
//!   `try_send`; a full or disconnected channel drops the event. Delivery
//!   never blocks a cache operation.
//! - **Callback sinks** (installed through the `register_on_*` helpers)
//!   run inline on the calling thread, inside any surrounding lock.
//!
//! Re-subscribing a channel widens its mask; clearing the last bit of a
//! mask drops the subscription.

use std::fmt;
use std::time::Instant;

use crossbeam_channel::Sender;

/// Cache operations that can trigger an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// A lookup (`load`, `peek`, `contains`, `expiry`).
    Read,
    /// A store or in-place update.
    Write,
    /// An eviction, expiration, or explicit delete.
    Remove,
}

impl Op {
    /// All operations, in declaration order.
    pub const ALL: [Op; 3] = [Op::Read, Op::Write, Op::Remove];

    fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Returns the operation's display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Read => "READ",
            Op::Write => "WRITE",
            Op::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of [`Op`] bits carried by each subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct OpMask(u8);

impl OpMask {
    pub(crate) const ALL: OpMask = OpMask(0b111);

    /// Builds a mask from a slice of operations; an empty slice means all.
    pub(crate) fn from_ops(ops: &[Op]) -> Self {
        if ops.is_empty() {
            return Self::ALL;
        }
        let mut mask = OpMask(0);
        for &op in ops {
            mask.0 |= op.bit();
        }
        mask
    }

    pub(crate) fn contains(self, op: Op) -> bool {
        self.0 & op.bit() != 0
    }

    pub(crate) fn union(self, other: OpMask) -> OpMask {
        OpMask(self.0 | other.0)
    }

    pub(crate) fn difference(self, other: OpMask) -> OpMask {
        OpMask(self.0 & !other.0)
    }

    pub(crate) fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A single cache entry change.
#[derive(Debug, Clone)]
pub struct Event<K, V> {
    /// The operation that triggered the event.
    pub op: Op,
    /// The key the operation addressed.
    pub key: K,
    /// The entry value; `None` on a read miss.
    pub value: Option<V>,
    /// The entry's expiration instant, when it carries a TTL.
    pub expiry: Option<Instant>,
    /// Whether a read found its key. Always `false` for writes and removes.
    pub ok: bool,
}

impl<K: fmt::Display, V> fmt::Display for Event<K, V> {
    /// Formats the event as `"<key>: <OPNAME>"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.op)
    }
}

enum Sink<K, V> {
    Channel(Sender<Event<K, V>>),
    Callback(Box<dyn FnMut(Event<K, V>) + Send>),
}

struct Subscriber<K, V> {
    sink: Sink<K, V>,
    mask: OpMask,
}

/// Fan-out of events to registered subscribers.
pub(crate) struct Dispatcher<K, V> {
    subscribers: Vec<Subscriber<K, V>>,
}

impl<K, V> Dispatcher<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Registers `ch` for `ops` (empty ⇒ all). A channel that is already
    /// subscribed has the new bits merged into its mask.
    pub(crate) fn subscribe_channel(&mut self, ch: Sender<Event<K, V>>, ops: &[Op]) {
        let mask = OpMask::from_ops(ops);
        for sub in &mut self.subscribers {
            if let Sink::Channel(existing) = &sub.sink {
                if existing.same_channel(&ch) {
                    sub.mask = sub.mask.union(mask);
                    return;
                }
            }
        }
        self.subscribers.push(Subscriber {
            sink: Sink::Channel(ch),
            mask,
        });
    }

    /// Registers an inline callback for `ops` (empty ⇒ all).
    pub(crate) fn subscribe_callback(
        &mut self,
        callback: Box<dyn FnMut(Event<K, V>) + Send>,
        ops: &[Op],
    ) {
        self.subscribers.push(Subscriber {
            sink: Sink::Callback(callback),
            mask: OpMask::from_ops(ops),
        });
    }

    /// Clears `ops` bits from `ch`'s mask; empty `ops` (or an emptied
    /// mask) drops the subscription entirely.
    pub(crate) fn unsubscribe_channel(&mut self, ch: &Sender<Event<K, V>>, ops: &[Op]) {
        let drop_all = ops.is_empty();
        let mask = OpMask::from_ops(ops);
        self.subscribers.retain_mut(|sub| match &sub.sink {
            Sink::Channel(existing) if existing.same_channel(ch) => {
                if drop_all {
                    return false;
                }
                sub.mask = sub.mask.difference(mask);
                !sub.mask.is_empty()
            }
            _ => true,
        });
    }

    /// Reports whether any subscriber listens for `op`.
    pub(crate) fn wants(&self, op: Op) -> bool {
        self.subscribers.iter().any(|sub| sub.mask.contains(op))
    }

    /// Delivers `event` to every subscriber whose mask includes its op.
    pub(crate) fn dispatch(&mut self, event: Event<K, V>)
    where
        K: Clone,
        V: Clone,
    {
        for sub in &mut self.subscribers {
            if !sub.mask.contains(event.op) {
                continue;
            }
            match &mut sub.sink {
                // Drop-on-full: a slow receiver loses events, the cache
                // never waits for it.
                Sink::Channel(ch) => {
                    let _ = ch.try_send(event.clone());
                }
                Sink::Callback(callback) => callback(event.clone()),
            }
        }
    }
}

impl<K, V> fmt::Debug for Dispatcher<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
