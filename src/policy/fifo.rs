//! First-in, first-out replacement.
//!
//! Entries are admitted at the back of a list and evicted from the front,
//! so the oldest store is always the next victim. Hits do not reorder
//! anything: FIFO ranks entries purely by insertion.

use crate::ds::{IntrusiveList, SlotId};
use crate::engine::{Collection, Engine, EntryId};

/// FIFO ordering: admit at the back, discard from the front.
#[derive(Debug, Default)]
pub struct FifoCollection {
    list: IntrusiveList<EntryId>,
}

impl Collection for FifoCollection {
    type Handle = SlotId;

    fn add(&mut self, id: EntryId) -> SlotId {
        self.list.push_back(id)
    }

    fn touch(&mut self, _handle: SlotId) {
        // Insertion order is the only rank.
    }

    fn remove(&mut self, handle: SlotId) {
        self.list.remove(handle);
    }

    fn discard(&mut self) -> Option<EntryId> {
        self.list.pop_front()
    }

    fn front(&self) -> Option<EntryId> {
        self.list.front().copied()
    }

    fn back(&self) -> Option<EntryId> {
        self.list.back().copied()
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn clear(&mut self) {
        self.list.clear();
    }
}

/// Cache evicting in insertion order.
pub type FifoCache<K, V> = Engine<K, V, FifoCollection>;
