//! Least-recently-used replacement.
//!
//! Entries are admitted at the front of a list, promoted back to the
//! front on every hit, and evicted from the back. The back of the list is
//! therefore always the entry untouched for the longest time.
//!
//! This is also the building block of the adaptive policy: the four ARC
//! sub-caches are engines over this collection.

use crate::ds::{IntrusiveList, SlotId};
use crate::engine::{Collection, Engine, EntryId};

/// LRU ordering: admit at the front, promote on hit, discard from the back.
#[derive(Debug, Default)]
pub struct LruCollection {
    list: IntrusiveList<EntryId>,
}

impl Collection for LruCollection {
    type Handle = SlotId;

    fn add(&mut self, id: EntryId) -> SlotId {
        self.list.push_front(id)
    }

    fn touch(&mut self, handle: SlotId) {
        self.list.move_to_front(handle);
    }

    fn remove(&mut self, handle: SlotId) {
        self.list.remove(handle);
    }

    fn discard(&mut self) -> Option<EntryId> {
        self.list.pop_back()
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

/// Cache evicting the least recently used entry.
pub type LruCache<K, V> = Engine<K, V, LruCollection>;
