//! Most-recently-used replacement.
//!
//! Like LRU, entries are admitted at the front and promoted on hit — but
//! eviction also takes the front, so the hottest entry is sacrificed
//! first. Useful when recent hits predict *no* further use (e.g. one-pass
//! scans over data larger than the cache).

use crate::ds::{IntrusiveList, SlotId};
use crate::engine::{Collection, Engine, EntryId};

/// MRU ordering: admit at the front, promote on hit, discard from the front.
#[derive(Debug, Default)]
pub struct MruCollection {
    list: IntrusiveList<EntryId>,
}

impl Collection for MruCollection {
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

/// Cache evicting the most recently used entry.
pub type MruCache<K, V> = Engine<K, V, MruCollection>;
