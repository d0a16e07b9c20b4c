//! Last-in, first-out replacement.
//!
//! Entries are admitted at the front of a list and evicted from the front:
//! the most recent store is the first to go. Hits do not reorder.

use crate::ds::{IntrusiveList, SlotId};
use crate::engine::{Collection, Engine, EntryId};

/// LIFO ordering: admit at the front, discard from the front.
#[derive(Debug, Default)]
pub struct LifoCollection {
    list: IntrusiveList<EntryId>,
}

impl Collection for LifoCollection {
    type Handle = SlotId;

    fn add(&mut self, id: EntryId) -> SlotId {
        self.list.push_front(id)
    }

    fn touch(&mut self, _handle: SlotId) {}

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

/// Cache evicting the most recently stored entry first.
pub type LifoCache<K, V> = Engine<K, V, LifoCollection>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Cache;

    #[test]
    fn discards_newest_first() {
        let mut coll = LifoCollection::default();
        let a = SlotId(1);
        let b = SlotId(2);
        coll.add(a);
        coll.add(b);
        assert_eq!(coll.discard(), Some(b));
        assert_eq!(coll.discard(), Some(a));
    }

    #[test]
    fn newest_store_is_evicted_at_capacity() {
        let mut cache: LifoCache<u32, u32> = LifoCache::new(2);
        cache.store(1, 1);
        cache.store(2, 2);
        cache.store(3, 3);
        assert!(!cache.contains(&2));
        assert!(cache.contains(&1));
        assert!(cache.contains(&3));
    }
}
