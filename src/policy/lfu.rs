//! Least-frequently-used replacement.
//!
//! Each entry carries an access count: zero on admission, incremented on
//! every hit. The collection keeps a min-heap over the counts, so the
//! entry with the fewest hits is popped in O(log n). Entries with equal
//! counts are ordered by their heap position — sift comparisons are
//! strict, so a newcomer never displaces an equal-count incumbent.
//!
//! Heap nodes live in a [`SlotArena`] and mirror their position, which
//! makes removal of an arbitrary entry (delete, expiry) O(log n) as well.

use crate::ds::{SlotArena, SlotId};
use crate::engine::{Collection, Engine, EntryId};

#[derive(Debug)]
struct FreqNode {
    entry: EntryId,
    count: u64,
    pos: usize,
}

/// LFU ordering: min-heap over per-entry access counts.
#[derive(Debug, Default)]
pub struct LfuCollection {
    nodes: SlotArena<FreqNode>,
    heap: Vec<SlotId>,
}

impl LfuCollection {
    fn count_at(&self, pos: usize) -> u64 {
        self.nodes
            .get(self.heap[pos])
            .map(|node| node.count)
            .unwrap_or(u64::MAX)
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.count_at(a) < self.count_at(b)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        if let Some(node) = self.nodes.get_mut(self.heap[a]) {
            node.pos = a;
        }
        if let Some(node) = self.nodes.get_mut(self.heap[b]) {
            node.pos = b;
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(pos, parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, pos: usize) -> bool {
        let n = self.heap.len();
        let mut i = pos;
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let mut child = left;
            let right = left + 1;
            if right < n && self.less(right, left) {
                child = right;
            }
            if !self.less(child, i) {
                break;
            }
            self.swap(i, child);
            i = child;
        }
        i > pos
    }

    /// Restores heap order around `pos` after its count changed.
    fn fix(&mut self, pos: usize) {
        if !self.sift_down(pos) {
            self.sift_up(pos);
        }
    }

    fn remove_at(&mut self, pos: usize) -> Option<FreqNode> {
        let last = self.heap.len() - 1;
        if pos != last {
            self.swap(pos, last);
        }
        let node_id = self.heap.pop()?;
        let node = self.nodes.remove(node_id);
        if pos < self.heap.len() {
            self.fix(pos);
        }
        node
    }
}

impl Collection for LfuCollection {
    type Handle = SlotId;

    fn add(&mut self, id: EntryId) -> SlotId {
        let pos = self.heap.len();
        let node_id = self.nodes.insert(FreqNode {
            entry: id,
            count: 0,
            pos,
        });
        self.heap.push(node_id);
        self.sift_up(pos);
        node_id
    }

    fn touch(&mut self, handle: SlotId) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        node.count += 1;
        let pos = node.pos;
        self.fix(pos);
    }

    fn remove(&mut self, handle: SlotId) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        let pos = node.pos;
        if pos < self.heap.len() && self.heap[pos] == handle {
            self.remove_at(pos);
        }
    }

    fn discard(&mut self) -> Option<EntryId> {
        if self.heap.is_empty() {
            return None;
        }
        self.remove_at(0).map(|node| node.entry)
    }

    fn front(&self) -> Option<EntryId> {
        self.heap
            .first()
            .and_then(|&id| self.nodes.get(id))
            .map(|node| node.entry)
    }

    fn back(&self) -> Option<EntryId> {
        self.heap
            .last()
            .and_then(|&id| self.nodes.get(id))
            .map(|node| node.entry)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.heap.clear();
    }
}

/// Cache evicting the least frequently used entry.
pub type LfuCache<K, V> = Engine<K, V, LfuCollection>;
