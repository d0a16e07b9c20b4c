//! Internal data structures shared by the cache engine and policies.

pub mod expiring_heap;
pub mod intrusive_list;
pub mod slot_arena;

pub use expiring_heap::{Deadline, ExpiringHeap, NO_SLOT};
pub use intrusive_list::IntrusiveList;
pub use slot_arena::{SlotArena, SlotId};
