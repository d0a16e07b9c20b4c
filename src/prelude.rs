//! Convenience re-exports of the working set.

pub use crate::builder::CacheBuilder;
pub use crate::event::{Event, Op};
pub use crate::policy::ReplacementPolicy;
pub use crate::sync::SyncCache;
pub use crate::traits::Cache;
