//! Background garbage-collection driver.
//!
//! Lazy expiry only reclaims entries when the cache is touched. [`run`]
//! closes that gap: it subscribes to WRITE events, tracks the time until
//! the next scheduled expiration, and calls [`SyncCache::gc`] exactly when
//! a deadline falls due — so expired entries are evicted (and REMOVE
//! events fire) even on an otherwise idle cache.
//!
//! `run` blocks until the `stop` channel fires or disconnects; callers
//! start it on its own thread:
//!
//! ```
//! use std::time::Duration;
//! use evictkit::{gc, ReplacementPolicy};
//!
//! let cache = ReplacementPolicy::Lru.new::<u32, u32>(0);
//! let (stop_tx, stop_rx) = crossbeam_channel::bounded(0);
//!
//! std::thread::scope(|scope| {
//!     scope.spawn(|| gc::run(&cache, &stop_rx));
//!     std::thread::sleep(Duration::from_millis(20)); // let the driver subscribe
//!     cache.store_with_ttl(1, 1, Duration::from_millis(10));
//!     std::thread::sleep(Duration::from_millis(100));
//!     assert_eq!(cache.len(), 0); // collected without another cache call
//!     drop(stop_tx);
//! });
//! ```

use std::time::{Duration, Instant};

use crossbeam_channel::{after, bounded, never, select, Receiver};

use crate::event::Op;
use crate::sync::SyncCache;

/// Drives timely expiration for `cache` until `stop` fires or disconnects.
///
/// The loop waits on three inputs: a WRITE event (a new entry may move the
/// next deadline closer), the expiry timer, and `stop`. Its event channel
/// is bounded and drop-on-full, so a burst of writes costs at most one
/// extra `gc` pass.
pub fn run<K, V>(cache: &SyncCache<K, V>, stop: &Receiver<()>)
where
    K: Clone + Send,
    V: Clone + Send,
{
    let (events_tx, events) = bounded(1);
    cache.notify(events_tx.clone(), &[Op::Write]);

    // ZERO means no expiration is scheduled.
    let mut remaining = Duration::ZERO;

    loop {
        let timer = if remaining.is_zero() {
            never()
        } else {
            after(remaining)
        };

        select! {
            recv(events) -> msg => {
                let Ok(event) = msg else { break };
                let Some(expiry) = event.expiry else { continue };
                let until = expiry.saturating_duration_since(Instant::now());
                if remaining.is_zero() || until < remaining {
                    remaining = cache.gc();
                }
            }
            recv(timer) -> _ => {
                remaining = cache.gc();
            }
            recv(stop) -> _ => break,
        }
    }

    cache.ignore(&events_tx, &[]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ReplacementPolicy;
    use crossbeam_channel::bounded;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn collects_expired_entries_without_cache_traffic() {
        let cache = ReplacementPolicy::Lru.new::<u32, u32>(0);
        let (removed_tx, removed) = bounded(8);
        cache.notify(removed_tx, &[Op::Remove]);

        let (stop_tx, stop_rx) = bounded(0);
        thread::scope(|scope| {
            scope.spawn(|| run(&cache, &stop_rx));

            // Let the driver subscribe before the first write.
            thread::sleep(Duration::from_millis(20));
            cache.store_with_ttl(1, 1, Duration::from_millis(40));

            let event = removed
                .recv_timeout(Duration::from_secs(2))
                .expect("driver should evict the expired entry");
            assert_eq!(event.key, 1);
            assert_eq!(event.op, Op::Remove);
            assert_eq!(cache.len(), 0);

            drop(stop_tx);
        });
    }

    #[test]
    fn earlier_write_reschedules_the_timer() {
        let cache = ReplacementPolicy::Lru.new::<u32, u32>(0);
        let (removed_tx, removed) = bounded(8);
        cache.notify(removed_tx, &[Op::Remove]);

        let (stop_tx, stop_rx) = bounded(0);
        thread::scope(|scope| {
            scope.spawn(|| run(&cache, &stop_rx));
            thread::sleep(Duration::from_millis(20));

            cache.store_with_ttl(1, 1, Duration::from_secs(30));
            // Give the driver a beat to arm the long timer; a burst could
            // legitimately drop the second event on the bounded channel.
            thread::sleep(Duration::from_millis(20));
            cache.store_with_ttl(2, 2, Duration::from_millis(40));

            let event = removed
                .recv_timeout(Duration::from_secs(2))
                .expect("short-lived entry should be evicted promptly");
            assert_eq!(event.key, 2);
            assert!(cache.contains(&1));

            drop(stop_tx);
        });
    }

    #[test]
    fn stop_shuts_the_driver_down() {
        let cache = ReplacementPolicy::Lru.new::<u32, u32>(0);
        let (stop_tx, stop_rx) = bounded(0);
        thread::scope(|scope| {
            let driver = scope.spawn(|| run(&cache, &stop_rx));
            thread::sleep(Duration::from_millis(10));
            drop(stop_tx);
            driver.join().expect("driver exits on stop");
        });

        // The driver unsubscribed on the way out; the cache keeps working.
        cache.store_with_ttl(1, 1, Duration::from_secs(60));
        assert!(cache.contains(&1));
    }
}
