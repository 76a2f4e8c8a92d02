use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Paces the *start* of operations: successive `acquire` releases are at least
/// `interval` apart, however many callers are waiting. Completion is not tracked.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        RateLimiter {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for the next free slot.
    ///
    /// Slots are handed out in the order callers reach the lock, so every caller
    /// reserves a distinct instant and then sleeps until it without holding the lock.
    pub async fn acquire(&self) {
        let slot = {
            let mut next_slot = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let slot = match *next_slot {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot
        };

        sleep_until(slot).await;
    }
}
