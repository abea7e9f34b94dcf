//! Request pacing for the provider client.
//!
//! The provider asks clients to stay around one request per second. Every
//! request reserves the next free slot; if the previous request was less than
//! `min_interval` ago the caller sleeps for the remainder.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Minimum-spacing rate limiter shared by all provider calls.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_slot: Mutex::new(None),
        }
    }

    /// A limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until the next request slot is available. Returns the time waited.
    pub fn acquire(&self) -> Duration {
        let wait = self.reserve(Instant::now());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        wait
    }

    /// Claim the next slot as of `now` and report how long the caller must wait.
    fn reserve(&self, now: Instant) -> Duration {
        let mut last = self.last_slot.lock().unwrap_or_else(|e| e.into_inner());
        let slot = match *last {
            Some(prev) => (prev + self.min_interval).max(now),
            None => now,
        };
        *last = Some(slot);
        slot - now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_is_immediate() {
        let rl = RateLimiter::new(Duration::from_secs(1));
        assert_eq!(rl.reserve(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn back_to_back_requests_are_spaced() {
        let rl = RateLimiter::new(Duration::from_millis(1050));
        let t0 = Instant::now();
        assert_eq!(rl.reserve(t0), Duration::ZERO);
        assert_eq!(rl.reserve(t0), Duration::from_millis(1050));
        // Third caller queues behind the second.
        assert_eq!(rl.reserve(t0), Duration::from_millis(2100));
    }

    #[test]
    fn idle_gap_resets_wait() {
        let rl = RateLimiter::new(Duration::from_millis(100));
        let t0 = Instant::now();
        rl.reserve(t0);
        assert_eq!(rl.reserve(t0 + Duration::from_millis(250)), Duration::ZERO);
        assert_eq!(
            rl.reserve(t0 + Duration::from_millis(300)),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn unlimited_never_waits() {
        let rl = RateLimiter::unlimited();
        assert_eq!(rl.acquire(), Duration::ZERO);
        assert_eq!(rl.acquire(), Duration::ZERO);
    }
}
