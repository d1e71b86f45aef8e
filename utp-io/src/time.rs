//! Timing utilities for the connection dispatch loop
//!
//! The transport core never blocks; the owning loop periodically drives
//! `process_send_queue` and `process_timeout` on every connection. The
//! [`Timer`] here paces those ticks.

use std::time::{Duration, Instant};

/// Timer for periodic operations
pub struct Timer {
    interval: Duration,
    last_fire: Instant,
}

impl Timer {
    /// Create a new timer with the given interval
    pub fn new(interval: Duration) -> Self {
        Timer {
            interval,
            last_fire: Instant::now(),
        }
    }

    /// Check if the timer has expired
    pub fn expired(&self) -> bool {
        self.last_fire.elapsed() >= self.interval
    }

    /// Reset the timer
    pub fn reset(&mut self) {
        self.last_fire = Instant::now();
    }

    /// Get time until next expiration
    pub fn time_until_expiration(&self) -> Duration {
        let elapsed = self.last_fire.elapsed();
        if elapsed >= self.interval {
            Duration::ZERO
        } else {
            self.interval - elapsed
        }
    }

    /// Fire the timer if expired, returning true if it fired
    pub fn try_fire(&mut self) -> bool {
        if self.expired() {
            self.reset();
            true
        } else {
            false
        }
    }
}
