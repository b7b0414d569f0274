//! Monotonic clock and blocking sleep primitives.

use std::time::{Duration, Instant};

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// Blocking delay on the calling context.
pub trait Sleeper {
    fn sleep_millis(&mut self, ms: u64);

    fn sleep(&mut self, duration: Duration) {
        self.sleep_millis(millis(duration));
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

impl<T: Sleeper + ?Sized> Sleeper for Box<T> {
    fn sleep_millis(&mut self, ms: u64) {
        (**self).sleep_millis(ms)
    }
}

/// Milliseconds since the clock was created, backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        millis(self.origin.elapsed())
    }
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep_millis(&mut self, ms: u64) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }
}
