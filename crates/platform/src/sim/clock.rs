use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::time::{Clock, Sleeper};

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: u64) -> Self {
        let clock = Self::new();
        clock.set(ms);
        clock
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Sleeper that advances a [`ManualClock`] instead of blocking.
#[derive(Debug, Clone)]
pub struct SimSleeper {
    clock: ManualClock,
    slept: Arc<AtomicU64>,
}

impl SimSleeper {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            slept: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Total simulated milliseconds spent sleeping through this sleeper
    /// and its clones.
    pub fn total_slept(&self) -> u64 {
        self.slept.load(Ordering::SeqCst)
    }
}

impl Sleeper for SimSleeper {
    fn sleep_millis(&mut self, ms: u64) {
        self.slept.fetch_add(ms, Ordering::SeqCst);
        self.clock.advance(ms);
    }
}
