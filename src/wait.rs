//! Minimum quiet time between two frames.

use embassy_time::{Duration, Instant};

/// Latch time the leds need after the last bit of a frame
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_micros(50);

/// Monotonic time source
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// `embassy-time` system clock, needs a time driver in the final binary
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Earliest instant the next frame may start
#[derive(Debug, Clone, Copy)]
pub struct MinWait {
    hold_off: Duration,
    ready_at: Option<Instant>,
}

impl MinWait {
    pub const fn new(hold_off: Duration) -> Self {
        Self {
            hold_off,
            ready_at: None,
        }
    }

    pub fn hold_off(&self) -> Duration {
        self.hold_off
    }

    /// Time left until the next frame may start, zero if it may start now
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.ready_at {
            Some(ready_at) => ready_at.saturating_duration_since(now),
            None => Duration::from_ticks(0),
        }
    }

    /// A frame just finished at `now`
    pub fn mark(&mut self, now: Instant) {
        self.ready_at = Some(now + self.hold_off);
    }

    /// Block the next frame for `delay`, e.g. for a startup delay
    pub fn hold(&mut self, now: Instant, delay: Duration) {
        self.ready_at = Some(now + delay);
    }
}

/// Microseconds to sleep for `remaining`, rounded up
pub(crate) fn sleep_us(remaining: Duration) -> u32 {
    let us = remaining
        .as_ticks()
        .saturating_mul(1_000_000)
        .div_ceil(embassy_time::TICK_HZ);
    us.min(u32::MAX as u64) as u32
}
