//! Clock and tick source seams
//!
//! Both are injected dependencies: the tick source stands for the
//! transport's session-wide time synchronization service, the wall clock
//! for the node's local clock. Production code uses [`MonotonicClock`];
//! the manual variants are settable doubles shared with the simulator
//! and unit tests.

use std::time::Instant;

use parking_lot::Mutex;

use crate::{LogicalTick, TickRate};

/// The session's synchronized tick counter, as seen by this node.
pub trait TickSource {
    /// Current logical tick reading.
    fn current_tick(&self) -> LogicalTick;

    /// Nominal tick rate; may be [`TickRate::INVALID`] when the
    /// configuration is unavailable.
    fn tick_rate(&self) -> TickRate;
}

/// The node's local clock, in seconds.
pub trait WallClock {
    fn now_secs(&self) -> f64;
}

/// Wall clock anchored to a monotonic OS instant at construction.
/// Never jumps backwards, unaffected by NTP slews of the system clock.
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for MonotonicClock {
    fn now_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Settable tick source for tests and simulation.
pub struct ManualTickSource {
    tick: Mutex<LogicalTick>,
    rate: TickRate,
}

impl ManualTickSource {
    pub fn new(rate: TickRate) -> Self {
        ManualTickSource {
            tick: Mutex::new(LogicalTick::ZERO),
            rate,
        }
    }

    pub fn set_tick(&self, tick: LogicalTick) {
        *self.tick.lock() = tick;
    }

    pub fn advance(&self, ticks: u64) {
        let mut current = self.tick.lock();
        *current = current.advance(ticks);
    }
}

impl TickSource for ManualTickSource {
    fn current_tick(&self) -> LogicalTick {
        *self.tick.lock()
    }

    fn tick_rate(&self) -> TickRate {
        self.rate
    }
}

/// Settable wall clock for tests and simulation.
pub struct ManualClock {
    secs: Mutex<f64>,
}

impl ManualClock {
    pub fn new(secs: f64) -> Self {
        ManualClock {
            secs: Mutex::new(secs),
        }
    }

    pub fn set(&self, secs: f64) {
        *self.secs.lock() = secs;
    }

    pub fn advance(&self, secs: f64) {
        *self.secs.lock() += secs;
    }
}

impl WallClock for ManualClock {
    fn now_secs(&self) -> f64 {
        *self.secs.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let t1 = clock.now_secs();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let t2 = clock.now_secs();
        assert!(t2 > t1);
    }

    #[test]
    fn test_manual_tick_source() {
        let ticks = ManualTickSource::new(TickRate::new(60));
        assert_eq!(ticks.current_tick(), LogicalTick::ZERO);

        ticks.advance(30);
        assert_eq!(ticks.current_tick(), LogicalTick::new(30));

        ticks.set_tick(LogicalTick::new(100));
        assert_eq!(ticks.current_tick(), LogicalTick::new(100));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10.0);
        clock.advance(2.5);
        assert!((clock.now_secs() - 12.5).abs() < f64::EPSILON);
    }
}
