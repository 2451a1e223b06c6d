//! Logical tick primitives
//!
//! The session's transport layer keeps one monotonically increasing tick
//! counter synchronized across every member, advancing at a fixed nominal
//! rate independent of any single node's frame rate. Vantage uses that
//! counter as its shared time base instead of wall-clock interpolation,
//! so replicated anchors never accumulate drift between writes.

use std::fmt;

/// A reading of the session-wide logical tick counter.
///
/// `ZERO` doubles as the "never sampled" sentinel when embedded in a
/// time snapshot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogicalTick(pub u64);

impl LogicalTick {
    pub const ZERO: LogicalTick = LogicalTick(0);

    #[inline]
    pub fn new(tick: u64) -> Self {
        LogicalTick(tick)
    }

    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn advance(self, ticks: u64) -> Self {
        LogicalTick(self.0.saturating_add(ticks))
    }

    /// Ticks elapsed since an earlier reading.
    ///
    /// Saturates at zero: observing an "earlier" reading that is actually
    /// ahead of us (stale local counter) yields zero elapsed ticks rather
    /// than a huge wrapped value.
    #[inline]
    pub fn ticks_since(self, earlier: LogicalTick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Debug for LogicalTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tick({})", self.0)
    }
}

/// Nominal tick rate in ticks per second.
///
/// Zero encodes "misconfigured or unavailable"; callers must check
/// [`TickRate::is_valid`] before converting tick deltas to seconds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TickRate(pub u32);

impl TickRate {
    pub const INVALID: TickRate = TickRate(0);

    #[inline]
    pub fn new(per_second: u32) -> Self {
        TickRate(per_second)
    }

    #[inline]
    pub fn per_second(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }

    /// Convert a tick delta to seconds.
    ///
    /// The delta is kept in integer width until the final division, so
    /// long sessions do not lose precision to intermediate float math.
    /// Returns 0.0 for an invalid rate.
    #[inline]
    pub fn seconds_for(self, ticks: u64) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        ticks as f64 / self.0 as f64
    }
}

impl fmt::Debug for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TickRate({}/s)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_since() {
        let t0 = LogicalTick::new(100);
        let t1 = LogicalTick::new(160);

        assert_eq!(t1.ticks_since(t0), 60);
        // Saturates instead of wrapping
        assert_eq!(t0.ticks_since(t1), 0);
    }

    #[test]
    fn test_tick_rate_seconds_for() {
        let rate = TickRate::new(60);
        assert!((rate.seconds_for(60) - 1.0).abs() < f64::EPSILON);
        assert!((rate.seconds_for(90) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_rate_yields_zero() {
        assert!(!TickRate::INVALID.is_valid());
        assert_eq!(TickRate::INVALID.seconds_for(1000), 0.0);
    }

    #[test]
    fn test_advance_saturates() {
        let t = LogicalTick::new(u64::MAX - 1);
        assert_eq!(t.advance(10), LogicalTick::new(u64::MAX));
    }
}
