//! Replicated time snapshot and the reconstruction rule

use std::sync::Arc;

use parking_lot::RwLock;

use vantage_core::{LogicalTick, TickRate};

/// The authority's last published (time, tick) anchor.
///
/// INVARIANT: `tick_at_snapshot` is non-decreasing over a cell's
/// lifetime. `LogicalTick::ZERO` means no sample has been taken yet.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeSnapshot {
    /// Authority local time at the moment of sampling, in seconds.
    pub host_time_secs: f64,
    /// Logical tick at the moment of sampling.
    pub tick_at_snapshot: LogicalTick,
}

impl TimeSnapshot {
    pub fn new(host_time_secs: f64, tick_at_snapshot: LogicalTick) -> Self {
        TimeSnapshot {
            host_time_secs,
            tick_at_snapshot,
        }
    }

    /// Has the authority published at least one sample?
    #[inline]
    pub fn is_sampled(&self) -> bool {
        self.tick_at_snapshot != LogicalTick::ZERO
    }
}

/// Reconstruct current authoritative time from a snapshot.
///
/// Pure in its inputs. Fallbacks are values, never errors:
/// - no sample yet: the raw replicated time (0.0 by construction)
/// - invalid tick rate: the anchor time, unadjusted
/// - otherwise: `host_time_secs + (now - tick_at_snapshot) / rate`
pub fn reconstruct(snapshot: TimeSnapshot, now: LogicalTick, rate: TickRate) -> f64 {
    if !snapshot.is_sampled() {
        return snapshot.host_time_secs;
    }
    if !rate.is_valid() {
        return snapshot.host_time_secs;
    }
    let elapsed = now.ticks_since(snapshot.tick_at_snapshot);
    snapshot.host_time_secs + rate.seconds_for(elapsed)
}

/// Shared cell standing in for the replicated snapshot variable.
///
/// The authority is the only writer; replicas hold a cloned handle as
/// their read-only replicated copy. The transport layer's delivery delay
/// lives between `publish` and the replica's next `load`.
#[derive(Clone, Default)]
pub struct SnapshotCell {
    inner: Arc<RwLock<TimeSnapshot>>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        SnapshotCell::default()
    }

    /// Overwrite the replicated snapshot. Authority-side only.
    ///
    /// A regressing tick is dropped to preserve the non-decreasing
    /// invariant; a monotone tick source never produces one.
    pub fn publish(&self, snapshot: TimeSnapshot) {
        let mut current = self.inner.write();
        if snapshot.tick_at_snapshot < current.tick_at_snapshot {
            return;
        }
        *current = snapshot;
    }

    /// Read the latest replicated snapshot.
    pub fn load(&self) -> TimeSnapshot {
        *self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruction_formula() {
        let snapshot = TimeSnapshot::new(10.0, LogicalTick::new(100));
        let now = LogicalTick::new(160);
        let rate = TickRate::new(60);

        // 10.0 + 60/60 = 11.0
        let time = reconstruct(snapshot, now, rate);
        assert!((time - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_sample_fallback() {
        let snapshot = TimeSnapshot::default();
        assert!(!snapshot.is_sampled());

        // Raw replicated value regardless of current tick
        let time = reconstruct(snapshot, LogicalTick::new(9999), TickRate::new(60));
        assert_eq!(time, 0.0);
    }

    #[test]
    fn test_invalid_rate_fallback() {
        let snapshot = TimeSnapshot::new(42.5, LogicalTick::new(500));

        let time = reconstruct(snapshot, LogicalTick::new(800), TickRate::INVALID);
        assert_eq!(time, 42.5);
    }

    #[test]
    fn test_stale_tick_reads_anchor() {
        // A replica whose local counter lags the anchor sees zero elapsed
        let snapshot = TimeSnapshot::new(5.0, LogicalTick::new(200));
        let time = reconstruct(snapshot, LogicalTick::new(150), TickRate::new(60));
        assert_eq!(time, 5.0);
    }

    #[test]
    fn test_cell_rejects_regressing_tick() {
        let cell = SnapshotCell::new();
        cell.publish(TimeSnapshot::new(2.0, LogicalTick::new(120)));
        cell.publish(TimeSnapshot::new(1.0, LogicalTick::new(60)));

        assert_eq!(cell.load().tick_at_snapshot, LogicalTick::new(120));
    }

    #[test]
    fn test_cell_clone_shares_state() {
        let cell = SnapshotCell::new();
        let replica_copy = cell.clone();

        cell.publish(TimeSnapshot::new(3.0, LogicalTick::new(30)));
        assert_eq!(replica_copy.load(), TimeSnapshot::new(3.0, LogicalTick::new(30)));
    }
}
