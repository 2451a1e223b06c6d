//! Clock synchronizer - authority sampling and replica reconstruction

use std::sync::Arc;

use vantage_core::{Role, TickSource, VantageError, VantageResult, WallClock};

use crate::{reconstruct, SnapshotCell, TimeSnapshot};

/// Clock synchronizer configuration
#[derive(Clone, Debug)]
pub struct ClockConfig {
    /// Publish a snapshot every N control-loop cycles; 0 means every cycle.
    pub sample_interval: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig { sample_interval: 0 }
    }
}

/// Synchronizes "current authoritative time" across the session.
///
/// The authority overwrites the replicated [`TimeSnapshot`] at its
/// sampling cadence; any node reconstructs the current value from the
/// latest snapshot plus ticks elapsed since. Sampling cadence is the
/// only cost/accuracy knob - queries never touch the network.
pub struct ClockSynchronizer {
    role: Role,
    ticks: Arc<dyn TickSource + Send + Sync>,
    wall: Arc<dyn WallClock + Send + Sync>,
    cell: SnapshotCell,
    config: ClockConfig,
    cycle: u32,
    samples_published: u64,
}

impl ClockSynchronizer {
    /// Create a synchronizer with a fresh snapshot cell (authority side).
    pub fn new(
        role: Role,
        ticks: Arc<dyn TickSource + Send + Sync>,
        wall: Arc<dyn WallClock + Send + Sync>,
        config: ClockConfig,
    ) -> Self {
        Self::with_cell(role, ticks, wall, SnapshotCell::new(), config)
    }

    /// Create a synchronizer over an existing cell (a replica's
    /// replicated copy, handed over by the transport wiring).
    pub fn with_cell(
        role: Role,
        ticks: Arc<dyn TickSource + Send + Sync>,
        wall: Arc<dyn WallClock + Send + Sync>,
        cell: SnapshotCell,
        config: ClockConfig,
    ) -> Self {
        ClockSynchronizer {
            role,
            ticks,
            wall,
            cell,
            config,
            cycle: 0,
            samples_published: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The replicated snapshot cell, for wiring replicas to this authority.
    pub fn cell(&self) -> SnapshotCell {
        self.cell.clone()
    }

    /// Snapshots published so far.
    pub fn samples_published(&self) -> u64 {
        self.samples_published
    }

    /// Stamp and publish a snapshot, honoring the configured cadence.
    ///
    /// Call once per control-loop cycle on the authority. The only
    /// mutator of the replicated snapshot.
    pub fn sample_tick(&mut self) -> VantageResult<()> {
        if !self.role.is_authority() {
            return Err(VantageError::NotAuthority(self.role));
        }

        let due = self.config.sample_interval == 0
            || self.cycle % self.config.sample_interval == 0;
        self.cycle = self.cycle.wrapping_add(1);
        if !due {
            return Ok(());
        }

        self.cell.publish(TimeSnapshot::new(
            self.wall.now_secs(),
            self.ticks.current_tick(),
        ));
        self.samples_published += 1;
        Ok(())
    }

    /// Current authoritative time in seconds. Never fails.
    ///
    /// The authority reads its own clock directly; replicas reconstruct
    /// from the latest snapshot, with defined fallbacks for "no sample
    /// yet" and "invalid tick rate".
    pub fn authoritative_time(&self) -> f64 {
        self.reader().authoritative_time()
    }

    /// A cheap cloneable read view, for binding into a [`crate::ClockHandle`].
    pub fn reader(&self) -> ClockReader {
        ClockReader {
            role: self.role,
            ticks: Arc::clone(&self.ticks),
            wall: Arc::clone(&self.wall),
            cell: self.cell.clone(),
        }
    }
}

/// Read-only view over a synchronizer's inputs.
#[derive(Clone)]
pub struct ClockReader {
    role: Role,
    ticks: Arc<dyn TickSource + Send + Sync>,
    wall: Arc<dyn WallClock + Send + Sync>,
    cell: SnapshotCell,
}

impl ClockReader {
    pub fn authoritative_time(&self) -> f64 {
        if self.role.is_authority() {
            return self.wall.now_secs();
        }
        reconstruct(
            self.cell.load(),
            self.ticks.current_tick(),
            self.ticks.tick_rate(),
        )
    }
}
