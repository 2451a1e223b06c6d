//! Deterministic session simulator
//!
//! Simulates:
//! - One authority plus N replicas sharing a manual tick source
//! - Scripted per-peer visibility probes
//! - An in-order loopback delivering reports within the same step

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use vantage_core::{ManualClock, ManualTickSource, PeerId, SessionId, TickRate, TickSource, WallClock};
use vantage_presence::{AggregateEvent, Aggregates, ReporterConfig, ViewBinding, VisibilityProbe};
use vantage_runtime::{NodeConfig, SessionNode};
use vantage_clock::ClockConfig;

/// Scripted visibility value, settable from the test.
#[derive(Default)]
pub struct ScriptedProbe {
    visible: Mutex<bool>,
}

impl ScriptedProbe {
    pub fn set(&self, visible: bool) {
        *self.visible.lock() = visible;
    }
}

impl VisibilityProbe for ScriptedProbe {
    fn is_visible(&self, _binding: &ViewBinding) -> bool {
        *self.visible.lock()
    }
}

/// Simulator configuration
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Nominal tick rate of the simulated session.
    pub tick_rate: u32,
    /// Simulated time per step.
    pub step: Duration,
    /// Replica evaluation cadence.
    pub eval_interval: Duration,
    /// Publish a clock snapshot every N authority cycles (0 = every).
    pub sample_interval: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            tick_rate: 60,
            step: Duration::from_millis(50),
            eval_interval: Duration::from_millis(100),
            sample_interval: 0,
        }
    }
}

/// One authority plus N replicas over an in-order loopback.
pub struct SessionSimulator {
    config: SimConfig,
    ticks: Arc<ManualTickSource>,
    host_wall: Arc<ManualClock>,
    authority: SessionNode,
    replicas: Vec<SessionNode>,
    probes: HashMap<PeerId, Arc<ScriptedProbe>>,
    base: Instant,
    elapsed: Duration,
    tick_residue: f64,
    events: Vec<AggregateEvent>,
}

impl SessionSimulator {
    pub const HOST: PeerId = PeerId(1);

    /// Build a session with `replica_count` replicas, all hidden.
    pub fn new(replica_count: usize, config: SimConfig) -> Self {
        let ticks = Arc::new(ManualTickSource::new(TickRate::new(config.tick_rate)));
        let host_wall = Arc::new(ManualClock::new(0.0));
        let node_config = NodeConfig {
            clock: ClockConfig {
                sample_interval: config.sample_interval,
            },
            reporter: ReporterConfig {
                eval_interval: config.eval_interval,
                // Deterministic: no stagger in simulation
                max_phase_offset: Duration::ZERO,
            },
        };

        let session = SessionId::new(1);
        let mut authority = SessionNode::authority(
            Self::HOST,
            session,
            Arc::clone(&ticks) as Arc<dyn TickSource + Send + Sync>,
            Arc::clone(&host_wall) as Arc<dyn WallClock + Send + Sync>,
            node_config.clone(),
        );

        let mut probes = HashMap::new();
        probes.insert(Self::HOST, Arc::new(ScriptedProbe::default()));

        let mut replicas = Vec::with_capacity(replica_count);
        for i in 0..replica_count {
            let id = PeerId::new(2 + i as u64);
            let replica = SessionNode::replica(
                id,
                session,
                Arc::clone(&ticks) as Arc<dyn TickSource + Send + Sync>,
                Arc::new(ManualClock::new(0.0)),
                authority.snapshot_cell(),
                node_config.clone(),
            );
            authority.peer_joined(id);
            probes.insert(id, Arc::new(ScriptedProbe::default()));
            replicas.push(replica);
        }

        SessionSimulator {
            config,
            ticks,
            host_wall,
            authority,
            replicas,
            probes,
            base: Instant::now(),
            elapsed: Duration::ZERO,
            tick_residue: 0.0,
            events: Vec::new(),
        }
    }

    pub fn authority(&self) -> &SessionNode {
        &self.authority
    }

    pub fn replica(&self, index: usize) -> &SessionNode {
        &self.replicas[index]
    }

    pub fn replica_id(&self, index: usize) -> PeerId {
        self.replicas[index].id()
    }

    /// Authority-side ground-truth time.
    pub fn host_time(&self) -> f64 {
        self.host_wall.now_secs()
    }

    /// Script a peer's visibility test result.
    pub fn set_visible(&mut self, peer: PeerId, visible: bool) {
        if let Some(probe) = self.probes.get(&peer) {
            probe.set(visible);
        }
    }

    /// Run `n` simulation steps.
    ///
    /// Each step advances simulated time and the tick counter, runs the
    /// authority cycle, then every replica cycle, delivering any report
    /// to the authority immediately (the loopback preserves per-sender
    /// order by construction).
    pub fn step(&mut self, n: usize) {
        for _ in 0..n {
            self.elapsed += self.config.step;
            self.host_wall.advance(self.config.step.as_secs_f64());
            self.advance_ticks();

            let now = self.base + self.elapsed;
            let host_probe = Arc::clone(&self.probes[&Self::HOST]);
            self.authority
                .tick(now, host_probe.as_ref())
                .expect("authority cycle");

            for replica in &mut self.replicas {
                if !replica.is_attached() {
                    continue;
                }
                let probe = Arc::clone(&self.probes[&replica.id()]);
                let report = replica.tick(now, probe.as_ref()).expect("replica cycle");
                if let Some(report) = report {
                    self.authority
                        .deliver_report(replica.id(), report)
                        .expect("loopback delivery");
                }
            }

            while let Some(event) = self.authority.poll_event() {
                self.events.push(event);
            }
        }
    }

    fn advance_ticks(&mut self) {
        let exact =
            self.config.step.as_secs_f64() * self.config.tick_rate as f64 + self.tick_residue;
        let whole = exact.floor();
        self.tick_residue = exact - whole;
        self.ticks.advance(whole as u64);
    }

    /// Detach a replica mid-session: final report through the loopback,
    /// then the membership leave observation.
    pub fn depart(&mut self, index: usize) {
        let id = self.replicas[index].id();
        let report = self.replicas[index].detach().expect("detach replica");
        if let Some(report) = report {
            self.authority
                .deliver_report(id, report)
                .expect("final report delivery");
        }
        self.authority.peer_left(id);
        while let Some(event) = self.authority.poll_event() {
            self.events.push(event);
        }
    }

    pub fn aggregates(&self) -> Aggregates {
        self.authority.aggregates()
    }

    /// Events observed so far, in emission order.
    pub fn events(&self) -> &[AggregateEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<AggregateEvent> {
        std::mem::take(&mut self.events)
    }
}
