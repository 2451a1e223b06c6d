//! Session node - one member's runtime surface

use std::sync::Arc;
use std::time::Instant;

use vantage_clock::{ClockConfig, ClockHandle, ClockSynchronizer, SnapshotCell};
use vantage_core::{
    PeerId, Role, SessionId, TickSource, VantageError, VantageResult, WallClock,
};
use vantage_presence::{
    AggregateEvent, Aggregates, ReporterConfig, Roster, VisibilityAggregator, VisibilityProbe,
    VisibilityReport, VisibilityReporter,
};

/// Session node configuration
#[derive(Clone, Debug, Default)]
pub struct NodeConfig {
    pub clock: ClockConfig,
    pub reporter: ReporterConfig,
}

/// Runtime counters
#[derive(Clone, Copy, Debug, Default)]
pub struct RuntimeStats {
    pub cycles: u64,
    pub samples_published: u64,
    pub reports_in: u64,
    pub reports_out: u64,
    pub events_emitted: u64,
}

/// One session member: the authority aggregates and publishes time,
/// replicas report and reconstruct.
///
/// All authority-side mutation happens on the caller's single execution
/// context, strictly sequentially in arrival order; nothing here locks
/// beyond the replicated snapshot cell.
pub struct SessionNode {
    id: PeerId,
    session: SessionId,
    role: Role,
    roster: Roster,
    clock: ClockSynchronizer,
    handle: ClockHandle,
    /// Authority side only.
    aggregator: Option<VisibilityAggregator>,
    /// Every member runs the local test; the authority folds its own
    /// reports in directly instead of sending them anywhere.
    reporter: VisibilityReporter,
    attached: bool,
    stats: RuntimeStats,
}

impl SessionNode {
    /// Create the authority node with a fresh snapshot cell.
    pub fn authority(
        id: PeerId,
        session: SessionId,
        ticks: Arc<dyn TickSource + Send + Sync>,
        wall: Arc<dyn WallClock + Send + Sync>,
        config: NodeConfig,
    ) -> Self {
        let clock = ClockSynchronizer::new(Role::Authority, ticks, wall, config.clock);
        let mut roster = Roster::new();
        roster.insert(id);
        Self::assemble(id, session, Role::Authority, roster, clock, config.reporter)
    }

    /// Create a replica node over the authority's replicated cell.
    pub fn replica(
        id: PeerId,
        session: SessionId,
        ticks: Arc<dyn TickSource + Send + Sync>,
        wall: Arc<dyn WallClock + Send + Sync>,
        cell: SnapshotCell,
        config: NodeConfig,
    ) -> Self {
        let clock =
            ClockSynchronizer::with_cell(Role::Replica, ticks, wall, cell, config.clock);
        Self::assemble(id, session, Role::Replica, Roster::new(), clock, config.reporter)
    }

    fn assemble(
        id: PeerId,
        session: SessionId,
        role: Role,
        roster: Roster,
        clock: ClockSynchronizer,
        reporter_config: ReporterConfig,
    ) -> Self {
        let handle = ClockHandle::new();
        handle.bind(clock.reader());
        SessionNode {
            id,
            session,
            role,
            roster,
            clock,
            handle,
            aggregator: role.is_authority().then(VisibilityAggregator::new),
            reporter: VisibilityReporter::new(reporter_config),
            attached: true,
            stats: RuntimeStats::default(),
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The replicated snapshot cell, for wiring replicas to this authority.
    pub fn snapshot_cell(&self) -> SnapshotCell {
        self.clock.cell()
    }

    /// Clock handle for the hosting environment to inject wherever a
    /// time read is needed. Stays valid (degrading to zero) after detach.
    pub fn clock_handle(&self) -> ClockHandle {
        self.handle.clone()
    }

    /// Current authoritative time in seconds.
    pub fn time(&self) -> f64 {
        self.handle.authoritative_time()
    }

    /// Inject the viewpoint/drawable pair for the local visibility test.
    pub fn set_view_binding(&mut self, binding: vantage_presence::ViewBinding) {
        self.reporter.set_binding(binding);
    }

    /// One control-loop cycle.
    ///
    /// The authority publishes a time sample (at its configured cadence)
    /// and folds its own visibility observation in directly. A replica
    /// returns the report the transport should deliver, if its state
    /// changed this cycle.
    pub fn tick(
        &mut self,
        now: Instant,
        probe: &dyn VisibilityProbe,
    ) -> VantageResult<Option<VisibilityReport>> {
        self.stats.cycles += 1;

        if self.role.is_authority() {
            self.clock.sample_tick()?;
            if let Some(report) = self.reporter.poll(now, probe) {
                self.apply_report(self.id, report);
            }
            return Ok(None);
        }

        let report = self.reporter.poll(now, probe);
        if report.is_some() {
            self.stats.reports_out += 1;
        }
        Ok(report)
    }

    /// Inbound report path, authority only.
    ///
    /// `sender` comes from the transport's call-context metadata. The
    /// transport's per-sender ordered delivery is a precondition here:
    /// reports from one peer are applied in the order they were sent.
    pub fn deliver_report(
        &mut self,
        sender: PeerId,
        report: VisibilityReport,
    ) -> VantageResult<()> {
        if !self.role.is_authority() {
            return Err(VantageError::NotAuthority(self.role));
        }
        self.stats.reports_in += 1;
        self.apply_report(sender, report);
        Ok(())
    }

    fn apply_report(&mut self, sender: PeerId, report: VisibilityReport) {
        if let Some(aggregator) = self.aggregator.as_mut() {
            let before = aggregator.pending_events();
            aggregator.report_visibility(sender, report, &self.roster);
            self.stats.events_emitted += (aggregator.pending_events() - before) as u64;
        }
    }

    /// Membership observation: a peer joined the session.
    pub fn peer_joined(&mut self, peer: PeerId) {
        if !self.roster.insert(peer) {
            return;
        }
        self.recompute_aggregates();
    }

    /// Membership observation: a peer left the session.
    pub fn peer_left(&mut self, peer: PeerId) {
        if !self.roster.remove(peer) {
            tracing::warn!(peer = %peer, "leave notification for unknown peer");
            return;
        }
        self.recompute_aggregates();
    }

    fn recompute_aggregates(&mut self) {
        if let Some(aggregator) = self.aggregator.as_mut() {
            let before = aggregator.pending_events();
            aggregator.recompute(&self.roster);
            self.stats.events_emitted += (aggregator.pending_events() - before) as u64;
        }
    }

    /// The four aggregate predicates. All false on a replica, which
    /// holds no aggregate state.
    pub fn aggregates(&self) -> Aggregates {
        self.aggregator
            .as_ref()
            .map(VisibilityAggregator::aggregates)
            .unwrap_or_default()
    }

    /// Next queued aggregate event, authority only.
    pub fn poll_event(&mut self) -> Option<AggregateEvent> {
        self.aggregator.as_mut().and_then(VisibilityAggregator::poll_event)
    }

    /// Replica shutdown: force a final hidden report if needed and
    /// unbind the clock handle.
    pub fn detach(&mut self) -> VantageResult<Option<VisibilityReport>> {
        if self.role.is_authority() {
            return Err(VantageError::NotReplica(self.role));
        }
        if !self.attached {
            return Err(VantageError::AlreadyDetached);
        }
        self.attached = false;
        let report = self.reporter.deactivate();
        if report.is_some() {
            self.stats.reports_out += 1;
        }
        self.handle.unbind();
        Ok(report)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            samples_published: self.clock.samples_published(),
            ..self.stats
        }
    }
}

impl Drop for SessionNode {
    fn drop(&mut self) {
        // Session stop: whatever handles the environment still holds
        // must degrade to the defined fallback, not read stale state.
        self.handle.unbind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vantage_core::{LogicalTick, ManualClock, ManualTickSource, TickRate};
    use vantage_presence::ViewBinding;

    struct FixedProbe(bool);

    impl VisibilityProbe for FixedProbe {
        fn is_visible(&self, _binding: &ViewBinding) -> bool {
            self.0
        }
    }

    fn config() -> NodeConfig {
        NodeConfig {
            clock: ClockConfig::default(),
            reporter: ReporterConfig {
                eval_interval: Duration::from_millis(100),
                max_phase_offset: Duration::ZERO,
            },
        }
    }

    fn authority(ticks: &Arc<ManualTickSource>, wall: &Arc<ManualClock>) -> SessionNode {
        SessionNode::authority(
            PeerId::new(1),
            SessionId::new(9),
            Arc::clone(ticks) as Arc<dyn TickSource + Send + Sync>,
            Arc::clone(wall) as Arc<dyn WallClock + Send + Sync>,
            config(),
        )
    }

    #[test]
    fn test_authority_publishes_and_reads_own_clock() {
        let ticks = Arc::new(ManualTickSource::new(TickRate::new(60)));
        let wall = Arc::new(ManualClock::new(5.0));
        let mut node = authority(&ticks, &wall);

        node.tick(Instant::now(), &FixedProbe(false)).unwrap();
        assert_eq!(node.stats().samples_published, 1);
        assert!((node.time() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_replica_time_through_handle() {
        let ticks = Arc::new(ManualTickSource::new(TickRate::new(60)));
        let wall = Arc::new(ManualClock::new(10.0));
        let mut host = authority(&ticks, &wall);

        let mut replica = SessionNode::replica(
            PeerId::new(2),
            SessionId::new(9),
            Arc::clone(&ticks) as Arc<dyn TickSource + Send + Sync>,
            Arc::new(ManualClock::new(0.0)),
            host.snapshot_cell(),
            config(),
        );

        ticks.set_tick(LogicalTick::new(100));
        host.tick(Instant::now(), &FixedProbe(false)).unwrap();

        ticks.set_tick(LogicalTick::new(160));
        replica.tick(Instant::now(), &FixedProbe(false)).unwrap();
        assert!((replica.time() - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_deliver_report_rejected_on_replica() {
        let ticks = Arc::new(ManualTickSource::new(TickRate::new(60)));
        let mut replica = SessionNode::replica(
            PeerId::new(2),
            SessionId::new(9),
            Arc::clone(&ticks) as Arc<dyn TickSource + Send + Sync>,
            Arc::new(ManualClock::new(0.0)),
            SnapshotCell::new(),
            config(),
        );

        let err = replica
            .deliver_report(PeerId::new(3), VisibilityReport { visible: true })
            .unwrap_err();
        assert_eq!(err, VantageError::NotAuthority(Role::Replica));
    }

    #[test]
    fn test_membership_change_can_raise_edges() {
        let ticks = Arc::new(ManualTickSource::new(TickRate::new(60)));
        let wall = Arc::new(ManualClock::new(0.0));
        let mut host = authority(&ticks, &wall);

        // Host sees itself; a visible host plus a hidden joiner
        host.tick(Instant::now(), &FixedProbe(true)).unwrap();
        host.peer_joined(PeerId::new(2));
        while host.poll_event().is_some() {}

        // The hidden joiner leaves: everyone remaining is visible
        host.peer_left(PeerId::new(2));
        assert_eq!(host.poll_event(), Some(AggregateEvent::AllVisibleEntered));
    }

    #[test]
    fn test_detach_paths() {
        let ticks = Arc::new(ManualTickSource::new(TickRate::new(60)));
        let wall = Arc::new(ManualClock::new(0.0));
        let mut host = authority(&ticks, &wall);
        assert_eq!(host.detach(), Err(VantageError::NotReplica(Role::Authority)));

        let mut replica = SessionNode::replica(
            PeerId::new(2),
            SessionId::new(9),
            Arc::clone(&ticks) as Arc<dyn TickSource + Send + Sync>,
            Arc::new(ManualClock::new(0.0)),
            host.snapshot_cell(),
            config(),
        );

        // Become visible, then detach: exactly one trailing hidden report
        let report = replica.tick(Instant::now(), &FixedProbe(true)).unwrap();
        assert_eq!(report, Some(VisibilityReport { visible: true }));
        assert_eq!(
            replica.detach(),
            Ok(Some(VisibilityReport { visible: false }))
        );
        assert_eq!(replica.detach(), Err(VantageError::AlreadyDetached));

        // Handle degrades after detach
        assert_eq!(replica.time(), 0.0);
    }
}
