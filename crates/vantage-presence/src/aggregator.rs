//! Authority-side visibility aggregator

use std::collections::{HashMap, VecDeque};

use vantage_core::PeerId;

use crate::{AggregateEvent, AggregateMask, Aggregates, Roster, VisibilityReport};

/// Folds per-peer visibility reports into edge-triggered aggregate events.
///
/// Holds the last-reported boolean for every peer ever seen (entries are
/// never removed; a departed peer's value persists but stops influencing
/// counts once the peer leaves the roster). The mask is recomputed from
/// scratch on every report - reports are rate-limited upstream by the
/// replica-side debouncing, so O(roster) per report is fine, and full
/// recomputation makes the result independent of cross-peer arrival order.
#[derive(Debug, Default)]
pub struct VisibilityAggregator {
    /// Last-reported visibility per peer ever seen.
    seen: HashMap<PeerId, bool>,
    /// Last computed aggregate mask.
    mask: AggregateMask,
    /// Rising-edge events awaiting the consumer.
    events: VecDeque<AggregateEvent>,
}

impl VisibilityAggregator {
    pub fn new() -> Self {
        VisibilityAggregator::default()
    }

    /// Record `false` for a peer not seen before.
    ///
    /// The unknown-peer-defaults-to-hidden policy is this operation, not
    /// a side effect of lookup.
    pub fn ensure_default(&mut self, peer: PeerId) {
        self.seen.entry(peer).or_insert(false);
    }

    /// Last-reported value for a peer, if it was ever seen.
    pub fn last_reported(&self, peer: PeerId) -> Option<bool> {
        self.seen.get(&peer).copied()
    }

    /// Apply an inbound report.
    ///
    /// `sender` is the transport's call-context attribution; it is
    /// trusted as-is. Reports from a peer already outside the roster
    /// still land (a departing replica's final report races its leave)
    /// but are logged. Recomputes the mask and queues 0-4 events before
    /// returning. Idempotent under repetition of the same value.
    pub fn report_visibility(&mut self, sender: PeerId, report: VisibilityReport, roster: &Roster) {
        if !roster.contains(sender) {
            tracing::warn!(peer = %sender, "visibility report from peer outside live roster");
        }
        self.seen.insert(sender, report.visible);
        self.recompute(roster);
    }

    /// Recompute the mask over the live roster and queue rising edges.
    ///
    /// Also the entry point for membership changes: a join or leave can
    /// flip aggregate bits without any report arriving.
    pub fn recompute(&mut self, roster: &Roster) {
        let total = roster.len();
        let mut visible = 0;
        for peer in roster.iter() {
            self.ensure_default(peer);
            if self.seen[&peer] {
                visible += 1;
            }
        }

        let new_mask = AggregateMask::compute(visible, total);
        let added = new_mask.rising_edges(self.mask);
        self.mask = new_mask;

        for (bit, event) in AggregateEvent::EMISSION_ORDER {
            if added.has(bit) {
                self.events.push_back(event);
            }
        }
    }

    /// The four aggregate predicates. Pure read, safe at any time.
    pub fn aggregates(&self) -> Aggregates {
        Aggregates::from(self.mask)
    }

    pub fn mask(&self) -> AggregateMask {
        self.mask
    }

    /// Next queued rising-edge event, if any.
    pub fn poll_event(&mut self) -> Option<AggregateEvent> {
        self.events.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}
