//! Live peer roster
//!
//! Read-only input from the session membership service. The aggregator
//! observes membership changes, it never drives them. Iteration is in
//! peer-id order so recomputation is deterministic.

use std::collections::BTreeSet;

use vantage_core::PeerId;

/// The set of peers currently live in the session.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    peers: BTreeSet<PeerId>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Record a peer join. Returns false if already present.
    pub fn insert(&mut self, peer: PeerId) -> bool {
        self.peers.insert(peer)
    }

    /// Record a peer leave. Returns false if not present.
    pub fn remove(&mut self, peer: PeerId) -> bool {
        self.peers.remove(&peer)
    }

    pub fn contains(&self, peer: PeerId) -> bool {
        self.peers.contains(&peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.peers.iter().copied()
    }
}

impl FromIterator<PeerId> for Roster {
    fn from_iter<I: IntoIterator<Item = PeerId>>(iter: I) -> Self {
        Roster {
            peers: iter.into_iter().collect(),
        }
    }
}
