//! Aggregate transition events

use crate::AggregateMask;

/// Rising-edge aggregate notifications, authority-side only.
///
/// Consumers only observe "became true" transitions; a bit clearing
/// never emits anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateEvent {
    AllVisibleEntered,
    AllHiddenEntered,
    AnyVisibleEntered,
    AnyHiddenEntered,
}

impl AggregateEvent {
    /// Emission order when several bits rise in one recomputation.
    pub const EMISSION_ORDER: [(u8, AggregateEvent); 4] = [
        (AggregateMask::ALL_VISIBLE, AggregateEvent::AllVisibleEntered),
        (AggregateMask::ALL_HIDDEN, AggregateEvent::AllHiddenEntered),
        (AggregateMask::ANY_VISIBLE, AggregateEvent::AnyVisibleEntered),
        (AggregateMask::ANY_HIDDEN, AggregateEvent::AnyHiddenEntered),
    ];
}
