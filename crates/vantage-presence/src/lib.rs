//! Vantage Presence - Visibility aggregation
//!
//! Each replica runs a local, debounced visibility test and reports only
//! on change; the authority folds those reports into a per-peer map,
//! recomputes a 4-bit aggregate mask over the live roster, and queues an
//! event for every rising edge. Falling edges are silent.

pub mod aggregator;
pub mod event;
pub mod mask;
pub mod reporter;
pub mod roster;

pub use aggregator::*;
pub use event::*;
pub use mask::*;
pub use reporter::*;
pub use roster::*;
