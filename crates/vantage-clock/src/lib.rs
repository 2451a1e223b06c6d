//! Vantage Clock - Session clock synchronization
//!
//! The authority periodically stamps its local time together with the
//! session-wide logical tick and replicates that pair. Every other node
//! reconstructs current authoritative time as "anchor + scaled tick
//! delta", so readers never generate traffic and accuracy is bounded by
//! the sampling interval alone.

pub mod handle;
pub mod snapshot;
pub mod synchronizer;

pub use handle::*;
pub use snapshot::*;
pub use synchronizer::*;
