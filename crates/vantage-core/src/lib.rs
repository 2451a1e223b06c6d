//! Vantage Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout Vantage:
//! - Identifiers (PeerId, SessionId)
//! - Logical tick primitives (LogicalTick, TickRate)
//! - Clock and tick source seams (WallClock, TickSource)
//! - Session roles and error types

pub mod clock;
pub mod error;
pub mod id;
pub mod role;
pub mod tick;

pub use clock::*;
pub use error::*;
pub use id::*;
pub use role::*;
pub use tick::*;
