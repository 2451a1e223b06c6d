//! Vantage Runtime - Session node composition
//!
//! Wires a clock synchronizer and the visibility machinery onto one
//! session member. The two components never call each other; they are
//! composed only by being attached to the same node.

pub mod node;

pub use node::*;
