//! Vantage Test - Session simulation harness
//!
//! Drives one authority and N scripted replicas over an in-order
//! loopback with manually advanced clocks, so whole-session behavior
//! (report debouncing, aggregate edges, time reconstruction) can be
//! asserted deterministically.

pub mod simulator;

pub use simulator::*;
