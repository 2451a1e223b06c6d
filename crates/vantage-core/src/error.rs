//! Error types for Vantage
//!
//! Query paths never fail: a degraded time or visibility reading always
//! falls back to a defined value. Errors exist only for composition-level
//! misuse, like invoking an authority-only operation on a replica.

use thiserror::Error;

use crate::Role;

/// Vantage composition errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VantageError {
    #[error("operation requires the authority role, node is {0}")]
    NotAuthority(Role),

    #[error("operation requires a replica role, node is {0}")]
    NotReplica(Role),

    #[error("node already detached from the session")]
    AlreadyDetached,
}

/// Result type for Vantage operations
pub type VantageResult<T> = Result<T, VantageError>;
