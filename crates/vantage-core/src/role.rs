//! Session roles

use std::fmt;

/// Role of a session member.
///
/// Exactly one member is the authority at any time; host election and
/// migration are the transport layer's concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The session member whose local state is ground truth.
    Authority,
    /// A member that receives replicated state and sends reports.
    Replica,
}

impl Role {
    #[inline]
    pub fn is_authority(self) -> bool {
        matches!(self, Role::Authority)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Authority => write!(f, "authority"),
            Role::Replica => write!(f, "replica"),
        }
    }
}
