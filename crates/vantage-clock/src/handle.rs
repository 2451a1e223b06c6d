//! Session-scoped clock handle
//!
//! Hosting environments ask "what time is it" from code that is not
//! wired to any particular synchronizer. The handle is that seam: it is
//! injected where needed, bound at session start and unbound at session
//! stop. An unbound handle logs one diagnostic per query and returns
//! zero rather than failing the caller.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::ClockReader;

/// Cloneable handle resolving the active session clock.
#[derive(Clone, Default)]
pub struct ClockHandle {
    inner: Arc<RwLock<Option<ClockReader>>>,
}

impl ClockHandle {
    pub fn new() -> Self {
        ClockHandle::default()
    }

    /// Bind to a live synchronizer. Call at session start.
    pub fn bind(&self, reader: ClockReader) {
        *self.inner.write() = Some(reader);
    }

    /// Drop the binding. Call at session stop.
    pub fn unbind(&self) {
        *self.inner.write() = None;
    }

    pub fn is_bound(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Current authoritative time in seconds; 0.0 when no clock is bound.
    pub fn authoritative_time(&self) -> f64 {
        match self.inner.read().as_ref() {
            Some(reader) => reader.authoritative_time(),
            None => {
                tracing::warn!("no session clock bound, reporting time 0");
                0.0
            }
        }
    }
}
