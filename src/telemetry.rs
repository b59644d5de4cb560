// src/telemetry.rs

// counters of requests waiting for and holding admission

// dependencies
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by one gate.
///
/// `blocked` counts outermost requests currently inside the admission loop,
/// `running` counts admitted requests that have not exited yet.
#[derive(Debug, Default)]
pub struct GateCounters {
    blocked: AtomicU64,
    running: AtomicU64,
}

impl GateCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocked(&self) -> u64 {
        self.blocked.load(Ordering::Relaxed)
    }

    pub fn running(&self) -> u64 {
        self.running.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> GateTelemetry {
        GateTelemetry {
            blocked: self.blocked(),
            running: self.running(),
        }
    }

    // the returned ticket un-blocks the request when dropped, unwinding included
    pub(crate) fn request_blocked(&self) -> BlockedTicket<'_> {
        self.blocked.fetch_add(1, Ordering::Relaxed);
        BlockedTicket { counters: self }
    }

    pub(crate) fn request_finished(&self) {
        self.running.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A request counted as `blocked` while it waits for admission.
#[must_use]
pub(crate) struct BlockedTicket<'a> {
    counters: &'a GateCounters,
}

impl BlockedTicket<'_> {
    // admitted: blocked -> running
    pub(crate) fn start(self) {
        self.counters.running.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for BlockedTicket<'_> {
    fn drop(&mut self) {
        self.counters.blocked.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the gate counters, suitable for periodic logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GateTelemetry {
    pub blocked: u64,
    pub running: u64,
}

impl GateTelemetry {
    /// Requests the gate is currently responsible for.
    pub fn in_flight(&self) -> u64 {
        self.blocked + self.running
    }
}

impl fmt::Display for GateTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blocked={} running={}", self.blocked, self.running)
    }
}
