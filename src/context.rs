// src/context.rs

// per-call-chain state carried between AdmissionGate::enter and AdmissionGate::exit

// dependencies
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::nesting::NestingTracker;
use crate::policy::PolicySet;

/// Response header a pipeline may use to report how long a request queued.
pub const DELAY_HEADER: &str = "X-Control-flow-delay-ms";

/// State owned by one call chain (typically one request on one thread).
///
/// Create one per outermost request and pass it by `&mut` to both hook points,
/// including to every nested dispatch the request triggers. The policy set
/// captured at admission is kept here so that release uses the same policies
/// even if the configuration is reloaded while the request runs.
pub struct ExecutionContext<R: ?Sized> {
    nesting: NestingTracker,
    admitted: Option<Admitted<R>>,
}

struct Admitted<R: ?Sized> {
    policies: Arc<PolicySet<R>>,
    queued_for: Duration,
}

impl<R: ?Sized> ExecutionContext<R> {
    pub fn new() -> Self {
        Self {
            nesting: NestingTracker::new(),
            admitted: None,
        }
    }

    /// Current nesting depth of the call chain.
    pub fn depth(&self) -> usize {
        self.nesting.depth()
    }

    /// Whether the outermost request has been admitted and not yet exited.
    pub fn is_admitted(&self) -> bool {
        self.admitted.is_some()
    }

    /// The policy set the request was admitted under, if any.
    pub fn policies(&self) -> Option<&Arc<PolicySet<R>>> {
        self.admitted.as_ref().map(|a| &a.policies)
    }

    /// Time the outermost request spent waiting for admission.
    pub fn queued_for(&self) -> Option<Duration> {
        self.admitted.as_ref().map(|a| a.queued_for)
    }

    /// Header name and value reporting the admission delay in milliseconds.
    pub fn delay_header(&self) -> Option<(&'static str, String)> {
        self.queued_for()
            .map(|delay| (DELAY_HEADER, delay.as_millis().to_string()))
    }

    pub(crate) fn nesting_mut(&mut self) -> &mut NestingTracker {
        &mut self.nesting
    }

    pub(crate) fn capture(&mut self, policies: Arc<PolicySet<R>>, queued_for: Duration) {
        self.admitted = Some(Admitted {
            policies,
            queued_for,
        });
    }

    // drops the captured set; `None` if the request was never admitted
    pub(crate) fn take_captured(&mut self) -> Option<Arc<PolicySet<R>>> {
        self.admitted.take().map(|a| a.policies)
    }
}

impl<R: ?Sized> Default for ExecutionContext<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ?Sized> fmt::Debug for ExecutionContext<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("depth", &self.nesting.depth())
            .field("generation", &self.policies().map(|p| p.generation()))
            .field("queued_for", &self.queued_for())
            .finish()
    }
}
