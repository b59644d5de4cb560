// src/gate.rs

// flux-gate: priority-ordered admission control for a request dispatch pipeline.

// dependencies
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::{self, Clock, MonotonicClock};
use crate::config::PolicySource;
use crate::context::ExecutionContext;
use crate::errors::{AdmissionError, SourceError};
use crate::policy::PolicySet;
use crate::snapshot::SnapshotManager;
use crate::telemetry::{GateCounters, GateTelemetry};

/// The admission gate.
/// R is the request type handed to policies.
/// S is the configuration source the policies are built from.
/// C is the clock type, defaulting to MonotonicClock.
///
/// The gate is shared by every thread of the dispatch pipeline. Per-request
/// state lives in the caller's [`ExecutionContext`].
pub struct AdmissionGate<R: ?Sized, S, C = MonotonicClock> {
    snapshots: SnapshotManager<R, S>,
    counters: GateCounters,
    clock: C,
}

impl<R, S> AdmissionGate<R, S, MonotonicClock>
where
    R: ?Sized,
    S: PolicySource<R>,
{
    /// Create a gate reading a monotonic clock, loading the initial policies from `source`.
    pub fn new(source: S) -> Result<Self, SourceError> {
        Self::with_clock(source, MonotonicClock::new())
    }
}

impl<R, S, C> AdmissionGate<R, S, C>
where
    R: ?Sized,
    S: PolicySource<R>,
    C: Clock,
{
    pub fn with_clock(source: S, clock: C) -> Result<Self, SourceError> {
        Ok(Self {
            snapshots: SnapshotManager::new(source)?,
            counters: GateCounters::new(),
            clock,
        })
    }

    /// Hook for "operation about to execute".
    ///
    /// Nested calls on the same context return `Ok(())` immediately. For the
    /// outermost call every policy of the current set is consulted in priority
    /// order against one shared deadline; the first one that times out rejects
    /// the request. Policies that admitted before it are not rolled back.
    ///
    /// [`exit`](Self::exit) must be called once for every `enter`, whatever
    /// the outcome.
    pub fn enter(&self, ctx: &mut ExecutionContext<R>, request: &R) -> Result<(), AdmissionError> {
        if !ctx.nesting_mut().enter() {
            debug!(depth = ctx.depth(), "nested dispatch inherits outer admission");
            return Ok(());
        }

        // dropping the ticket un-blocks the request on every path, a panicking policy included
        let ticket = self.counters.request_blocked();
        let policies = self.snapshots.current();
        let queued_for = self.admit_all(&policies, request)?;
        debug!(
            generation = policies.generation(),
            ?queued_for,
            "request admitted"
        );
        ctx.capture(policies, queued_for);
        ticket.start();
        Ok(())
    }

    /// Hook for "operation finished".
    ///
    /// Only the exit matching the outermost entry has an effect: it releases
    /// the request from every policy it was admitted under, in the same order.
    /// A policy that fails to release is logged and skipped. An exit with no
    /// matching entry is ignored.
    pub fn exit(&self, ctx: &mut ExecutionContext<R>, request: &R) {
        if !ctx.nesting_mut().exit() {
            return;
        }

        let Some(policies) = ctx.take_captured() else {
            debug!("request exited without being admitted");
            return;
        };
        self.counters.request_finished();

        for policy in policies.iter() {
            match panic::catch_unwind(AssertUnwindSafe(|| policy.release(request))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(policy = policy.name(), error = %err, "failed to release request");
                }
                Err(_) => {
                    warn!(policy = policy.name(), "policy panicked while releasing request");
                }
            }
        }
    }

    /// Enter the gate and return a guard that exits it when dropped.
    ///
    /// The guard dereferences to the execution context, so nested dispatch
    /// re-enters through it. On rejection the matching exit has already run.
    pub fn admit<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext<R>,
        request: &'a R,
    ) -> Result<AdmissionGuard<'a, R, S, C>, AdmissionError> {
        if let Err(err) = self.enter(ctx, request) {
            self.exit(ctx, request);
            return Err(err);
        }
        Ok(AdmissionGuard {
            gate: self,
            ctx,
            request,
        })
    }

    pub fn blocked(&self) -> u64 {
        self.counters.blocked()
    }

    pub fn running(&self) -> u64 {
        self.counters.running()
    }

    pub fn telemetry(&self) -> GateTelemetry {
        self.counters.snapshot()
    }

    pub fn snapshots(&self) -> &SnapshotManager<R, S> {
        &self.snapshots
    }

    // runs every policy against the shared deadline, returns the time spent waiting
    fn admit_all(&self, policies: &PolicySet<R>, request: &R) -> Result<Duration, AdmissionError> {
        let started = self.clock.now()?;
        // timeouts past u64 nanos saturate instead of wrapping into a tiny budget
        let deadline = policies.timeout().map(|timeout| {
            started.saturating_add(u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX))
        });

        for policy in policies.iter() {
            let budget = deadline
                .map(|deadline| self.clock.now().map(|now| clock::remaining(deadline, now)))
                .transpose()?;

            if !policy.admit(request, budget) {
                let waited = self.elapsed_since(started);
                warn!(
                    policy = policy.name(),
                    ?waited,
                    "request timed out while waiting to be executed"
                );
                return Err(AdmissionError::Rejected {
                    policy: policy.name().to_string(),
                    waited,
                });
            }
        }

        Ok(self.elapsed_since(started))
    }

    // best effort; a clock failure here must not turn an admission into a rejection
    fn elapsed_since(&self, started: u64) -> Duration {
        let now = self.clock.now().unwrap_or(started);
        Duration::from_nanos(now.saturating_sub(started))
    }
}

/// Exits the gate for one request when dropped.
///
/// Returned by [`AdmissionGate::admit`].
pub struct AdmissionGuard<'a, R, S, C>
where
    R: ?Sized,
    S: PolicySource<R>,
    C: Clock,
{
    gate: &'a AdmissionGate<R, S, C>,
    ctx: &'a mut ExecutionContext<R>,
    request: &'a R,
}

impl<R, S, C> Deref for AdmissionGuard<'_, R, S, C>
where
    R: ?Sized,
    S: PolicySource<R>,
    C: Clock,
{
    type Target = ExecutionContext<R>;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl<R, S, C> DerefMut for AdmissionGuard<'_, R, S, C>
where
    R: ?Sized,
    S: PolicySource<R>,
    C: Clock,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl<R, S, C> Drop for AdmissionGuard<'_, R, S, C>
where
    R: ?Sized,
    S: PolicySource<R>,
    C: Clock,
{
    fn drop(&mut self) {
        self.gate.exit(self.ctx, self.request);
    }
}
