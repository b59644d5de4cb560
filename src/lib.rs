// src/lib.rs

//! # Flux Gate
//!
//! Admission control for a request dispatch pipeline. Every inbound operation
//! passes through an [`AdmissionGate`] that consults a priority-ordered set of
//! pluggable [`Policy`] implementations against one shared deadline, and
//! releases the request from the same policies when it completes, even if the
//! configuration was reloaded in between.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! use flux_gate::{AdmissionGate, ExecutionContext, Policy, PolicyError, StaticPolicySource};
//!
//! // admits at most `limit` requests at once, without queueing
//! struct MaxRunning {
//!     limit: usize,
//!     running: AtomicUsize,
//! }
//!
//! impl Policy<str> for MaxRunning {
//!     fn admit(&self, _request: &str, _budget: Option<Duration>) -> bool {
//!         self.running
//!             .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
//!                 (n < self.limit).then_some(n + 1)
//!             })
//!             .is_ok()
//!     }
//!
//!     fn release(&self, _request: &str) -> Result<(), PolicyError> {
//!         self.running.fetch_sub(1, Ordering::SeqCst);
//!         Ok(())
//!     }
//!
//!     fn priority(&self) -> i32 {
//!         1
//!     }
//! }
//!
//! let source = StaticPolicySource::<str>::new()
//!     .timeout(Duration::from_secs(60))
//!     .policy(Arc::new(MaxRunning { limit: 1, running: AtomicUsize::new(0) }));
//! let gate = AdmissionGate::new(source).unwrap();
//!
//! let mut first = ExecutionContext::new();
//! let guard = gate.admit(&mut first, "GetMap").unwrap();
//!
//! let mut second = ExecutionContext::new();
//! match gate.admit(&mut second, "GetMap") {
//!     Ok(_) => unreachable!(),
//!     Err(err) => println!("{} -> HTTP {}", err, err.status_code()),
//! }
//!
//! drop(guard);
//! assert_eq!(gate.running(), 0);
//! ```

// private modules
mod clock;
mod config;
mod context;
mod errors;
mod gate;
mod nesting;
mod policy;
mod snapshot;
mod telemetry;

// public API exports
pub use clock::{Clock, ClockError, MonotonicClock, SystemClock};
pub use config::{PolicySource, StaticPolicySource};
pub use context::{DELAY_HEADER, ExecutionContext};
pub use errors::{AdmissionError, PolicyError, REJECTION_REASON, SERVICE_UNAVAILABLE, SourceError};
pub use gate::{AdmissionGate, AdmissionGuard};
pub use nesting::NestingTracker;
pub use policy::{Policy, PolicySet, sort_by_priority};
pub use snapshot::SnapshotManager;
pub use telemetry::{GateCounters, GateTelemetry};
