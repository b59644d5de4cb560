// src/clock.rs

// clock module definition and implementations

// dependencies
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Clock trait to abstract time retrieval.
/// Implementors must be thread-safe (Send + Sync).
/// The `now` method returns the current time in nanoseconds as a u64.
/// The gate reads the clock once to fix a request's deadline and once more
/// before each policy to compute the remaining wait budget.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<u64, ClockError>;
}

/// Clock error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("system time is before the unix epoch")]
    SystemTimeError,
}

/// SystemClock implementation using the system time.
/// Returns the current time in nanoseconds since the Unix epoch.
/// Wall-clock time can jump; a backward step makes deadlines computed across
/// it longer than configured. Prefer [`MonotonicClock`] for budgets.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<u64, ClockError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .map_err(|_| ClockError::SystemTimeError)
    }
}

/// Clock that never goes backwards.
/// Returns nanoseconds elapsed since the clock was created, so readings are
/// only comparable between clones of the same instance.
/// This is the default clock used by the AdmissionGate.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Result<u64, ClockError> {
        Ok(u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX))
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Result<u64, ClockError> {
        (**self).now()
    }
}

// remaining time until `deadline_nanos`, saturating at zero once it has passed
pub(crate) fn remaining(deadline_nanos: u64, now_nanos: u64) -> Duration {
    Duration::from_nanos(deadline_nanos.saturating_sub(now_nanos))
}
