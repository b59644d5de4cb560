// src/policy.rs

//! The policy contract and the priority-ordered policy set built from it.

// dependencies
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::PolicyError;

/// A pluggable throttling rule consulted by the gate for every outermost request.
///
/// `R` is the request type; the gate never inspects it and only hands it to
/// the policy as a correlation key.
///
/// Implementations are long-lived and shared: the same instance may be held
/// by the current [`PolicySet`] and by any number of in-flight requests that
/// were admitted under an older one.
pub trait Policy<R: ?Sized>: Send + Sync {
    /// Wait until the request may proceed.
    ///
    /// `budget` is the time left before the request's shared deadline.
    /// `Some(Duration::ZERO)` means the deadline has already been spent and the
    /// policy must decide without blocking. `None` means there is no deadline.
    ///
    /// Returns `false` if the policy's own wait expired.
    fn admit(&self, request: &R, budget: Option<Duration>) -> bool;

    /// Give back whatever `admit` reserved for this request.
    ///
    /// Must be a no-op for requests the policy does not know about.
    fn release(&self, request: &R) -> Result<(), PolicyError>;

    /// Ordering key. Lower values run first and, by convention, belong to the
    /// more restrictive policies.
    fn priority(&self) -> i32;

    /// Name used in logs and rejection errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Sort policies ascending by priority, keeping declaration order for ties.
pub fn sort_by_priority<R: ?Sized>(policies: &mut [Arc<dyn Policy<R>>]) {
    // `sort_by_cached_key` is stable and calls `priority()` once per policy
    policies.sort_by_cached_key(|policy| policy.priority());
}

/// An immutable, priority-ordered set of policies plus the timeout shared by
/// every policy consulted for one request.
pub struct PolicySet<R: ?Sized> {
    policies: Vec<Arc<dyn Policy<R>>>,
    timeout: Option<Duration>,
    generation: u64,
}

impl<R: ?Sized> PolicySet<R> {
    /// Build a set from policies in declaration order. A zero timeout means
    /// requests never time out.
    pub fn new(mut policies: Vec<Arc<dyn Policy<R>>>, timeout: Duration, generation: u64) -> Self {
        sort_by_priority(&mut policies);
        Self {
            policies,
            timeout: (!timeout.is_zero()).then_some(timeout),
            generation,
        }
    }

    /// A set with no policies and no timeout; every request is admitted.
    pub fn empty() -> Self {
        Self {
            policies: Vec::new(),
            timeout: None,
            generation: 0,
        }
    }

    pub fn policies(&self) -> &[Arc<dyn Policy<R>>] {
        &self.policies
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Reload counter of the snapshot manager that produced this set.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Policy<R>>> {
        self.policies.iter()
    }
}

impl<R: ?Sized> fmt::Debug for PolicySet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicySet")
            .field(
                "policies",
                &self
                    .policies
                    .iter()
                    .map(|p| (p.name(), p.priority()))
                    .collect::<Vec<_>>(),
            )
            .field("timeout", &self.timeout)
            .field("generation", &self.generation)
            .finish()
    }
}
