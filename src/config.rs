// src/config.rs

//! Configuration sources for the admission gate

// dependencies
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use crate::errors::SourceError;
use crate::policy::Policy;

/// Where the gate gets its policies and timeout from.
///
/// The snapshot manager calls `is_stale` on every outermost request, so it
/// must be cheap. `load` is only called under the reload lock and is expected
/// to leave the source fresh again once it succeeds.
pub trait PolicySource<R: ?Sized>: Send + Sync {
    /// Build the policy list in declaration order.
    fn build_policies(&self) -> Result<Vec<Arc<dyn Policy<R>>>, SourceError>;

    /// Wait budget shared by all policies of one request. Zero means no deadline.
    fn timeout(&self) -> Duration;

    /// Whether the policies built last are out of date.
    fn is_stale(&self) -> bool;

    /// Policies and timeout of one configuration, read together.
    ///
    /// The snapshot manager builds every policy set from this. Sources that
    /// can be updated concurrently should override it so both halves come
    /// from the same update.
    fn load(&self) -> Result<(Vec<Arc<dyn Policy<R>>>, Duration), SourceError> {
        Ok((self.build_policies()?, self.timeout()))
    }
}

impl<R: ?Sized, S: PolicySource<R> + ?Sized> PolicySource<R> for Arc<S> {
    fn build_policies(&self) -> Result<Vec<Arc<dyn Policy<R>>>, SourceError> {
        (**self).build_policies()
    }

    fn load(&self) -> Result<(Vec<Arc<dyn Policy<R>>>, Duration), SourceError> {
        (**self).load()
    }

    fn timeout(&self) -> Duration {
        (**self).timeout()
    }

    fn is_stale(&self) -> bool {
        (**self).is_stale()
    }
}

/// In-memory source configured programmatically.
///
/// `replace` installs a new policy list and marks the source stale, so the
/// next request through the gate picks it up.
pub struct StaticPolicySource<R: ?Sized> {
    state: RwLock<SourceState<R>>,
    stale: AtomicBool,
}

struct SourceState<R: ?Sized> {
    policies: Vec<Arc<dyn Policy<R>>>,
    timeout: Duration,
}

impl<R: ?Sized> StaticPolicySource<R> {
    /// Create an empty source: no policies, no timeout
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SourceState {
                policies: Vec::new(),
                timeout: Duration::ZERO,
            }),
            stale: AtomicBool::new(false),
        }
    }

    /// Builder-style: set the shared timeout
    pub fn timeout(self, timeout: Duration) -> Self {
        self.state.write().timeout = timeout;
        self
    }

    /// Builder-style: append a policy
    pub fn policy(self, policy: Arc<dyn Policy<R>>) -> Self {
        self.state.write().policies.push(policy);
        self
    }

    /// Replace the whole configuration and flag it for reload.
    pub fn replace(&self, policies: Vec<Arc<dyn Policy<R>>>, timeout: Duration) {
        let mut state = self.state.write();
        state.policies = policies;
        state.timeout = timeout;
        self.stale.store(true, Ordering::Release);
    }

    /// Flag the current configuration for reload without changing it.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }
}

impl<R: ?Sized> Default for StaticPolicySource<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ?Sized> PolicySource<R> for StaticPolicySource<R> {
    fn build_policies(&self) -> Result<Vec<Arc<dyn Policy<R>>>, SourceError> {
        self.load().map(|(policies, _)| policies)
    }

    fn timeout(&self) -> Duration {
        self.state.read().timeout
    }

    fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    // one read lock, so a concurrent `replace` is seen whole or not at all
    fn load(&self) -> Result<(Vec<Arc<dyn Policy<R>>>, Duration), SourceError> {
        let state = self.state.read();
        self.stale.store(false, Ordering::Release);
        Ok((state.policies.clone(), state.timeout))
    }
}
