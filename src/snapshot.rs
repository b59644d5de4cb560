// src/snapshot.rs

//! Holds the live policy set and rebuilds it when the source goes stale.
//!
//! Readers load the current set without locking. Reloads are serialized by a
//! mutex and re-check staleness once they hold it, so concurrent requests that
//! all noticed the same stale source trigger a single rebuild. A failed rebuild
//! leaves the previous set in place.

// dependencies
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::PolicySource;
use crate::errors::SourceError;
use crate::policy::PolicySet;

/// Owner of the current [`PolicySet`] for one gate.
pub struct SnapshotManager<R: ?Sized, S> {
    source: S,
    current: ArcSwap<PolicySet<R>>,
    reload_lock: Mutex<()>,
    generation: AtomicU64,
}

impl<R: ?Sized, S> SnapshotManager<R, S>
where
    S: PolicySource<R>,
{
    /// Load the initial policy set synchronously.
    pub fn new(source: S) -> Result<Self, SourceError> {
        let initial = build_set::<R, S>(&source, 1)?;
        info!(
            policies = initial.len(),
            timeout = ?initial.timeout(),
            "admission control configured"
        );
        Ok(Self {
            source,
            current: ArcSwap::from_pointee(initial),
            reload_lock: Mutex::new(()),
            generation: AtomicU64::new(1),
        })
    }

    /// The policy set new requests should be admitted under, reloading it
    /// first if the source reports it stale.
    pub fn current(&self) -> Arc<PolicySet<R>> {
        if self.source.is_stale() {
            let _guard = self.reload_lock.lock();
            // another request may have reloaded while we waited for the lock
            if self.source.is_stale() {
                if let Err(err) = self.rebuild() {
                    warn!(error = %err, "policy reload failed, keeping previous configuration");
                }
            }
        }
        self.current.load_full()
    }

    /// Rebuild the policy set regardless of staleness.
    ///
    /// On failure the previous set stays installed and the error is returned.
    pub fn reload(&self) -> Result<Arc<PolicySet<R>>, SourceError> {
        let _guard = self.reload_lock.lock();
        self.rebuild()?;
        Ok(self.current.load_full())
    }

    /// The installed set, without a staleness check.
    pub fn installed(&self) -> Arc<PolicySet<R>> {
        self.current.load_full()
    }

    /// Number of policy sets installed so far, the initial one included.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    // caller must hold `reload_lock`
    fn rebuild(&self) -> Result<(), SourceError> {
        let generation = self.generation.load(Ordering::Acquire) + 1;
        let set = build_set::<R, S>(&self.source, generation)?;
        debug!(generation, policies = ?set, "installing policy set");
        info!(
            generation,
            policies = set.len(),
            timeout = ?set.timeout(),
            "admission control reloaded"
        );
        self.current.store(Arc::new(set));
        self.generation.store(generation, Ordering::Release);
        Ok(())
    }
}

fn build_set<R: ?Sized, S: PolicySource<R>>(
    source: &S,
    generation: u64,
) -> Result<PolicySet<R>, SourceError> {
    let (policies, timeout) = source.load()?;
    Ok(PolicySet::new(policies, timeout, generation))
}
