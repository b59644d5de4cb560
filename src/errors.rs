// src/errors.rs

// error handling for the admission gate and its collaborators

// dependencies
use std::time::Duration;

use thiserror::Error;

use crate::clock::ClockError;

/// Human-readable reason carried by every admission rejection.
pub const REJECTION_REASON: &str = "timed out while waiting to be executed";

/// HTTP status conventionally used when a request is rejected by the gate.
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Error returned by [`AdmissionGate::enter`](crate::AdmissionGate::enter) when
/// an outermost request is not allowed to proceed.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// A policy's wait expired before it could admit the request.
    #[error("Request {reason} (rejected by {policy} after {waited:?})", reason = REJECTION_REASON)]
    Rejected { policy: String, waited: Duration },
    /// The clock could not be read while computing the wait budget.
    #[error("Clock error occurred: {0}")]
    Clock(#[from] ClockError),
}

impl AdmissionError {
    /// Whether this error is a policy rejection (as opposed to an internal failure).
    pub fn is_rejection(&self) -> bool {
        matches!(self, AdmissionError::Rejected { .. })
    }

    /// Status code a dispatch pipeline should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AdmissionError::Rejected { .. } => SERVICE_UNAVAILABLE,
            AdmissionError::Clock(_) => 500,
        }
    }
}

/// Error raised by a [`PolicySource`](crate::PolicySource) while rebuilding policies.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build policies: {0}")]
    Build(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Error raised by a single [`Policy`](crate::Policy) while releasing a request.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("release failed: {0}")]
    Release(String),
}
