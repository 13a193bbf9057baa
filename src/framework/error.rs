//! Error types for the shoot framework and the scenarios.
//!
//! Every error is fatal for the scenario it occurs in. Skipping a scenario is
//! not an error, see [`crate::scenarios::Verdict`].

use std::time::Duration;
use thiserror::Error;

use crate::framework::port_forward::PortForwardError;

/// Error type for framework and scenario operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Watch stream error while waiting for a condition
    #[error("Watcher error: {0}")]
    Watcher(#[from] kube::runtime::watcher::Error),

    /// The awaited state was not reached in time
    #[error("Timeout after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    /// The watched resource disappeared while waiting
    #[error("{0} was deleted while waiting")]
    ResourceDeleted(String),

    /// The watch stream closed before the condition was met
    #[error("Watch stream for {0} ended unexpectedly")]
    StreamEnded(String),

    /// An expectation on observed state was violated
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// The shoot reported a terminal operation failure
    #[error("Shoot {name} operation failed: {description}")]
    ShootFailed { name: String, description: String },

    /// A secret field is missing or empty
    #[error("Secret {secret} has no data for key {key}")]
    MissingSecretData { secret: String, key: String },

    /// Kubeconfig could not be parsed or turned into a client
    #[error("Invalid kubeconfig: {0}")]
    Kubeconfig(String),

    /// HTTP error talking to the sample workload
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Port forward to the sample workload failed
    #[error("Port forward error: {0}")]
    PortForward(#[from] PortForwardError),

    /// The sample workload misbehaved
    #[error("Workload error: {0}")]
    Workload(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build an assertion failure.
    pub fn assertion(message: impl Into<String>) -> Self {
        Error::Assertion(message.into())
    }

    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 404)
    }

    /// Check if this error is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 409)
    }

    /// Check if this error is a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if this error is a violated expectation rather than an API failure
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Error::Assertion(_) | Error::MissingSecretData { .. } | Error::ShootFailed { .. }
        )
    }
}

/// Result type alias for framework operations
pub type Result<T> = std::result::Result<T, Error>;
