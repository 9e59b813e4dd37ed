//! Error types for admission validation.
//!
//! Two kinds of failure reject a request: the node inventory could not be read
//! (infrastructure) or the candidate breaks the replica invariant.

use std::time::Duration;
use thiserror::Error;

/// Message returned when a ConfigNode asks for more replicas than the cluster can place.
pub const REPLICAS_EXCEED_WORKERS_MESSAGE: &str =
    "ConfigNode replicas cannot exceed the number of available worker nodes in the cluster";

/// Error type for validation hooks
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Listing nodes failed; the API error text is passed through unchanged
    #[error(transparent)]
    NodeList(#[from] kube::Error),

    /// Listing nodes did not finish before the deadline
    #[error("timed out after {0:?} listing cluster nodes")]
    NodeListTimeout(Duration),

    /// Desired replicas exceed the schedulable worker node count
    #[error("{}", REPLICAS_EXCEED_WORKERS_MESSAGE)]
    ReplicasExceedWorkers {
        /// Requested `spec.replicas`
        replicas: i32,
        /// Nodes without a NoSchedule/NoExecute taint
        eligible: usize,
    },
}

impl ValidationError {
    /// Check if the failure came from reading cluster state rather than from the resource itself
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            ValidationError::NodeList(_) | ValidationError::NodeListTimeout(_)
        )
    }

    /// Short machine-readable reason, used in logs and metric labels
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::NodeList(_) => "NodeListFailed",
            ValidationError::NodeListTimeout(_) => "NodeListTimeout",
            ValidationError::ReplicasExceedWorkers { .. } => "ReplicasExceedWorkers",
        }
    }
}

/// Result type alias for validation hooks
pub type Result<T> = std::result::Result<T, ValidationError>;
