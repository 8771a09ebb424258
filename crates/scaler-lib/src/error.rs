//! Error taxonomy for the scaling engines

use crate::models::WorkloadKind;
use thiserror::Error;

/// Errors surfaced by the collaborators and engines.
///
/// Store "parameter not found" is intentionally absent: the parameter
/// store trait encodes it as `Ok(None)` because both read paths treat a
/// missing parameter as empty state, never as a failure.
#[derive(Debug, Error)]
pub enum ScalerError {
    /// An explicitly requested workload does not exist in the cluster.
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    WorkloadNotFound {
        kind: WorkloadKind,
        namespace: String,
        name: String,
    },

    /// An explicitly requested Auto Scaling Group does not exist.
    #[error("auto scaling group '{0}' not found")]
    GroupNotFound(String),

    /// A stored capture key is not of the form `kind/namespace/name`.
    #[error("capture key '{0}' is not of the form kind/namespace/name")]
    MalformedKey(String),

    /// A persisted state parameter holds data that does not match the
    /// expected schema.
    #[error("state parameter '{name}' holds invalid data: {source}")]
    InvalidState {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// An operation was dispatched to a kind that cannot support it,
    /// e.g. setting a replica count on a CronJob.
    #[error("operation '{operation}' not supported for kind {kind}")]
    Unsupported {
        kind: WorkloadKind,
        operation: &'static str,
    },

    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    #[error("parameter store error: {0}")]
    Store(String),

    #[error("auto scaling api error: {0}")]
    Fleet(String),
}

pub type Result<T> = std::result::Result<T, ScalerError>;
