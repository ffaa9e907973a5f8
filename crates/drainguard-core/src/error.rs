//! Error types for drainguard.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for drainguard operations.
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that end the sidecar process.
#[derive(Debug, Clone, Error)]
pub enum GuardError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("task metadata error: {0}")]
    Metadata(String),

    #[error("control plane error: {0}")]
    ControlPlane(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("task {task_arn} not found in cluster {cluster}")]
    TaskNotFound { cluster: String, task_arn: String },

    #[error("service {service} not found in cluster {cluster}")]
    ServiceNotFound { cluster: String, service: String },

    #[error("response is missing required field: {0}")]
    MissingField(&'static str),

    #[error("unrecognised lifecycle state: {0}")]
    UnknownLifecycleState(String),

    #[error("registry operation {operation_id} failed: {reason}")]
    OperationFailed { operation_id: String, reason: String },

    #[error("registry operation {operation_id} still not complete after {attempts} status checks")]
    ConfirmationExhausted { operation_id: String, attempts: u32 },

    #[error("{call} did not complete within {after:?}")]
    Timeout { call: &'static str, after: Duration },
}
