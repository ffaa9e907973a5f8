//! Confirmation of asynchronous registry operations.
//!
//! Deregistration only submits work; the registry completes it in the
//! background. The operation is polled a bounded number of times and
//! must reach `SUCCESS` before the task counts as withdrawn.

use std::time::Duration;

use tracing::{debug, warn};

use drainguard_core::{
    with_timeout, DeregistrationOperation, GuardError, GuardResult, OperationStatus, Registry,
};

/// How hard to try confirming an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Status queries before giving up. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay between status queries.
    pub interval: Duration,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(2),
        }
    }
}

/// Poll `operation_id` until it succeeds, fails, or the policy runs out.
pub async fn confirm_operation(
    registry: &dyn Registry,
    operation_id: &str,
    policy: &ConfirmPolicy,
    call_timeout: Option<Duration>,
) -> GuardResult<DeregistrationOperation> {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        let operation =
            with_timeout("GetOperation", call_timeout, registry.get_operation(operation_id)).await?;

        match operation.status {
            OperationStatus::Success => return Ok(operation),
            OperationStatus::Fail => {
                warn!(%operation_id, error = ?operation.error_message, "registry operation failed");
                return Err(GuardError::OperationFailed {
                    operation_id: operation_id.to_string(),
                    reason: operation
                        .error_message
                        .unwrap_or_else(|| "no reason given".to_string()),
                });
            }
            OperationStatus::Submitted | OperationStatus::Pending => {
                debug!(
                    %operation_id,
                    status = %operation.status,
                    attempt,
                    attempts,
                    "registry operation still in flight"
                );
                if attempt < attempts {
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    Err(GuardError::ConfirmationExhausted {
        operation_id: operation_id.to_string(),
        attempts,
    })
}
