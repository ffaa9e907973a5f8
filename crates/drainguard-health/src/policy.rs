//! Deregistration policy.
//!
//! The registry keeps routing to every registered instance unless a
//! health check withdraws it, so anything other than a clean
//! `HEALTHY`/running sample is a reason to leave.

use std::fmt;

use drainguard_core::{HealthSample, HealthStatus, LifecycleState};

/// Why a sample demands deregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeregisterReason {
    /// The control plane reports anything but `HEALTHY`.
    NotHealthy(HealthStatus),
    /// The orchestrator has started shutting the task down.
    ShuttingDown(LifecycleState),
}

impl fmt::Display for DeregisterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotHealthy(status) => write!(f, "health status is {status}"),
            Self::ShuttingDown(state) => write!(f, "task is {state}"),
        }
    }
}

/// Outcome of evaluating one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Remain,
    Deregister(DeregisterReason),
}

impl Decision {
    pub fn must_deregister(&self) -> bool {
        matches!(self, Self::Deregister(_))
    }
}

/// Decide whether the task must be removed from the registry now.
///
/// Health is checked before lifecycle: an unhealthy task is withdrawn
/// regardless of phase, and a healthy one is withdrawn as soon as the
/// orchestrator starts deactivating, stopping, or deprovisioning it.
pub fn evaluate(sample: &HealthSample) -> Decision {
    if sample.health_status != HealthStatus::Healthy {
        return Decision::Deregister(DeregisterReason::NotHealthy(sample.health_status));
    }

    if sample.lifecycle_state.is_shutting_down() {
        return Decision::Deregister(DeregisterReason::ShuttingDown(sample.lifecycle_state));
    }

    Decision::Remain
}
