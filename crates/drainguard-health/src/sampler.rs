//! Health sampling.
//!
//! Each call asks the control plane for the task's current record and
//! normalises it into a [`HealthSample`]. Nothing is cached; a failed
//! query is returned to the caller as-is since there is no other source
//! to fall back on.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use drainguard_core::{
    epoch_secs, with_timeout, ControlPlane, GuardError, GuardResult, HealthSample,
    HealthStatus, InstanceIdentity, LifecycleState,
};

/// Produces fresh samples of a task's health and lifecycle.
#[derive(Clone)]
pub struct HealthSampler {
    control_plane: Arc<dyn ControlPlane>,
    call_timeout: Option<Duration>,
}

impl HealthSampler {
    /// Create a sampler. `call_timeout` bounds each control plane query.
    pub fn new(control_plane: Arc<dyn ControlPlane>, call_timeout: Option<Duration>) -> Self {
        Self {
            control_plane,
            call_timeout,
        }
    }

    /// Take one sample of the task identified by `identity`.
    pub async fn sample(&self, identity: &InstanceIdentity) -> GuardResult<HealthSample> {
        let task = with_timeout(
            "DescribeTasks",
            self.call_timeout,
            self.control_plane
                .describe_task(&identity.cluster, &identity.task_arn),
        )
        .await?;

        let health_status = HealthStatus::from_control_plane(task.health_status.as_deref());
        let lifecycle_state = task
            .last_status
            .as_deref()
            .ok_or(GuardError::MissingField("lastStatus"))?
            .parse::<LifecycleState>()?;

        let sample = HealthSample {
            health_status,
            lifecycle_state,
            sampled_at: epoch_secs(),
        };

        debug!(
            task = %identity.physical_instance_id,
            health = %sample.health_status,
            lifecycle = %sample.lifecycle_state,
            past_running = sample.lifecycle_state.is_past_running(),
            "sampled task health"
        );

        Ok(sample)
    }
}
