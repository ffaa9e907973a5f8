//! Process lifecycle: warm-up, resolution, and hand-off to the controller.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use drainguard_core::{ControlPlane, GuardResult, Registry, TaskMetadataSource};
use drainguard_health::HealthSampler;

use crate::controller::{ControllerSettings, Deregistered, DeregistrationController};
use crate::resolve::{resolve_binding, resolve_identity, Resolution};
use crate::signals::StopNotice;

/// Tunables for one sidecar run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// Delay before doing anything. Keeps the sidecar from withdrawing a
    /// task whose workload has not finished becoming healthy yet.
    pub warmup: Duration,
    pub controller: ControllerSettings,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(60),
            controller: ControllerSettings::default(),
        }
    }
}

/// How a run ended without error. Every outcome exits the process
/// successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The task was not started by a service.
    Standalone,
    /// The owning service has no registry integration.
    NoRegistry { service: String },
    /// The task was withdrawn from the registry.
    Deregistered(Deregistered),
}

/// One sidecar run, from warm-up to exit.
pub struct Lifecycle {
    metadata: Arc<dyn TaskMetadataSource>,
    control_plane: Arc<dyn ControlPlane>,
    registry: Arc<dyn Registry>,
    settings: LifecycleSettings,
}

impl Lifecycle {
    pub fn new(
        metadata: Arc<dyn TaskMetadataSource>,
        control_plane: Arc<dyn ControlPlane>,
        registry: Arc<dyn Registry>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            metadata,
            control_plane,
            registry,
            settings,
        }
    }

    /// Run to completion.
    pub async fn run(self, mut stop: StopNotice) -> GuardResult<Outcome> {
        self.settings.controller.validate()?;
        self.warm_up(&mut stop).await;

        let call_timeout = self.settings.controller.call_timeout;
        let identity = match resolve_identity(
            self.metadata.as_ref(),
            self.control_plane.as_ref(),
            call_timeout,
        )
        .await?
        {
            Resolution::Service(identity) => identity,
            Resolution::Standalone { task_arn, .. } => {
                info!(task = %task_arn, "no owning service; nothing to do");
                return Ok(Outcome::Standalone);
            }
        };

        let Some(binding) =
            resolve_binding(self.control_plane.as_ref(), &identity, call_timeout).await?
        else {
            info!(service = %identity.service_name, "no registry integration; nothing to do");
            return Ok(Outcome::NoRegistry {
                service: identity.service_name,
            });
        };

        let controller = DeregistrationController::new(
            HealthSampler::new(self.control_plane.clone(), call_timeout),
            self.registry.clone(),
            self.settings.controller,
        );
        let done = controller.run_until_done(&identity, &binding, stop).await?;
        Ok(Outcome::Deregistered(done))
    }

    async fn warm_up(&self, stop: &mut StopNotice) {
        let delay = self.settings.warmup;
        if delay.is_zero() {
            return;
        }

        info!(?delay, "waiting for task to fully initialize");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            Ok(()) = stop.changed() => {
                info!("stop signal received during warm-up; starting immediately");
            }
        }
    }
}
