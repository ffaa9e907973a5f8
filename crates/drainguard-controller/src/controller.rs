//! Deregistration controller: the poll loop and the signal race.
//!
//! Two producers feed one decision point: a fixed interval that drives
//! sampling, and the stop notice published by the signal watcher. The
//! first of "policy says leave" or "orchestrator says stop" ends the
//! loop, after which the task is deregistered exactly once.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use drainguard_core::{
    with_timeout, DeregistrationOperation, GuardError, GuardResult, InstanceIdentity, Registry,
    RegistryBinding,
};
use drainguard_health::{evaluate, Decision, DeregisterReason, HealthSampler};

use crate::confirm::{confirm_operation, ConfirmPolicy};
use crate::signals::{StopNotice, StopSignal};

/// Tunables for the controller loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Time between health samples.
    pub poll_interval: Duration,
    /// How the deregistration operation is confirmed.
    pub confirm: ConfirmPolicy,
    /// Bound on each registry call. `None` waits forever.
    pub call_timeout: Option<Duration>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            confirm: ConfirmPolicy::default(),
            call_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ControllerSettings {
    /// Reject settings the poll loop cannot run with.
    pub fn validate(&self) -> GuardResult<()> {
        if self.poll_interval.is_zero() {
            return Err(GuardError::Config("poll interval must be greater than zero".into()));
        }
        Ok(())
    }
}

/// What ended the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A health sample failed the policy.
    Policy(DeregisterReason),
    /// The orchestrator asked the process to stop.
    Signal(StopSignal),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Policy(reason) => write!(f, "{reason}"),
            Self::Signal(signal) => write!(f, "received {signal}"),
        }
    }
}

/// A completed, confirmed deregistration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deregistered {
    pub operation: DeregistrationOperation,
    pub trigger: Trigger,
    /// Health samples taken before the trigger.
    pub samples: u64,
}

/// Watches one task and withdraws it from the registry once.
pub struct DeregistrationController {
    sampler: HealthSampler,
    registry: Arc<dyn Registry>,
    settings: ControllerSettings,
}

impl DeregistrationController {
    pub fn new(
        sampler: HealthSampler,
        registry: Arc<dyn Registry>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            sampler,
            registry,
            settings,
        }
    }

    /// Watch the task until it must leave the registry, then deregister it.
    ///
    /// A stop signal already published on `stop` is honoured before the
    /// first sample. If the signal watcher goes away the loop carries on
    /// with the timer alone. Any collaborator error ends the run.
    pub async fn run_until_done(
        self,
        identity: &InstanceIdentity,
        binding: &RegistryBinding,
        mut stop: StopNotice,
    ) -> GuardResult<Deregistered> {
        self.settings.validate()?;

        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stop_open = true;
        let mut samples = 0u64;

        info!(
            task = %identity.physical_instance_id,
            service = %identity.service_name,
            discovery_name = %binding.discovery_name,
            interval = ?self.settings.poll_interval,
            "watching task health"
        );

        let trigger = loop {
            let pending = *stop.borrow_and_update();
            if let Some(signal) = pending {
                break Trigger::Signal(signal);
            }

            tokio::select! {
                biased;

                changed = stop.changed(), if stop_open => {
                    if changed.is_err() {
                        warn!("signal watcher stopped; continuing on the timer alone");
                        stop_open = false;
                    }
                }
                _ = interval.tick() => {
                    let sample = self.sampler.sample(identity).await?;
                    samples += 1;

                    match evaluate(&sample) {
                        Decision::Remain => {
                            debug!(
                                health = %sample.health_status,
                                lifecycle = %sample.lifecycle_state,
                                "task stays registered"
                            );
                        }
                        Decision::Deregister(reason) => break Trigger::Policy(reason),
                    }
                }
            }
        };

        info!(%trigger, samples, "task must leave the registry");
        let operation = self.deregister(identity, binding).await?;

        Ok(Deregistered {
            operation,
            trigger,
            samples,
        })
    }

    async fn deregister(
        &self,
        identity: &InstanceIdentity,
        binding: &RegistryBinding,
    ) -> GuardResult<DeregistrationOperation> {
        info!(
            instance = %identity.physical_instance_id,
            registry_service = %binding.registry_service_id,
            discovery_name = %binding.discovery_name,
            "deregistering task from registry"
        );

        let operation_id = with_timeout(
            "DeregisterInstance",
            self.settings.call_timeout,
            self.registry.deregister_instance(
                &identity.physical_instance_id,
                &binding.registry_service_id,
            ),
        )
        .await?;

        let operation = confirm_operation(
            self.registry.as_ref(),
            &operation_id,
            &self.settings.confirm,
            self.settings.call_timeout,
        )
        .await?;

        info!(
            operation_id = %operation.operation_id,
            instance = %identity.physical_instance_id,
            registry_service = %binding.registry_service_id,
            "successfully deregistered task from registry"
        );
        Ok(operation)
    }
}
