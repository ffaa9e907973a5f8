//! One-shot startup resolution of who we are and where we are registered.

use std::time::Duration;

use tracing::{debug, info, warn};

use drainguard_core::{
    service_name_from_group, with_timeout, ControlPlane, DeploymentRecord, GuardResult,
    InstanceIdentity, RegistryBinding, TaskMetadataSource,
};

/// Result of identifying the task this sidecar runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The task belongs to a service and may be registered.
    Service(InstanceIdentity),
    /// The task was started outside any service; it cannot carry a
    /// registry binding.
    Standalone { task_arn: String, group: Option<String> },
}

/// Identify this task from the local metadata endpoint and the control
/// plane's view of it.
pub async fn resolve_identity(
    metadata: &dyn TaskMetadataSource,
    control_plane: &dyn ControlPlane,
    call_timeout: Option<Duration>,
) -> GuardResult<Resolution> {
    let local = with_timeout("TaskMetadata", call_timeout, metadata.task_metadata()).await?;
    for container in &local.containers {
        debug!(
            container = %container.name,
            known_status = %container.known_status,
            health = %container.health_status(),
            "container reported by task metadata"
        );
    }

    let task = with_timeout(
        "DescribeTasks",
        call_timeout,
        control_plane.describe_task(&local.cluster, &local.task_arn),
    )
    .await?;

    let Some(service_name) = task.group.as_deref().and_then(service_name_from_group) else {
        warn!(
            task = %task.task_arn,
            group = task.group.as_deref().unwrap_or_default(),
            "task was not started by a service"
        );
        return Ok(Resolution::Standalone {
            task_arn: task.task_arn,
            group: task.group,
        });
    };

    info!(task = %task.task_arn, service = %service_name, "task belongs to service");
    Ok(Resolution::Service(InstanceIdentity::new(
        &local.cluster,
        &task.task_arn,
        service_name,
    )))
}

/// Look up the registry service the owning service registers tasks into.
///
/// Returns `None` when the service's current deployment has no registry
/// integration.
pub async fn resolve_binding(
    control_plane: &dyn ControlPlane,
    identity: &InstanceIdentity,
    call_timeout: Option<Duration>,
) -> GuardResult<Option<RegistryBinding>> {
    let service = with_timeout(
        "DescribeServices",
        call_timeout,
        control_plane.describe_service(&identity.cluster, &identity.service_name),
    )
    .await?;
    info!(service = %service.service_name, "fetched service description");

    let Some(deployment) = current_deployment(&service.deployments) else {
        warn!(service = %service.service_name, "service has no deployments");
        return Ok(None);
    };

    if !deployment.service_connect_enabled {
        info!(
            service = %service.service_name,
            deployment = %deployment.id,
            "service connect is not enabled for the service"
        );
        return Ok(None);
    }

    let Some(resource) = deployment.resources.first() else {
        warn!(
            service = %service.service_name,
            deployment = %deployment.id,
            "service connect is enabled but no registry service was created"
        );
        return Ok(None);
    };

    if deployment.resources.len() > 1 {
        warn!(
            service = %service.service_name,
            count = deployment.resources.len(),
            discovery_name = %resource.discovery_name,
            "deployment has several registry services; using the first"
        );
    }

    let binding = RegistryBinding::new(&resource.discovery_arn, &resource.discovery_name);
    info!(
        service = %service.service_name,
        discovery_arn = %binding.discovery_arn,
        discovery_name = %binding.discovery_name,
        "service connect is enabled for the service"
    );
    Ok(Some(binding))
}

/// The `PRIMARY` deployment, or the first one listed.
fn current_deployment(deployments: &[DeploymentRecord]) -> Option<&DeploymentRecord> {
    deployments
        .iter()
        .find(|d| d.status == "PRIMARY")
        .or_else(|| deployments.first())
}
