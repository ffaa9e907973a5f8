//! ECS control plane client.

use async_trait::async_trait;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::types::{Deployment, Service, Task};
use aws_sdk_ecs::Client;
use tracing::{debug, warn};

use drainguard_core::{
    ControlPlane, DeploymentRecord, GuardError, GuardResult, RegistryResource, ServiceRecord,
    TaskRecord,
};

/// [`ControlPlane`] backed by the Amazon ECS API.
#[derive(Clone)]
pub struct EcsControlPlane {
    client: Client,
}

impl EcsControlPlane {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ControlPlane for EcsControlPlane {
    async fn describe_task(&self, cluster: &str, task_arn: &str) -> GuardResult<TaskRecord> {
        let output = self
            .client
            .describe_tasks()
            .cluster(cluster)
            .tasks(task_arn)
            .send()
            .await
            .map_err(|e| {
                GuardError::ControlPlane(format!("DescribeTasks: {}", DisplayErrorContext(&e)))
            })?;

        for failure in output.failures() {
            warn!(
                arn = failure.arn().unwrap_or_default(),
                reason = failure.reason().unwrap_or_default(),
                "DescribeTasks reported a failure"
            );
        }

        let task = output
            .tasks()
            .first()
            .ok_or_else(|| GuardError::TaskNotFound {
                cluster: cluster.to_string(),
                task_arn: task_arn.to_string(),
            })?;

        Ok(task_record(task, task_arn))
    }

    async fn describe_service(&self, cluster: &str, service: &str) -> GuardResult<ServiceRecord> {
        let output = self
            .client
            .describe_services()
            .cluster(cluster)
            .services(service)
            .send()
            .await
            .map_err(|e| {
                GuardError::ControlPlane(format!("DescribeServices: {}", DisplayErrorContext(&e)))
            })?;

        let found = output
            .services()
            .first()
            .ok_or_else(|| GuardError::ServiceNotFound {
                cluster: cluster.to_string(),
                service: service.to_string(),
            })?;

        debug!(%service, deployments = found.deployments().len(), "described service");
        Ok(service_record(found, service))
    }
}

fn task_record(task: &Task, requested_arn: &str) -> TaskRecord {
    TaskRecord {
        task_arn: task.task_arn().unwrap_or(requested_arn).to_string(),
        group: task.group().map(str::to_string),
        health_status: task.health_status().map(|h| h.as_str().to_string()),
        last_status: task.last_status().map(str::to_string),
    }
}

fn service_record(service: &Service, requested_name: &str) -> ServiceRecord {
    ServiceRecord {
        service_name: service.service_name().unwrap_or(requested_name).to_string(),
        deployments: service.deployments().iter().map(deployment_record).collect(),
    }
}

fn deployment_record(deployment: &Deployment) -> DeploymentRecord {
    let resources = deployment
        .service_connect_resources()
        .iter()
        .filter_map(|r| {
            Some(RegistryResource {
                discovery_name: r.discovery_name()?.to_string(),
                discovery_arn: r.discovery_arn()?.to_string(),
            })
        })
        .collect();

    DeploymentRecord {
        id: deployment.id().unwrap_or_default().to_string(),
        status: deployment.status().unwrap_or_default().to_string(),
        service_connect_enabled: deployment
            .service_connect_configuration()
            .is_some_and(|c| c.enabled()),
        resources,
    }
}
