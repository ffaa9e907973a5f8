//! Collaborator traits.
//!
//! The controller only ever talks to the outside world through these
//! three seams. Real implementations live in `drainguard-aws`; the
//! [`mock`](crate::mock) module provides scripted in-memory versions.

use async_trait::async_trait;

use crate::error::GuardResult;
use crate::types::{DeregistrationOperation, ServiceRecord, TaskMetadata, TaskRecord};

/// The local task metadata endpoint.
#[async_trait]
pub trait TaskMetadataSource: Send + Sync {
    /// Fetch the task document for the task this process runs in.
    async fn task_metadata(&self) -> GuardResult<TaskMetadata>;
}

/// The orchestrator's descriptive API.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Describe a single task by cluster and task ARN.
    async fn describe_task(&self, cluster: &str, task_arn: &str) -> GuardResult<TaskRecord>;

    /// Describe a single service by cluster and service name.
    async fn describe_service(&self, cluster: &str, service: &str) -> GuardResult<ServiceRecord>;
}

/// The service registry instances are registered into.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Remove an instance from a registry service. Returns the id of the
    /// asynchronous operation that carries out the removal.
    async fn deregister_instance(&self, instance_id: &str, service_id: &str) -> GuardResult<String>;

    /// Look up the current state of a registry operation.
    async fn get_operation(&self, operation_id: &str) -> GuardResult<DeregistrationOperation>;
}
