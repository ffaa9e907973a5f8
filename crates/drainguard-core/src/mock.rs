//! Scripted in-memory collaborators for tests - always available, no
//! conditional compilation needed.
//!
//! Each mock answers from a queue of scripted results first and then
//! repeats its fallback result forever. Every call is counted so tests
//! can assert on exactly what the controller did.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::client::{ControlPlane, Registry, TaskMetadataSource};
use crate::error::{GuardError, GuardResult};
use crate::types::*;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Queued responses followed by a repeating fallback.
struct Script<T> {
    queued: VecDeque<GuardResult<T>>,
    fallback: Option<GuardResult<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queued: VecDeque::new(),
            fallback: None,
        }
    }
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Option<GuardResult<T>> {
        self.queued.pop_front().or_else(|| self.fallback.clone())
    }
}

// ── Task metadata ──────────────────────────────────────────────────

/// Metadata endpoint returning a fixed document.
#[derive(Default)]
pub struct MockMetadata {
    response: Mutex<Script<TaskMetadata>>,
    calls: AtomicUsize,
}

impl MockMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call with `response`.
    pub fn metadata_ret(self, response: GuardResult<TaskMetadata>) -> Self {
        lock(&self.response).fallback = Some(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskMetadataSource for MockMetadata {
    async fn task_metadata(&self) -> GuardResult<TaskMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.response)
            .next()
            .unwrap_or_else(|| Err(GuardError::Metadata("no scripted metadata".to_string())))
    }
}

// ── Control plane ──────────────────────────────────────────────────

/// Control plane with scripted task and service descriptions.
#[derive(Default)]
pub struct MockControlPlane {
    tasks: Mutex<Script<TaskRecord>>,
    services: Mutex<Script<ServiceRecord>>,
    task_calls: AtomicUsize,
    service_calls: AtomicUsize,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `describe_task` with `response` once the queue is drained.
    pub fn task_ret(self, response: GuardResult<TaskRecord>) -> Self {
        lock(&self.tasks).fallback = Some(response);
        self
    }

    /// Queue one `describe_task` response ahead of the fallback.
    pub fn task_then(self, response: GuardResult<TaskRecord>) -> Self {
        lock(&self.tasks).queued.push_back(response);
        self
    }

    /// Answer `describe_service` with `response`.
    pub fn service_ret(self, response: GuardResult<ServiceRecord>) -> Self {
        lock(&self.services).fallback = Some(response);
        self
    }

    pub fn describe_task_calls(&self) -> usize {
        self.task_calls.load(Ordering::SeqCst)
    }

    pub fn describe_service_calls(&self) -> usize {
        self.service_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn describe_task(&self, cluster: &str, task_arn: &str) -> GuardResult<TaskRecord> {
        self.task_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.tasks).next().unwrap_or_else(|| {
            Err(GuardError::TaskNotFound {
                cluster: cluster.to_string(),
                task_arn: task_arn.to_string(),
            })
        })
    }

    async fn describe_service(&self, cluster: &str, service: &str) -> GuardResult<ServiceRecord> {
        self.service_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.services).next().unwrap_or_else(|| {
            Err(GuardError::ServiceNotFound {
                cluster: cluster.to_string(),
                service: service.to_string(),
            })
        })
    }
}

// ── Registry ───────────────────────────────────────────────────────

/// Registry that records deregistrations and replays operation states.
#[derive(Default)]
pub struct MockRegistry {
    deregistrations: Mutex<Script<String>>,
    operations: Mutex<Script<DeregistrationOperation>>,
    deregister_calls: Mutex<Vec<(String, String)>>,
    operation_calls: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that accepts any deregistration as `operation_id` and
    /// reports it as immediately successful.
    pub fn accepting(operation_id: &str) -> Self {
        Self::new()
            .deregister_ret(Ok(operation_id.to_string()))
            .operation_ret(Ok(operation(operation_id, OperationStatus::Success)))
    }

    /// Answer `deregister_instance` with `response`.
    pub fn deregister_ret(self, response: GuardResult<String>) -> Self {
        lock(&self.deregistrations).fallback = Some(response);
        self
    }

    /// Answer `get_operation` with `response` once the queue is drained.
    pub fn operation_ret(self, response: GuardResult<DeregistrationOperation>) -> Self {
        lock(&self.operations).fallback = Some(response);
        self
    }

    /// Queue one `get_operation` response ahead of the fallback.
    pub fn operation_then(self, response: GuardResult<DeregistrationOperation>) -> Self {
        lock(&self.operations).queued.push_back(response);
        self
    }

    /// Every `(instance_id, service_id)` pair passed to `deregister_instance`.
    pub fn deregister_calls(&self) -> Vec<(String, String)> {
        lock(&self.deregister_calls).clone()
    }

    pub fn operation_calls(&self) -> usize {
        self.operation_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn deregister_instance(&self, instance_id: &str, service_id: &str) -> GuardResult<String> {
        lock(&self.deregister_calls).push((instance_id.to_string(), service_id.to_string()));
        lock(&self.deregistrations)
            .next()
            .unwrap_or_else(|| Err(GuardError::Registry("no scripted deregistration".to_string())))
    }

    async fn get_operation(&self, operation_id: &str) -> GuardResult<DeregistrationOperation> {
        self.operation_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.operations).next().unwrap_or_else(|| {
            Err(GuardError::Registry(format!(
                "no scripted state for operation {operation_id}"
            )))
        })
    }
}

// ── Record builders ────────────────────────────────────────────────

/// A task record as the control plane would describe a service task.
pub fn task_record(task_arn: &str, service: &str, health: &str, last_status: &str) -> TaskRecord {
    TaskRecord {
        task_arn: task_arn.to_string(),
        group: Some(format!("service:{service}")),
        health_status: Some(health.to_string()),
        last_status: Some(last_status.to_string()),
    }
}

/// A minimal metadata document for a task.
pub fn task_metadata(cluster: &str, task_arn: &str) -> TaskMetadata {
    TaskMetadata {
        cluster: cluster.to_string(),
        task_arn: task_arn.to_string(),
        family: "app".to_string(),
        revision: "1".to_string(),
        desired_status: "RUNNING".to_string(),
        known_status: "RUNNING".to_string(),
        containers: Vec::new(),
    }
}

/// A service whose primary deployment registers into `discovery_arn`.
pub fn service_with_registry(service: &str, discovery_name: &str, discovery_arn: &str) -> ServiceRecord {
    ServiceRecord {
        service_name: service.to_string(),
        deployments: vec![DeploymentRecord {
            id: "ecs-svc/1".to_string(),
            status: "PRIMARY".to_string(),
            service_connect_enabled: true,
            resources: vec![RegistryResource {
                discovery_name: discovery_name.to_string(),
                discovery_arn: discovery_arn.to_string(),
            }],
        }],
    }
}

/// A service whose primary deployment has no registry integration.
pub fn service_without_registry(service: &str) -> ServiceRecord {
    ServiceRecord {
        service_name: service.to_string(),
        deployments: vec![DeploymentRecord {
            id: "ecs-svc/1".to_string(),
            status: "PRIMARY".to_string(),
            service_connect_enabled: false,
            resources: Vec::new(),
        }],
    }
}

/// An operation in the given state.
pub fn operation(operation_id: &str, status: OperationStatus) -> DeregistrationOperation {
    DeregistrationOperation {
        operation_id: operation_id.to_string(),
        status,
        error_message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn control_plane_replays_queue_then_fallback() {
        let cp = MockControlPlane::new()
            .task_then(Ok(task_record("t", "svc", "HEALTHY", "ACTIVATING")))
            .task_ret(Ok(task_record("t", "svc", "HEALTHY", "RUNNING")));

        let first = cp.describe_task("c", "t").await.unwrap();
        let second = cp.describe_task("c", "t").await.unwrap();
        let third = cp.describe_task("c", "t").await.unwrap();

        assert_eq!(first.last_status.as_deref(), Some("ACTIVATING"));
        assert_eq!(second.last_status.as_deref(), Some("RUNNING"));
        assert_eq!(third.last_status.as_deref(), Some("RUNNING"));
        assert_eq!(cp.describe_task_calls(), 3);
    }

    #[tokio::test]
    async fn control_plane_unscripted_is_not_found() {
        let cp = MockControlPlane::new();
        assert!(matches!(
            cp.describe_task("c", "t").await,
            Err(GuardError::TaskNotFound { .. })
        ));
        assert!(matches!(
            cp.describe_service("c", "s").await,
            Err(GuardError::ServiceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn registry_records_deregistrations() {
        let registry = MockRegistry::accepting("op-1");

        let op_id = registry.deregister_instance("task-1", "srv-1").await.unwrap();
        assert_eq!(op_id, "op-1");
        assert_eq!(
            registry.deregister_calls(),
            vec![("task-1".to_string(), "srv-1".to_string())]
        );

        let op = registry.get_operation("op-1").await.unwrap();
        assert_eq!(op.status, OperationStatus::Success);
        assert_eq!(registry.operation_calls(), 1);
    }

    #[tokio::test]
    async fn metadata_unscripted_fails() {
        let meta = MockMetadata::new();
        assert!(meta.task_metadata().await.is_err());
        assert_eq!(meta.calls(), 1);
    }
}
