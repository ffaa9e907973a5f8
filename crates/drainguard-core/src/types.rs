//! Domain types shared across drainguard.
//!
//! Identity and binding are resolved once at startup and never change.
//! Samples are produced fresh on every poll tick and only ever replaced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arn::physical_id;
use crate::error::GuardError;

// ── Health and lifecycle ───────────────────────────────────────────

/// Health of the task as reported by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    /// Map the control plane's health string. Missing or unrecognised
    /// values collapse to `Unknown`.
    pub fn from_control_plane(value: Option<&str>) -> Self {
        match value {
            Some("HEALTHY") => Self::Healthy,
            Some("UNHEALTHY") => Self::Unhealthy,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Unhealthy => "UNHEALTHY",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The orchestrator's coarse-grained phase for a task.
///
/// Once a task leaves `Running` for a shutdown state it never returns to
/// `Running` or any earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Provisioning,
    Pending,
    Activating,
    Running,
    Deactivating,
    Stopping,
    Deprovisioning,
    Stopped,
}

impl LifecycleState {
    /// The orchestrator has begun tearing the task down but it is not
    /// yet stopped.
    pub fn is_shutting_down(&self) -> bool {
        matches!(
            self,
            Self::Deactivating | Self::Stopping | Self::Deprovisioning
        )
    }

    /// The task has moved past `Running` for good.
    pub fn is_past_running(&self) -> bool {
        self.is_shutting_down() || *self == Self::Stopped
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Pending => "PENDING",
            Self::Activating => "ACTIVATING",
            Self::Running => "RUNNING",
            Self::Deactivating => "DEACTIVATING",
            Self::Stopping => "STOPPING",
            Self::Deprovisioning => "DEPROVISIONING",
            Self::Stopped => "STOPPED",
        }
    }
}

impl FromStr for LifecycleState {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROVISIONING" => Ok(Self::Provisioning),
            "PENDING" => Ok(Self::Pending),
            "ACTIVATING" => Ok(Self::Activating),
            "RUNNING" => Ok(Self::Running),
            "DEACTIVATING" => Ok(Self::Deactivating),
            "STOPPING" => Ok(Self::Stopping),
            "DEPROVISIONING" => Ok(Self::Deprovisioning),
            "STOPPED" | "DELETED" => Ok(Self::Stopped),
            other => Err(GuardError::UnknownLifecycleState(other.to_string())),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of the task's health and lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSample {
    pub health_status: HealthStatus,
    pub lifecycle_state: LifecycleState,
    /// Unix timestamp (seconds) when the sample was taken.
    pub sampled_at: u64,
}

// ── Identity and binding ───────────────────────────────────────────

/// Who this sidecar is protecting. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceIdentity {
    pub cluster: String,
    pub task_arn: String,
    pub service_name: String,
    /// Registry-facing instance id, derived from `task_arn`.
    pub physical_instance_id: String,
}

impl InstanceIdentity {
    pub fn new(cluster: &str, task_arn: &str, service_name: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            task_arn: task_arn.to_string(),
            service_name: service_name.to_string(),
            physical_instance_id: physical_id(task_arn).to_string(),
        }
    }
}

/// The registry service this task is registered into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryBinding {
    pub discovery_arn: String,
    pub discovery_name: String,
    /// Registry-local service id, derived from `discovery_arn`.
    pub registry_service_id: String,
}

impl RegistryBinding {
    pub fn new(discovery_arn: &str, discovery_name: &str) -> Self {
        Self {
            discovery_arn: discovery_arn.to_string(),
            discovery_name: discovery_name.to_string(),
            registry_service_id: physical_id(discovery_arn).to_string(),
        }
    }
}

// ── Registry operations ────────────────────────────────────────────

/// Status of an asynchronous registry operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Submitted,
    Pending,
    Success,
    Fail,
}

impl OperationStatus {
    /// Map the registry's status string. Unrecognised values are treated
    /// as still in flight.
    pub fn from_registry(value: Option<&str>) -> Self {
        match value {
            Some("SUCCESS") => Self::Success,
            Some("FAIL") => Self::Fail,
            Some("SUBMITTED") => Self::Submitted,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Fail)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "SUBMITTED",
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Fail => "FAIL",
        };
        f.write_str(s)
    }
}

/// The registry's record of one deregistration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeregistrationOperation {
    pub operation_id: String,
    pub status: OperationStatus,
    pub error_message: Option<String>,
}

// ── Collaborator records ───────────────────────────────────────────

/// Task document served by the local metadata endpoint (`{endpoint}/task`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskMetadata {
    pub cluster: String,
    #[serde(rename = "TaskARN")]
    pub task_arn: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub desired_status: String,
    #[serde(default)]
    pub known_status: String,
    #[serde(default)]
    pub containers: Vec<ContainerMetadata>,
}

/// One container entry of the task metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerMetadata {
    pub name: String,
    #[serde(default)]
    pub desired_status: String,
    #[serde(default)]
    pub known_status: String,
    #[serde(default)]
    pub health: Option<ContainerHealth>,
}

impl ContainerMetadata {
    /// Health check verdict as the agent last reported it. Containers
    /// without a health check report `UNKNOWN`.
    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::from_control_plane(self.health.as_ref().map(|h| h.status.as_str()))
    }
}

/// Docker health check result of a container. The agent emits these
/// keys in camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHealth {
    #[serde(alias = "Status")]
    pub status: String,
    #[serde(default, rename = "statusSince", alias = "StatusSince")]
    pub status_since: Option<String>,
    #[serde(default, alias = "Output")]
    pub output: Option<String>,
}

/// Control plane description of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task_arn: String,
    /// `service:<name>` for service tasks.
    pub group: Option<String>,
    pub health_status: Option<String>,
    pub last_status: Option<String>,
}

/// Control plane description of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub service_name: String,
    /// Deployments as listed by the control plane, newest first.
    pub deployments: Vec<DeploymentRecord>,
}

/// One deployment of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub id: String,
    /// `PRIMARY`, `ACTIVE` or `INACTIVE`.
    pub status: String,
    pub service_connect_enabled: bool,
    pub resources: Vec<RegistryResource>,
}

/// A registry service created for a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryResource {
    pub discovery_name: String,
    pub discovery_arn: String,
}
