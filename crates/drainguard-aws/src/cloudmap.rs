//! Cloud Map registry client.

use async_trait::async_trait;
use aws_sdk_servicediscovery::error::DisplayErrorContext;
use aws_sdk_servicediscovery::types::Operation;
use aws_sdk_servicediscovery::Client;
use tracing::debug;

use drainguard_core::{DeregistrationOperation, GuardError, GuardResult, OperationStatus, Registry};

/// [`Registry`] backed by the AWS Cloud Map API.
#[derive(Clone)]
pub struct CloudMapRegistry {
    client: Client,
}

impl CloudMapRegistry {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Registry for CloudMapRegistry {
    async fn deregister_instance(&self, instance_id: &str, service_id: &str) -> GuardResult<String> {
        let output = self
            .client
            .deregister_instance()
            .service_id(service_id)
            .instance_id(instance_id)
            .send()
            .await
            .map_err(|e| {
                GuardError::Registry(format!(
                    "DeregisterInstance {instance_id} from {service_id}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let operation_id = output
            .operation_id()
            .ok_or(GuardError::MissingField("OperationId"))?;
        debug!(%instance_id, %service_id, %operation_id, "deregistration submitted");
        Ok(operation_id.to_string())
    }

    async fn get_operation(&self, operation_id: &str) -> GuardResult<DeregistrationOperation> {
        let output = self
            .client
            .get_operation()
            .operation_id(operation_id)
            .send()
            .await
            .map_err(|e| {
                GuardError::Registry(format!(
                    "GetOperation {operation_id}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let operation = output
            .operation()
            .ok_or(GuardError::MissingField("Operation"))?;
        Ok(operation_record(operation, operation_id))
    }
}

fn operation_record(operation: &Operation, requested_id: &str) -> DeregistrationOperation {
    DeregistrationOperation {
        operation_id: operation.id().unwrap_or(requested_id).to_string(),
        status: OperationStatus::from_registry(operation.status().map(|s| s.as_str())),
        error_message: operation.error_message().map(str::to_string),
    }
}
