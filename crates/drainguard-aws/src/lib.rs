//! drainguard-aws: the real collaborators behind the core traits.
//!
//! - [`MetadataClient`]: plain HTTP/1.1 `GET` against the task metadata
//!   endpoint injected into every container.
//! - [`EcsControlPlane`]: `DescribeTasks` / `DescribeServices`.
//! - [`CloudMapRegistry`]: `DeregisterInstance` / `GetOperation`.
//!
//! SDK errors are flattened into [`drainguard_core::GuardError`] with
//! their full context so the final log line explains what went wrong.

pub mod cloudmap;
pub mod ecs;
pub mod metadata;

pub use cloudmap::CloudMapRegistry;
pub use ecs::EcsControlPlane;
pub use metadata::MetadataClient;

/// Build both SDK-backed clients from the standard AWS environment
/// (region, credentials provider chain).
pub async fn clients_from_env() -> (EcsControlPlane, CloudMapRegistry) {
    let config = aws_config::load_from_env().await;
    tracing::debug!(region = ?config.region(), "loaded AWS configuration");
    (
        EcsControlPlane::new(aws_sdk_ecs::Client::new(&config)),
        CloudMapRegistry::new(aws_sdk_servicediscovery::Client::new(&config)),
    )
}
