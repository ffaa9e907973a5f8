//! drainguard-core: shared vocabulary for the drainguard sidecar.
//!
//! Holds the domain types exchanged between the sampler, the policy and
//! the controller, the traits the controller uses to talk to the outside
//! world, and the single error type every fallible call returns.
//!
//! # Architecture
//!
//! ```text
//! TaskMetadataSource ──► InstanceIdentity ─┐
//! ControlPlane ────────► TaskRecord ───────┼──► HealthSample
//!              └───────► ServiceRecord ────┴──► RegistryBinding
//! Registry ────────────► DeregistrationOperation
//! ```
//!
//! Every variant of [`GuardError`] is fatal: the sidecar has no second
//! source of truth to fall back on, so errors bubble up to the binary
//! which logs them and exits non-zero.

pub mod arn;
pub mod client;
pub mod error;
pub mod mock;
pub mod time;
pub mod types;

pub use arn::{physical_id, service_name_from_group};
pub use client::{ControlPlane, Registry, TaskMetadataSource};
pub use error::{GuardError, GuardResult};
pub use time::{epoch_secs, parse_duration, with_timeout};
pub use types::*;
