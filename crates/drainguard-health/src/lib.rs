//! drainguard-health: deciding whether a task must leave the registry.
//!
//! Two pieces:
//!
//! ```text
//! HealthSampler ── describe_task ──► HealthSample
//!                                        │
//!                                    evaluate()
//!                                        │
//!                         Decision::{Remain, Deregister(reason)}
//! ```
//!
//! The sampler owns all I/O and never interprets what it reads beyond
//! normalising strings. The policy is a pure function of one sample:
//! no hysteresis, no debounce. A single unhealthy sample is enough.

pub mod policy;
pub mod sampler;

pub use policy::{evaluate, Decision, DeregisterReason};
pub use sampler::HealthSampler;
