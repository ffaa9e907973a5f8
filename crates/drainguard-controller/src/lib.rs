//! drainguard-controller: keeps a task's registry entry honest.
//!
//! Ties the pieces together for one task, once:
//!
//! ```text
//! Lifecycle::run
//!   ├── warm-up delay (cut short by a stop signal)
//!   ├── resolve_identity ── metadata endpoint + DescribeTasks
//!   ├── resolve_binding ─── DescribeServices (None → nothing to do)
//!   └── DeregistrationController::run_until_done
//!         ├── select! { interval tick → sample → evaluate,
//!         │             stop notice  → deregister now }
//!         ├── DeregisterInstance (exactly once)
//!         └── confirm_operation (bounded GetOperation polling)
//! ```
//!
//! The controller is consumed by `run_until_done`, so a second
//! deregistration cannot be issued from the same run.

pub mod confirm;
pub mod controller;
pub mod lifecycle;
pub mod resolve;
pub mod signals;

pub use confirm::{confirm_operation, ConfirmPolicy};
pub use controller::{ControllerSettings, Deregistered, DeregistrationController, Trigger};
pub use lifecycle::{Lifecycle, LifecycleSettings, Outcome};
pub use resolve::{resolve_binding, resolve_identity, Resolution};
pub use signals::{SignalWatcher, StopNotice, StopSignal};
