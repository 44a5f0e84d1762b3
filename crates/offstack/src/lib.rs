//! Offline stack orchestrator.
//!
//! Stands up an emulated data store and an API-emulation gateway for a
//! cloud application so the full stack can be exercised without the cloud:
//! configuration is resolved from CLI flags, the project's declarative
//! block, and defaults; the backend is attached or launched; the gateway
//! is started against it; teardown is orderly and idempotent, driven by
//! host lifecycle events or termination signals.
//!
//! Host frameworks embed this crate through [`LifecycleController`] and the
//! registry metadata in [`host`]; the `offstack` binary drives the same
//! controller standalone.

pub mod cli;
pub mod host;
pub mod lifecycle;
pub mod shutdown;

pub use lifecycle::{LifecycleController, RunState, StartError};
pub use shutdown::ShutdownCause;
