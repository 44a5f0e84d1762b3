//! Backend plane: the data store a run operates against.
//!
//! A run either attaches to an externally managed endpoint or launches and
//! owns an embedded DynamoDB-compatible emulator process. Both cases yield
//! the same thin [`DynamoClient`]; which of the two happened is captured by
//! the [`Backend`] variants and decides who terminates what at teardown.

pub mod client;
pub mod emulator;
pub mod error;
pub mod supervisor;

pub use client::DynamoClient;
pub use emulator::{
    DynamoLocalLauncher, EmulatorLauncher, EmulatorOptions, EmulatorProcess, EMULATOR_HOME_ENV,
};
pub use error::{BackendStartError, TerminationError};
pub use supervisor::{Backend, BackendSupervisor};
