use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while bringing the backend up, embedded or external.
#[derive(Debug, Error)]
pub enum BackendStartError {
    /// The configured endpoint could not be parsed into a URL.
    #[error("invalid data-store endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    /// Option combination the emulator cannot honor.
    #[error("invalid emulator options: {0}")]
    InvalidOptions(String),
    /// Emulator distribution or java runtime not found.
    #[error("emulator unavailable: {0}")]
    Unavailable(String),
    /// The data directory could not be created.
    #[error("failed to prepare dbPath {path}: {source}")]
    DbPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reserving a dynamic port failed.
    #[error("failed to reserve a local port: {source}")]
    PortReservation {
        #[source]
        source: std::io::Error,
    },
    /// The child process could not be spawned.
    #[error("failed to spawn emulator process: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
    /// Polling the child's status failed.
    #[error("failed to poll emulator process state: {source}")]
    Poll {
        #[source]
        source: std::io::Error,
    },
    /// The child exited before its port accepted connections.
    #[error("emulator exited during startup with {status}: {stderr}")]
    Exited {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Errors raised while stopping an owned emulator process.
#[derive(Debug, Error)]
pub enum TerminationError {
    #[error("failed to stop emulator process: {source}")]
    Kill {
        #[source]
        source: std::io::Error,
    },
}
