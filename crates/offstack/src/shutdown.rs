//! Termination causes and the OS signal sources that deliver them.

use std::fmt;

use tracing::warn;

/// Why a run ended. The first cause to arrive wins; later ones are
/// ignored once teardown has begun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// The host framework's "end" lifecycle event.
    HostEnd,
}

impl ShutdownCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownCause::Interrupt => "SIGINT",
            ShutdownCause::Terminate => "SIGTERM",
            ShutdownCause::HostEnd => "host end event",
        }
    }
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolves when SIGINT is delivered. A failed handler installation is
/// logged and parks this source forever; the other source still works.
pub async fn interrupt() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to install SIGINT handler: {}", err);
        std::future::pending::<()>().await;
    }
}

/// Resolves when SIGTERM is delivered.
#[cfg(unix)]
pub async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            warn!("failed to install SIGTERM handler: {}", err);
            std::future::pending::<()>().await;
        }
    }
}

/// SIGTERM does not exist off unix; only Ctrl+C ends the run there.
#[cfg(not(unix))]
pub async fn terminate() {
    std::future::pending::<()>().await;
}

/// First of the two OS signal sources to fire.
pub async fn wait_any() -> ShutdownCause {
    tokio::select! {
        _ = interrupt() => ShutdownCause::Interrupt,
        _ = terminate() => ShutdownCause::Terminate,
    }
}
