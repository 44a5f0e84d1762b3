//! Run lifecycle: the state machine driving startup and teardown.
//!
//! Startup is strictly ordered (resolve config, start backend, start
//! gateway) because each step needs the previous one's output. Teardown is
//! idempotent and runs at most once per run, whichever of the host end
//! event or a termination signal arrives first.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use offstack_config::{resolve, RawOptions};
use offstack_dynamodb::{
    Backend, BackendStartError, BackendSupervisor, DynamoLocalLauncher, EmulatorLauncher,
};
use offstack_gateway::{GatewayHandle, GatewayLauncher, HttpGatewayLauncher, ServerStartError};

use crate::host;
use crate::shutdown::{self, ShutdownCause};

// ============================================================================
// Run state
// ============================================================================

/// Phase of one orchestrated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    #[default]
    Idle,
    Configuring,
    StartingBackend,
    StartingServer,
    Running,
    Terminating,
    Terminated,
    /// A starting phase errored; nothing is running.
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "IDLE",
            RunState::Configuring => "CONFIGURING",
            RunState::StartingBackend => "STARTING_BACKEND",
            RunState::StartingServer => "STARTING_SERVER",
            RunState::Running => "RUNNING",
            RunState::Terminating => "TERMINATING",
            RunState::Terminated => "TERMINATED",
            RunState::Failed => "FAILED",
        }
    }

    /// True for phases that accept a fresh start request.
    pub fn is_startable(&self) -> bool {
        matches!(self, RunState::Idle | RunState::Terminated | RunState::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Terminated | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IDLE" => Ok(RunState::Idle),
            "CONFIGURING" => Ok(RunState::Configuring),
            "STARTING_BACKEND" => Ok(RunState::StartingBackend),
            "STARTING_SERVER" => Ok(RunState::StartingServer),
            "RUNNING" => Ok(RunState::Running),
            "TERMINATING" => Ok(RunState::Terminating),
            "TERMINATED" => Ok(RunState::Terminated),
            "FAILED" => Ok(RunState::Failed),
            _ => Err(format!("Invalid run state: '{}'", s)),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Startup failure at the lifecycle boundary.
#[derive(Debug, Error)]
pub enum StartError {
    /// The project descriptor existed but could not be loaded.
    #[error(transparent)]
    Host(#[from] anyhow::Error),
    #[error(transparent)]
    Backend(#[from] BackendStartError),
    #[error(transparent)]
    Server(#[from] ServerStartError),
}

// ============================================================================
// Controller
// ============================================================================

struct Inner<B, G> {
    service_path: PathBuf,
    cli_options: RawOptions,
    supervisor: BackendSupervisor<B>,
    gateway_launcher: G,
    state: RunState,
    backend: Option<Backend>,
    server: Option<GatewayHandle>,
}

/// Drives one run of the offline stack.
///
/// Entry points mirror the host framework's lifecycle: `on_begin` starts
/// the stack and returns (hooked mode), `on_end` tears it down,
/// `start_standalone` starts and then blocks until a termination signal.
/// Handles are owned here for the duration of the run; cloning the
/// controller shares them.
pub struct LifecycleController<B = DynamoLocalLauncher, G = HttpGatewayLauncher> {
    inner: Arc<Mutex<Inner<B, G>>>,
}

impl<B, G> Clone for LifecycleController<B, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl LifecycleController {
    /// Controller with the production emulator and gateway launchers.
    pub fn new(service_path: PathBuf, cli_options: RawOptions) -> Self {
        Self::with_components(
            service_path,
            cli_options,
            BackendSupervisor::new(),
            HttpGatewayLauncher,
        )
    }
}

impl<B, G> LifecycleController<B, G>
where
    B: EmulatorLauncher + 'static,
    G: GatewayLauncher + 'static,
{
    pub fn with_components(
        service_path: PathBuf,
        cli_options: RawOptions,
        supervisor: BackendSupervisor<B>,
        gateway_launcher: G,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                service_path,
                cli_options,
                supervisor,
                gateway_launcher,
                state: RunState::Idle,
                backend: None,
                server: None,
            })),
        }
    }

    pub async fn state(&self) -> RunState {
        self.inner.lock().await.state
    }

    /// Hooked-mode begin: start the stack, register signal listeners, and
    /// return without blocking. The host drives teardown via [`on_end`],
    /// or a signal does.
    ///
    /// [`on_end`]: LifecycleController::on_end
    pub async fn on_begin(&self) -> Result<(), StartError> {
        if self.startup().await? {
            self.spawn_signal_listener();
        }
        Ok(())
    }

    /// Hooked-mode end: tear the stack down. Safe to call at any time and
    /// more than once.
    pub async fn on_end(&self) {
        self.terminate(ShutdownCause::HostEnd).await;
    }

    /// Standalone mode: start the stack and block until SIGINT or SIGTERM,
    /// then tear down. Returns the cause that ended the run.
    pub async fn start_standalone(&self) -> Result<ShutdownCause, StartError> {
        self.run_until(shutdown::interrupt(), shutdown::terminate())
            .await
    }

    /// Start the stack and block until either cause future resolves.
    /// The first to resolve names the run's termination cause; the other
    /// is dropped once teardown begins.
    pub async fn run_until<F1, F2>(&self, interrupt: F1, terminate: F2) -> Result<ShutdownCause, StartError>
    where
        F1: std::future::Future<Output = ()>,
        F2: std::future::Future<Output = ()>,
    {
        self.startup().await?;

        let cause = tokio::select! {
            _ = interrupt => ShutdownCause::Interrupt,
            _ = terminate => ShutdownCause::Terminate,
        };
        info!("received {}", cause);
        self.terminate(cause).await;
        Ok(cause)
    }

    /// Orderly teardown: stop the gateway, then the backend if this run
    /// owns its process. Repeat calls while terminating or after
    /// completion are no-ops.
    pub async fn terminate(&self, cause: ShutdownCause) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            RunState::Running => {}
            RunState::Terminating | RunState::Terminated => {
                debug!("termination already underway; ignoring {}", cause);
                return;
            }
            state => {
                debug!("nothing to terminate while {}", state);
                return;
            }
        }
        inner.state = RunState::Terminating;
        info!("offstack - stopping gateway and local database ({})", cause);

        if let Some(server) = inner.server.take() {
            server.shutdown().await;
            debug!("gateway stopped");
        }
        if let Some(mut backend) = inner.backend.take() {
            if backend.owns_process() {
                match backend.stop().await {
                    Ok(()) => info!("dynamodb emulator stopped"),
                    Err(err) => error!("ERROR: {}", err),
                }
            } else {
                debug!("external data store left running");
            }
        }

        inner.state = RunState::Terminated;
        info!("shutdown complete ({})", cause);
    }

    /// Run the startup sequence. `Ok(true)` means a fresh run reached
    /// `Running`; `Ok(false)` means the request was ignored because a run
    /// is already active (its listeners stay the only ones registered).
    async fn startup(&self) -> Result<bool, StartError> {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_startable() {
            warn!("start requested while {}; ignoring", inner.state);
            return Ok(false);
        }

        inner.state = RunState::Configuring;
        match Self::bring_up(&mut inner).await {
            Ok(url) => {
                inner.state = RunState::Running;
                info!("gateway started: {}", url);
                Ok(true)
            }
            Err(err) => {
                inner.state = RunState::Failed;
                error!("ERROR: {}", err);
                Err(err)
            }
        }
    }

    async fn bring_up(inner: &mut Inner<B, G>) -> Result<String, StartError> {
        let declared = host::load_declared_options(&inner.service_path)?;
        let config = resolve(&inner.service_path, declared, inner.cli_options.clone());

        inner.state = RunState::StartingBackend;
        let mut backend = inner.supervisor.start(&config).await?;

        inner.state = RunState::StartingServer;
        let client = backend.client().clone();
        match inner.gateway_launcher.launch(&config, client).await {
            Ok(server) => {
                let url = server.url().to_string();
                inner.backend = Some(backend);
                inner.server = Some(server);
                Ok(url)
            }
            Err(err) => {
                // The backend came up but the run is aborting; take the
                // emulator down with it.
                if let Err(stop_err) = backend.stop().await {
                    warn!("failed to stop backend after aborted startup: {}", stop_err);
                }
                Err(StartError::Server(err))
            }
        }
    }

    /// Hooked runs also answer signals; whichever of signal or host end
    /// event lands first performs the single teardown.
    fn spawn_signal_listener(&self) {
        let controller = self.clone();
        tokio::spawn(async move {
            let cause = shutdown::wait_any().await;
            info!("received {}", cause);
            controller.terminate(cause).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_state_round_trips_through_strings() {
        for state in [
            RunState::Idle,
            RunState::Configuring,
            RunState::StartingBackend,
            RunState::StartingServer,
            RunState::Running,
            RunState::Terminating,
            RunState::Terminated,
            RunState::Failed,
        ] {
            assert_eq!(state.as_str().parse::<RunState>().unwrap(), state);
        }
        assert!("NOT_A_STATE".parse::<RunState>().is_err());
    }

    #[test]
    fn run_state_serde_names_match_canonical_strings() {
        assert_eq!(
            serde_json::to_string(&RunState::StartingBackend).unwrap(),
            "\"STARTING_BACKEND\""
        );
        let state: RunState = serde_json::from_str("\"TERMINATED\"").unwrap();
        assert_eq!(state, RunState::Terminated);
    }

    #[test]
    fn startable_states() {
        assert!(RunState::Idle.is_startable());
        assert!(RunState::Terminated.is_startable());
        assert!(RunState::Failed.is_startable());
        assert!(!RunState::Running.is_startable());
        assert!(!RunState::Terminating.is_startable());
    }
}
