//! Backend selection: attach to an external endpoint or launch and own the
//! embedded emulator.

use tracing::info;

use offstack_config::ResolvedConfig;

use crate::client::DynamoClient;
use crate::emulator::{DynamoLocalLauncher, EmulatorLauncher, EmulatorOptions, EmulatorProcess};
use crate::error::{BackendStartError, TerminationError};

/// The chosen data store for one run.
///
/// `Embedded` owns the child process and must be stopped by this system;
/// `External` must not be touched at teardown.
#[derive(Debug)]
pub enum Backend {
    External { client: DynamoClient },
    Embedded {
        client: DynamoClient,
        process: EmulatorProcess,
    },
}

impl Backend {
    pub fn client(&self) -> &DynamoClient {
        match self {
            Backend::External { client } => client,
            Backend::Embedded { client, .. } => client,
        }
    }

    /// True when this run launched and owns the emulator process.
    pub fn owns_process(&self) -> bool {
        matches!(self, Backend::Embedded { .. })
    }

    /// Stop the owned process if there is one. No-op for external
    /// endpoints and for repeat calls.
    pub async fn stop(&mut self) -> Result<(), TerminationError> {
        match self {
            Backend::External { .. } => Ok(()),
            Backend::Embedded { process, .. } => process.terminate().await,
        }
    }
}

/// Decides once per run between attaching and launching, per the presence
/// of `client.endpoint` in the resolved settings.
#[derive(Debug)]
pub struct BackendSupervisor<L = DynamoLocalLauncher> {
    launcher: L,
}

impl BackendSupervisor {
    pub fn new() -> Self {
        Self {
            launcher: DynamoLocalLauncher,
        }
    }
}

impl Default for BackendSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: EmulatorLauncher> BackendSupervisor<L> {
    pub fn with_launcher(launcher: L) -> Self {
        Self { launcher }
    }

    /// Start the backend for this run.
    ///
    /// With an endpoint configured the data store is externally managed: a
    /// thin client is built against it and no process is launched.
    /// Otherwise the embedded emulator is launched from the resolved
    /// server settings and owned by the returned backend.
    pub async fn start(&self, config: &ResolvedConfig) -> Result<Backend, BackendStartError> {
        if let Some(endpoint) = config.client.endpoint.as_deref() {
            info!("attaching to external dynamodb endpoint {}", endpoint);
            let client = DynamoClient::connect(endpoint, &config.client)?;
            return Ok(Backend::External { client });
        }

        info!("starting dynamodb emulator");
        let options = EmulatorOptions::from_server(&config.server)?;
        let process = self.launcher.launch(&options).await?;
        let client = DynamoClient::local(process.port(), &config.client)?;
        info!("dynamodb emulator listening at {}", client.endpoint());
        Ok(Backend::Embedded { client, process })
    }
}
