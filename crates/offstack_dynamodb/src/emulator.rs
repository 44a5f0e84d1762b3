//! Embedded emulator process control.
//!
//! The production launcher spawns the DynamoDB Local java distribution and
//! polls its TCP port until it accepts connections. Readiness has no
//! overall deadline; the loop exits only on success or on child death, and
//! an early exit is converted into a start error carrying captured stderr.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, info};

use offstack_config::{defaults, paths, ServerConfig};

use crate::error::BackendStartError;
use crate::error::TerminationError;

/// Environment variable overriding the emulator install directory.
pub const EMULATOR_HOME_ENV: &str = "OFFSTACK_DYNAMODB_HOME";

/// Jar file of the DynamoDB Local distribution.
const EMULATOR_JAR: &str = "DynamoDBLocal.jar";
/// Native library directory shipped next to the jar.
const EMULATOR_LIB_DIR: &str = "DynamoDBLocal_lib";
/// Interval between readiness probes.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launch parameters for one emulator run, derived from the resolved
/// server settings plus the port decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorOptions {
    pub port: u16,
    pub db_path: PathBuf,
    pub in_memory: bool,
    pub shared_db: bool,
    pub delay_transient_statuses: bool,
    pub optimize_db_before_startup: bool,
}

impl EmulatorOptions {
    /// Derive launch options from resolved server settings, reserving an
    /// OS-assigned port when none was configured.
    pub fn from_server(server: &ServerConfig) -> Result<Self, BackendStartError> {
        if server.optimize_db_before_startup && server.in_memory {
            return Err(BackendStartError::InvalidOptions(
                "optimizeDbBeforeStartup needs a dbPath-backed run and cannot be combined with inMemory".into(),
            ));
        }
        let port = match server.port {
            Some(port) => port,
            None => reserve_port()?,
        };
        Ok(Self {
            port,
            db_path: server.db_path.clone(),
            in_memory: server.in_memory,
            shared_db: server.shared_db,
            delay_transient_statuses: server.delay_transient_statuses,
            optimize_db_before_startup: server.optimize_db_before_startup,
        })
    }

    /// Emulator CLI flags. `-inMemory` and `-dbPath` are mutually
    /// exclusive on the real distribution, so an in-memory run omits the
    /// data directory.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-port".to_string(), self.port.to_string()];
        if self.in_memory {
            args.push("-inMemory".to_string());
        } else {
            args.push("-dbPath".to_string());
            args.push(self.db_path.display().to_string());
        }
        if self.shared_db {
            args.push("-sharedDb".to_string());
        }
        if self.delay_transient_statuses {
            args.push("-delayTransientStatuses".to_string());
        }
        if self.optimize_db_before_startup {
            args.push("-optimizeDbBeforeStartup".to_string());
        }
        args
    }
}

/// A live emulator child, owned by the backend handle.
#[derive(Debug)]
pub struct EmulatorProcess {
    child: Child,
    port: u16,
    terminated: bool,
}

impl EmulatorProcess {
    /// Wrap an already-spawned emulator child listening on `port`.
    pub fn adopt(child: Child, port: u16) -> Self {
        Self {
            child,
            port,
            terminated: false,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill and reap the child. Safe to call repeatedly; a child that
    /// already exited is not an error.
    pub async fn terminate(&mut self) -> Result<(), TerminationError> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;

        match self.child.start_kill() {
            Ok(()) => {}
            // InvalidInput: the child was already reaped.
            Err(err) if err.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(source) => return Err(TerminationError::Kill { source }),
        }
        match self.child.wait().await {
            Ok(status) => {
                debug!("emulator process exited with {}", status);
                Ok(())
            }
            Err(source) => Err(TerminationError::Kill { source }),
        }
    }
}

/// Seam between the supervisor and the concrete emulator spawn.
#[async_trait]
pub trait EmulatorLauncher: Send + Sync {
    async fn launch(&self, options: &EmulatorOptions)
        -> Result<EmulatorProcess, BackendStartError>;
}

/// Launches the DynamoDB Local java distribution.
///
/// The distribution is expected under [`EMULATOR_HOME_ENV`] or the default
/// install directory; fetching it is the operator's job, not this crate's.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamoLocalLauncher;

#[async_trait]
impl EmulatorLauncher for DynamoLocalLauncher {
    async fn launch(
        &self,
        options: &EmulatorOptions,
    ) -> Result<EmulatorProcess, BackendStartError> {
        let install_dir = emulator_install_dir();
        let jar = install_dir.join(EMULATOR_JAR);
        if !jar.is_file() {
            return Err(BackendStartError::Unavailable(format!(
                "{} not found under {}. Install the DynamoDB Local distribution there or set {}.",
                EMULATOR_JAR,
                install_dir.display(),
                EMULATOR_HOME_ENV
            )));
        }
        let java = which::which("java").map_err(|_| {
            BackendStartError::Unavailable(
                "no `java` on PATH; the embedded emulator needs a Java runtime".to_string(),
            )
        })?;

        if !options.in_memory {
            std::fs::create_dir_all(&options.db_path).map_err(|source| {
                BackendStartError::DbPath {
                    path: options.db_path.clone(),
                    source,
                }
            })?;
        }

        let mut cmd = Command::new(java);
        cmd.arg(format!(
            "-Djava.library.path={}",
            install_dir.join(EMULATOR_LIB_DIR).display()
        ))
        .arg("-jar")
        .arg(&jar)
        .args(options.to_args())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|source| BackendStartError::Spawn { source })?;
        info!(
            "spawned dynamodb emulator (pid={:?}) on port {}",
            child.id(),
            options.port
        );

        wait_until_ready(&mut child, options.port).await?;

        // Keep the pipe drained so a chatty child cannot stall on it.
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr));
        }

        Ok(EmulatorProcess::adopt(child, options.port))
    }
}

/// Install directory: OFFSTACK_DYNAMODB_HOME, else ~/.offstack/dynamodb.
fn emulator_install_dir() -> PathBuf {
    match std::env::var(EMULATOR_HOME_ENV) {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => paths::default_emulator_dir(),
    }
}

/// Reserve an OS-assigned port by binding and releasing it. The child
/// binds the same port right after.
fn reserve_port() -> Result<u16, BackendStartError> {
    let listener = std::net::TcpListener::bind((defaults::LOOPBACK_HOST, 0))
        .map_err(|source| BackendStartError::PortReservation { source })?;
    let port = listener
        .local_addr()
        .map_err(|source| BackendStartError::PortReservation { source })?
        .port();
    Ok(port)
}

/// Poll until the child answers on its TCP port. Exits only on success or
/// child death.
async fn wait_until_ready(child: &mut Child, port: u16) -> Result<(), BackendStartError> {
    let start = std::time::Instant::now();
    loop {
        if check_port(defaults::LOOPBACK_HOST, port).await {
            info!(
                "emulator ready on port {} after {:.2}s",
                port,
                start.elapsed().as_secs_f64()
            );
            return Ok(());
        }

        match child.try_wait() {
            Ok(Some(status)) => {
                let stderr = collect_stderr(child).await;
                return Err(BackendStartError::Exited {
                    status,
                    stderr: if stderr.is_empty() {
                        "(no stderr output)".to_string()
                    } else {
                        stderr
                    },
                });
            }
            Ok(None) => {
                debug!("waiting for emulator on port {}", port);
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
            Err(source) => return Err(BackendStartError::Poll { source }),
        }
    }
}

/// True when something accepts TCP connections at `host:port`.
async fn check_port(host: &str, port: u16) -> bool {
    let addr = format!("{}:{}", host, port);
    TcpStream::connect(&addr).await.is_ok()
}

/// Collect stderr from the child (consumes the stderr handle).
async fn collect_stderr(child: &mut Child) -> String {
    if let Some(mut stderr) = child.stderr.take() {
        let mut output = String::new();
        match stderr.read_to_string(&mut output).await {
            Ok(_) => output.trim().to_string(),
            Err(err) => format!("(failed to read stderr: {})", err),
        }
    } else {
        String::new()
    }
}

async fn drain_stderr(stderr: ChildStderr) {
    use tokio::io::{AsyncBufReadExt, BufReader};
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("emulator: {}", line);
    }
}
