//! End-to-end lifecycle scenarios with capturing fakes at the launcher
//! seams: a recording emulator launcher that hands back a trivial live
//! child, and a recording gateway launcher that never opens a socket.

use std::future::{pending, ready};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use offstack::{LifecycleController, RunState, ShutdownCause, StartError};
use offstack_config::{ClientOptions, DynamoSection, RawOptions, ResolvedConfig};
use offstack_dynamodb::{
    BackendStartError, BackendSupervisor, DynamoClient, EmulatorLauncher, EmulatorOptions,
    EmulatorProcess,
};
use offstack_gateway::{GatewayHandle, GatewayLauncher, ServerStartError};

/// Records launch requests and adopts a `sleep` child as the emulator.
#[derive(Clone, Default)]
struct RecordingEmulator {
    calls: Arc<Mutex<Vec<EmulatorOptions>>>,
    pids: Arc<Mutex<Vec<u32>>>,
}

#[async_trait]
impl EmulatorLauncher for RecordingEmulator {
    async fn launch(
        &self,
        options: &EmulatorOptions,
    ) -> Result<EmulatorProcess, BackendStartError> {
        self.calls.lock().unwrap().push(options.clone());
        let child = tokio::process::Command::new("sleep")
            .arg("30")
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BackendStartError::Spawn { source })?;
        if let Some(pid) = child.id() {
            self.pids.lock().unwrap().push(pid);
        }
        Ok(EmulatorProcess::adopt(child, options.port))
    }
}

/// True while `pid` names a live (unreaped) process.
#[cfg(unix)]
async fn pid_alive(pid: u32) -> bool {
    tokio::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GatewayCall {
    descriptor: PathBuf,
    port: Option<u16>,
    data_endpoint: String,
}

/// Records what the lifecycle hands the gateway; optionally fails the
/// launch to exercise the abort path.
#[derive(Clone, Default)]
struct RecordingGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    fail: bool,
}

impl RecordingGateway {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl GatewayLauncher for RecordingGateway {
    async fn launch(
        &self,
        config: &ResolvedConfig,
        client: DynamoClient,
    ) -> Result<GatewayHandle, ServerStartError> {
        self.calls.lock().unwrap().push(GatewayCall {
            descriptor: config.descriptor_path(),
            port: config.port,
            data_endpoint: client.endpoint().to_string(),
        });
        if self.fail {
            return Err(ServerStartError::SchemaMissing {
                path: config.schema_path.clone(),
            });
        }
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join_handle = tokio::spawn(async move {
            let _ = shutdown_rx.await;
        });
        Ok(GatewayHandle::new(
            "http://127.0.0.1:62222".to_string(),
            shutdown_tx,
            join_handle,
        ))
    }
}

fn controller(
    service_path: PathBuf,
    cli: RawOptions,
    emulator: RecordingEmulator,
    gateway: RecordingGateway,
) -> LifecycleController<RecordingEmulator, RecordingGateway> {
    LifecycleController::with_components(
        service_path,
        cli,
        BackendSupervisor::with_launcher(emulator),
        gateway,
    )
}

fn external_options(port: Option<u16>) -> RawOptions {
    RawOptions {
        port,
        dynamodb: DynamoSection {
            client: ClientOptions {
                endpoint: Some("mock-dynamodb-endpoint".into()),
                ..Default::default()
            },
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn external_endpoint_run_never_launches_a_process() {
    let emulator = RecordingEmulator::default();
    let gateway = RecordingGateway::default();
    let controller = controller(
        PathBuf::from("mock-service-path"),
        external_options(Some(1234)),
        emulator.clone(),
        gateway.clone(),
    );

    controller.on_begin().await.unwrap();
    assert_eq!(controller.state().await, RunState::Running);

    // The gateway got the resolved port, the project descriptor, and a
    // client against the external endpoint; the emulator never fired.
    let calls = gateway.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].port, Some(1234));
    assert_eq!(
        calls[0].descriptor,
        PathBuf::from("mock-service-path/serverless.yml")
    );
    assert_eq!(calls[0].data_endpoint, "http://mock-dynamodb-endpoint/");
    assert!(emulator.calls.lock().unwrap().is_empty());

    controller.on_end().await;
    assert_eq!(controller.state().await, RunState::Terminated);
}

#[cfg(unix)]
#[tokio::test]
async fn default_run_launches_embedded_emulator() {
    let dir = tempfile::tempdir().unwrap();
    let emulator = RecordingEmulator::default();
    let gateway = RecordingGateway::default();
    let controller = controller(
        dir.path().to_path_buf(),
        RawOptions::default(),
        emulator.clone(),
        gateway.clone(),
    );

    controller.on_begin().await.unwrap();

    {
        let launches = emulator.calls.lock().unwrap();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].db_path, dir.path().join(".dynamodb"));
        assert!(!launches[0].in_memory);
    }
    // No port anywhere in the layers: the gateway binds dynamically.
    assert_eq!(gateway.calls.lock().unwrap()[0].port, None);

    controller.on_end().await;
    assert_eq!(controller.state().await, RunState::Terminated);
}

#[tokio::test]
async fn declared_block_feeds_resolution_and_cli_wins() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("serverless.yml"),
        r#"
service: sample-app
custom:
  offstack:
    port: 4000
    dynamodb:
      client:
        endpoint: http://localhost:8000
"#,
    )
    .unwrap();

    let cli = RawOptions {
        port: Some(1234),
        ..Default::default()
    };
    let gateway = RecordingGateway::default();
    let controller = controller(
        dir.path().to_path_buf(),
        cli,
        RecordingEmulator::default(),
        gateway.clone(),
    );

    controller.on_begin().await.unwrap();
    let calls = gateway.calls.lock().unwrap().clone();
    assert_eq!(calls[0].port, Some(1234));
    assert_eq!(calls[0].data_endpoint, "http://localhost:8000/");

    controller.on_end().await;
}

#[tokio::test]
async fn teardown_is_idempotent() {
    let controller = controller(
        PathBuf::from("mock-service-path"),
        external_options(None),
        RecordingEmulator::default(),
        RecordingGateway::default(),
    );

    controller.on_begin().await.unwrap();
    controller.on_end().await;
    assert_eq!(controller.state().await, RunState::Terminated);

    // A second end event and a late signal-path termination are no-ops.
    controller.on_end().await;
    controller.terminate(ShutdownCause::Interrupt).await;
    assert_eq!(controller.state().await, RunState::Terminated);
}

#[cfg(unix)]
#[tokio::test]
async fn embedded_teardown_stops_the_process_once() {
    let dir = tempfile::tempdir().unwrap();
    let emulator = RecordingEmulator::default();
    let controller = controller(
        dir.path().to_path_buf(),
        RawOptions::default(),
        emulator.clone(),
        RecordingGateway::default(),
    );

    controller.on_begin().await.unwrap();
    let pid = emulator.pids.lock().unwrap()[0];
    assert!(pid_alive(pid).await);

    controller.on_end().await;
    assert_eq!(controller.state().await, RunState::Terminated);
    assert!(!pid_alive(pid).await);

    // Only one child was ever launched, and the second end event has no
    // process left to touch.
    controller.on_end().await;
    assert_eq!(emulator.calls.lock().unwrap().len(), 1);
    assert_eq!(controller.state().await, RunState::Terminated);
}

#[tokio::test]
async fn first_termination_cause_wins() {
    let controller = controller(
        PathBuf::from("mock-service-path"),
        external_options(None),
        RecordingEmulator::default(),
        RecordingGateway::default(),
    );
    let cause = controller.run_until(ready(()), pending()).await.unwrap();
    assert_eq!(cause, ShutdownCause::Interrupt);
    assert_eq!(controller.state().await, RunState::Terminated);

    let controller = controller_for_terminate_race();
    let cause = controller.run_until(pending(), ready(())).await.unwrap();
    assert_eq!(cause, ShutdownCause::Terminate);
}

fn controller_for_terminate_race() -> LifecycleController<RecordingEmulator, RecordingGateway> {
    controller(
        PathBuf::from("mock-service-path"),
        external_options(None),
        RecordingEmulator::default(),
        RecordingGateway::default(),
    )
}

#[cfg(unix)]
#[tokio::test]
async fn gateway_failure_aborts_startup() {
    let dir = tempfile::tempdir().unwrap();
    let emulator = RecordingEmulator::default();
    let controller = controller(
        dir.path().to_path_buf(),
        RawOptions::default(),
        emulator.clone(),
        RecordingGateway::failing(),
    );

    let err = controller.run_until(pending(), pending()).await;
    assert!(matches!(err, Err(StartError::Server(_))));
    assert_eq!(controller.state().await, RunState::Failed);
    // The emulator had been launched before the gateway failed.
    assert_eq!(emulator.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_descriptor_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("serverless.yml"),
        "custom:\n  offstack:\n    port: not-a-number\n",
    )
    .unwrap();

    let controller = controller(
        dir.path().to_path_buf(),
        RawOptions::default(),
        RecordingEmulator::default(),
        RecordingGateway::default(),
    );

    let err = controller.on_begin().await;
    assert!(matches!(err, Err(StartError::Host(_))));
    assert_eq!(controller.state().await, RunState::Failed);
}

#[tokio::test]
async fn second_begin_while_running_is_ignored() {
    let gateway = RecordingGateway::default();
    let controller = controller(
        PathBuf::from("mock-service-path"),
        external_options(None),
        RecordingEmulator::default(),
        gateway.clone(),
    );

    controller.on_begin().await.unwrap();
    controller.on_begin().await.unwrap();
    assert_eq!(gateway.calls.lock().unwrap().len(), 1);

    controller.on_end().await;
}
