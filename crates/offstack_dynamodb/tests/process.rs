//! Emulator process termination against real children.

#![cfg(unix)]

use offstack_dynamodb::EmulatorProcess;
use tokio::process::Command;

#[tokio::test]
async fn terminate_kills_and_reaps_a_live_child() {
    let child = Command::new("sleep")
        .arg("30")
        .kill_on_drop(true)
        .spawn()
        .unwrap();
    let mut process = EmulatorProcess::adopt(child, 0);
    let pid = process.pid();
    assert!(pid.is_some());

    process.terminate().await.unwrap();
    // Reaped: the pid is gone from the handle.
    assert!(process.pid().is_none());
}

#[tokio::test]
async fn terminate_twice_is_a_noop() {
    let child = Command::new("sleep")
        .arg("30")
        .kill_on_drop(true)
        .spawn()
        .unwrap();
    let mut process = EmulatorProcess::adopt(child, 0);

    process.terminate().await.unwrap();
    process.terminate().await.unwrap();
}

#[tokio::test]
async fn terminate_tolerates_an_already_exited_child() {
    let child = Command::new("true").spawn().unwrap();
    let mut process = EmulatorProcess::adopt(child, 0);

    // Give the child time to exit on its own before we stop it.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    process.terminate().await.unwrap();
}
