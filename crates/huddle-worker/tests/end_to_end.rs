//! End-to-end tests over real loopback TCP: a hosting client on one side,
//! the worker runtime (in-process or as a spawned binary) on the other.
//!
//! Covered here rather than in unit tests:
//! - the full start flow: engine invoked, status notifications precede the
//!   response, the slot clears so a second start proceeds
//! - handled connect-failure reasons acknowledged as success
//! - the spawned worker binary serving the protocol and exiting cleanly
//! - the startup window killing a worker that finds no listener

use std::time::Duration;

use tempfile::TempDir;
use tokio::task::JoinHandle;

use huddle_core::{MeetingOptions, MeetingStatus, StartMeetingParams};
use huddle_hosting::{HostConfig, HostingClient, WorkerEvent, WorkerLauncher};
use huddle_protocol::Notification;
use huddle_worker::WorkerResult;
use huddle_worker::engine::MockEngine;
use huddle_worker::runtime::{self, WorkerSettings};

/// Binds a hosting client and runs the worker runtime in-process against it.
async fn start_pair() -> (HostingClient, JoinHandle<WorkerResult<()>>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut client = HostingClient::bind(HostConfig::default()).await.unwrap();
    let settings = WorkerSettings::new(client.port())
        .with_startup_window(Duration::from_secs(5))
        .with_config_dir(dir.path());
    let worker = tokio::spawn(runtime::run(settings));
    client.accept().await.unwrap();
    (client, worker, dir)
}

fn next_status(event: Option<WorkerEvent>) -> i32 {
    match event {
        Some(WorkerEvent::Notification(Notification::MeetingStatusChanged {
            status, ..
        })) => status,
        other => panic!("expected a meeting status notification, got {:?}", other),
    }
}

#[tokio::test]
async fn meeting_flow_over_loopback() {
    let (mut client, worker, _dir) = start_pair().await;
    let mut events = client.take_events().unwrap();

    let result = client.login("alice", "tok-1").await.unwrap();
    assert!(result.is_success());

    let param = StartMeetingParams {
        display_name: "Alice".into(),
        ..StartMeetingParams::default()
    };
    let result = client
        .start_meeting(param, MeetingOptions::default())
        .await
        .unwrap();
    assert!(result.is_success());

    // The status notifications travel ahead of the response, so both are
    // already queued once the call returns.
    assert_eq!(
        next_status(events.try_recv().ok()),
        MeetingStatus::Connecting.as_wire()
    );
    assert_eq!(
        next_status(events.try_recv().ok()),
        MeetingStatus::Connected.as_wire()
    );

    let (result, info) = client.meeting_info().await.unwrap();
    assert!(result.is_success());
    assert!(info.is_host);
    assert!(!info.meeting_id.is_empty());
    assert_eq!(info.members.len(), 1);

    let result = client.leave_meeting(false).await.unwrap();
    assert!(result.is_success());
    assert_eq!(
        next_status(events.try_recv().ok()),
        MeetingStatus::Ended.as_wire()
    );

    // The start slot resolved and the meeting reset, so a second start
    // proceeds instead of failing as a frequent operation.
    let result = client
        .start_meeting(
            StartMeetingParams {
                display_name: "Alice".into(),
                ..StartMeetingParams::default()
            },
            MeetingOptions::default(),
        )
        .await
        .unwrap();
    assert!(result.is_success());

    let result = client.leave_meeting(false).await.unwrap();
    assert!(result.is_success());
    let result = client.logout(false).await.unwrap();
    assert!(result.is_success());

    client.close().await.unwrap();
    worker.await.unwrap().unwrap();
}

#[tokio::test]
async fn handled_connect_failure_acknowledges_the_start() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = HostingClient::bind(HostConfig::default()).await.unwrap();

    let (mut engine, engine_events) = MockEngine::new();
    engine.fail_next_connect(5001, "join timeout");
    let settings = WorkerSettings::new(client.port()).with_config_dir(dir.path());
    let worker = tokio::spawn(runtime::run_with_engine(settings, engine, engine_events));
    client.accept().await.unwrap();
    let mut events = client.take_events().unwrap();

    // "join timeout" was already surfaced to the user by the engine, so the
    // request resolves as handled: success with an empty message.
    let result = client
        .start_meeting(
            StartMeetingParams {
                display_name: "Ann".into(),
                ..StartMeetingParams::default()
            },
            MeetingOptions::default(),
        )
        .await
        .unwrap();
    assert!(result.is_success());
    assert!(result.message.is_empty());

    assert_eq!(
        next_status(events.try_recv().ok()),
        MeetingStatus::Connecting.as_wire()
    );
    assert_eq!(
        next_status(events.try_recv().ok()),
        MeetingStatus::ConnectFailed.as_wire()
    );
    // The engine settles back to Idle right after the failure.
    assert_eq!(
        next_status(events.recv().await),
        MeetingStatus::Idle.as_wire()
    );

    client.close().await.unwrap();
    worker.await.unwrap().unwrap();
}

#[tokio::test]
async fn spawned_worker_answers_over_loopback() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = HostingClient::bind(HostConfig::default()).await.unwrap();
    let mut worker = WorkerLauncher::new(env!("CARGO_BIN_EXE_huddle-worker"))
        .with_config_dir(dir.path())
        .spawn(client.port())
        .unwrap();
    client.accept().await.unwrap();

    let result = client.login("bob", "tok-2").await.unwrap();
    assert!(result.is_success());

    let (result, account) = client.account_info().await.unwrap();
    assert!(result.is_success());
    assert_eq!(account.account_id, "bob");

    let result = client.logout(false).await.unwrap();
    assert!(result.is_success());

    client.close().await.unwrap();
    let status = worker.wait().await.unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn worker_exits_when_no_host_listens() {
    // Bind then drop a listener so the port is dead.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let mut worker = WorkerLauncher::new(env!("CARGO_BIN_EXE_huddle-worker"))
        .with_config_dir(dir.path())
        .with_startup_window_secs(1)
        .spawn(port)
        .unwrap();

    let status = tokio::time::timeout(Duration::from_secs(10), worker.wait())
        .await
        .expect("worker should exit within its startup window")
        .unwrap();
    assert!(!status.success());
}
