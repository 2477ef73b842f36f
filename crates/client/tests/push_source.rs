//! Tests for `PushSource` against an in-process hub.
//!
//! The test hub accepts WebSocket connections, answers the JSON protocol
//! handshake and then forwards scripted frames, so the full
//! connect -> process -> reconnect path runs without the real service.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reportdesk_client::client::HubClient;
use reportdesk_client::messages::RECORD_SEPARATOR;
use reportdesk_client::push::PushSource;
use reportdesk_client::reconciler::Reconciler;
use reportdesk_client::reconnect::ReconnectConfig;
use reportdesk_client::ConnectionStatus;
use reportdesk_core::{JobRegistry, JobStatus};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use common::job_json;

const WAIT: Duration = Duration::from_secs(5);

fn update_frame(id: u64, status: u8) -> String {
    let record = serde_json::json!({
        "type": 1,
        "target": "ReceiveUpdate",
        "arguments": [job_json(id, status)],
    });
    format!("{record}{RECORD_SEPARATOR}")
}

/// Start a hub that serves one scripted session per accepted connection.
/// Each session sends the frames received on `frames` until that sender
/// is dropped, then closes the socket.
async fn spawn_hub() -> (String, mpsc::UnboundedSender<mpsc::UnboundedReceiver<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (session_tx, mut session_rx) = mpsc::unbounded_channel::<mpsc::UnboundedReceiver<String>>();

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let Some(mut frames) = session_rx.recv().await else { break };
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

            // Handshake request, then the empty handshake reply.
            let _handshake = ws.next().await;
            ws.send(Message::Text(format!("{{}}{RECORD_SEPARATOR}"))).await.unwrap();

            while let Some(frame) = frames.recv().await {
                if ws.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
            let _ = ws.close(None).await;
        }
    });

    (format!("http://{addr}"), session_tx)
}

fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        multiplier: 2.0,
        stable_after: Duration::from_secs(10),
    }
}

/// Start a hub that counts accepted connections. With `handshake` every
/// session answers the handshake, sends a close record and hangs up;
/// without it the TCP socket is dropped before the WebSocket upgrade.
async fn spawn_dropping_hub(handshake: bool) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            if !handshake {
                drop(tcp);
                continue;
            }
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else { return };
                let _handshake = ws.next().await;
                let reply = format!("{{}}{RECORD_SEPARATOR}{{\"type\":7}}{RECORD_SEPARATOR}");
                let _ = ws.send(Message::Text(reply)).await;
                let _ = ws.close(None).await;
            });
        }
    });

    (format!("http://{addr}"), connections)
}

// ---------------------------------------------------------------------------
// Test: pushed updates reach the registry, new ids first
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pushed_updates_are_merged() {
    let (url, sessions) = spawn_hub().await;
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    sessions.send(frames_rx).unwrap();

    let (reconciler, merges) = Reconciler::new(JobRegistry::new());
    let mut jobs = reconciler.subscribe();
    let cancel = CancellationToken::new();
    let reconciler_task = tokio::spawn(reconciler.run(cancel.clone()));

    let push = PushSource::new(HubClient::new(&url, "/reportHub").unwrap(), fast_reconnect(), merges);
    let mut status = push.status();
    let push_task = tokio::spawn(push.run(cancel.clone()));

    tokio::time::timeout(WAIT, status.wait_for(|s| *s == ConnectionStatus::Connected))
        .await
        .unwrap()
        .unwrap();

    frames_tx.send(update_frame(1, 0)).unwrap();
    // Two records in a single frame.
    frames_tx
        .send(format!("{}{}", update_frame(2, 0), update_frame(1, 1)))
        .unwrap();

    let list = tokio::time::timeout(
        WAIT,
        jobs.wait_for(|list| list.len() == 2 && list[1].status == JobStatus::Processing),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(list[0].id.as_str(), "2");
    assert_eq!(list[1].id.as_str(), "1");

    cancel.cancel();
    push_task.await.unwrap();
    reconciler_task.await.unwrap();
    assert_eq!(*status.borrow(), ConnectionStatus::Stopped);
}

// ---------------------------------------------------------------------------
// Test: a dropped connection is re-established
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reconnects_after_hub_drops() {
    let (url, sessions) = spawn_hub().await;

    let (first_tx, first_rx) = mpsc::unbounded_channel();
    sessions.send(first_rx).unwrap();
    let (second_tx, second_rx) = mpsc::unbounded_channel();
    sessions.send(second_rx).unwrap();

    let (reconciler, merges) = Reconciler::new(JobRegistry::new());
    let mut jobs = reconciler.subscribe();
    let cancel = CancellationToken::new();
    let reconciler_task = tokio::spawn(reconciler.run(cancel.clone()));

    let push = PushSource::new(HubClient::new(&url, "reportHub").unwrap(), fast_reconnect(), merges);
    let mut status = push.status();
    let push_task = tokio::spawn(push.run(cancel.clone()));

    tokio::time::timeout(WAIT, status.wait_for(|s| *s == ConnectionStatus::Connected))
        .await
        .unwrap()
        .unwrap();
    first_tx.send(update_frame(1, 0)).unwrap();
    tokio::time::timeout(WAIT, jobs.wait_for(|list| list.len() == 1))
        .await
        .unwrap()
        .unwrap();

    // Ending the first session closes the socket; the update is queued for
    // whichever connection the client opens next.
    drop(first_tx);
    second_tx.send(update_frame(1, 2)).unwrap();
    let list = tokio::time::timeout(
        WAIT,
        jobs.wait_for(|list| list.first().map(|j| j.status) == Some(JobStatus::Completed)),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(list.len(), 1);

    cancel.cancel();
    push_task.await.unwrap();
    reconciler_task.await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: cancelling while the hub is unreachable stops the source
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancel_while_unreachable_stops() {
    let (_reconciler, merges) = Reconciler::new(JobRegistry::new());
    let push = PushSource::new(
        HubClient::new("http://127.0.0.1:9", "/reportHub").unwrap(),
        fast_reconnect(),
        merges,
    );
    let mut status = push.status();
    let cancel = CancellationToken::new();
    let push_task = tokio::spawn(push.run(cancel.clone()));

    tokio::time::timeout(WAIT, status.wait_for(|s| matches!(s, ConnectionStatus::Reconnecting { .. })))
        .await
        .unwrap()
        .unwrap();
    cancel.cancel();
    tokio::time::timeout(WAIT, push_task).await.unwrap().unwrap();
    assert_eq!(*status.borrow(), ConnectionStatus::Stopped);
}

// ---------------------------------------------------------------------------
// Test: a hub that accepts and then closes at once is redialled with backoff
// ---------------------------------------------------------------------------

#[tokio::test]
async fn short_sessions_are_redialled_with_backoff() {
    let (url, connections) = spawn_dropping_hub(true).await;
    let (_reconciler, merges) = Reconciler::new(JobRegistry::new());
    let config = ReconnectConfig {
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(400),
        multiplier: 2.0,
        stable_after: Duration::from_secs(10),
    };
    let push = PushSource::new(HubClient::new(&url, "/reportHub").unwrap(), config, merges);
    let mut status = push.status();
    let cancel = CancellationToken::new();
    let push_task = tokio::spawn(push.run(cancel.clone()));

    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    tokio::time::timeout(WAIT, push_task).await.unwrap().unwrap();

    // Waits of 100, 200, 400, 400 ms leave room for five dials at most.
    let dialled = connections.load(Ordering::SeqCst);
    assert!((2..=6).contains(&dialled), "dialled {dialled} times in 1s");
    assert_eq!(*status.borrow_and_update(), ConnectionStatus::Stopped);
}

// ---------------------------------------------------------------------------
// Test: a failed first connect waits the initial delay before retrying
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_first_connect_waits_before_retry() {
    let (url, connections) = spawn_dropping_hub(false).await;
    let (_reconciler, merges) = Reconciler::new(JobRegistry::new());
    let config = ReconnectConfig {
        initial_delay: Duration::from_millis(500),
        max_delay: Duration::from_secs(1),
        ..fast_reconnect()
    };
    let push = PushSource::new(HubClient::new(&url, "/reportHub").unwrap(), config, merges);
    let mut status = push.status();
    let cancel = CancellationToken::new();
    let push_task = tokio::spawn(push.run(cancel.clone()));

    tokio::time::timeout(WAIT, status.wait_for(|s| matches!(s, ConnectionStatus::Reconnecting { .. })))
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(connections.load(Ordering::SeqCst), 1);
    assert_eq!(*status.borrow(), ConnectionStatus::Reconnecting { attempt: 1 });

    cancel.cancel();
    tokio::time::timeout(WAIT, push_task).await.unwrap().unwrap();
}
