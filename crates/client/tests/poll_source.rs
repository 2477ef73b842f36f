//! Tests for `PollSource` driven by a scripted service.

mod common;

use std::sync::Arc;
use std::time::Duration;

use reportdesk_client::poll::PollSource;
use reportdesk_client::reconciler::Reconciler;
use reportdesk_core::{JobRegistry, JobStatus};
use tokio_util::sync::CancellationToken;

use common::{job, FakeService};

const TICK: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// Test: initial load feeds the registry once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initial_load_replaces_registry() {
    let service = Arc::new(FakeService::new(vec![Ok(vec![
        job(1, JobStatus::Pending),
        job(2, JobStatus::Completed),
    ])]));
    let (reconciler, merges) = Reconciler::new(JobRegistry::new());
    let mut jobs = reconciler.subscribe();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(reconciler.run(cancel.clone()));

    let poll = PollSource::new(service.clone(), TICK, merges);
    assert_eq!(poll.initial_load().await.unwrap(), 2);

    let list = jobs.wait_for(|list| list.len() == 2).await.unwrap().clone();
    assert_eq!(list[0].id.as_str(), "1");
    assert_eq!(list[1].id.as_str(), "2");
    assert_eq!(service.calls(), 1);

    cancel.cancel();
    task.await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: initial load failure is returned and leaves the registry empty
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initial_load_failure_is_returned() {
    let service = Arc::new(FakeService::new(vec![Err(500)]));
    let (reconciler, merges) = Reconciler::new(JobRegistry::new());
    let jobs = reconciler.subscribe();

    let poll = PollSource::new(service, TICK, merges);
    assert!(poll.initial_load().await.is_err());
    assert!(jobs.borrow().is_empty());
}

// ---------------------------------------------------------------------------
// Test: a failed tick does not stop polling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_tick_does_not_stop_polling() {
    let service = Arc::new(FakeService::new(vec![
        Err(500),
        Err(502),
        Ok(vec![job(9, JobStatus::Processing)]),
    ]));
    let (reconciler, merges) = Reconciler::new(JobRegistry::new());
    let mut jobs = reconciler.subscribe();
    let cancel = CancellationToken::new();
    let reconciler_task = tokio::spawn(reconciler.run(cancel.clone()));
    let poll_task = tokio::spawn(PollSource::new(service.clone(), TICK, merges).run(cancel.clone()));

    let list = tokio::time::timeout(Duration::from_secs(5), jobs.wait_for(|list| !list.is_empty()))
        .await
        .expect("poll recovered in time")
        .unwrap()
        .clone();
    assert_eq!(list[0].id.as_str(), "9");
    assert!(service.calls() >= 3);

    cancel.cancel();
    poll_task.await.unwrap();
    reconciler_task.await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: cancellation stops further fetches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_stops_polling() {
    let service = Arc::new(FakeService::new(vec![Ok(vec![job(1, JobStatus::Pending)])]));
    let (reconciler, merges) = Reconciler::new(JobRegistry::new());
    let cancel = CancellationToken::new();
    let reconciler_task = tokio::spawn(reconciler.run(cancel.clone()));
    let poll_task = tokio::spawn(PollSource::new(service.clone(), TICK, merges).run(cancel.clone()));

    tokio::time::sleep(TICK * 3).await;
    cancel.cancel();
    poll_task.await.unwrap();
    reconciler_task.await.unwrap();

    let calls = service.calls();
    tokio::time::sleep(TICK * 3).await;
    assert_eq!(service.calls(), calls);
}
