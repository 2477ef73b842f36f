//! Live job feed: registry, reconciler, poll source and push source wired
//! together.
//!
//! [`JobFeed::start`] builds every piece explicitly and spawns the
//! reconciler, push, poll and initial-load tasks side by side, so a slow
//! first fetch never holds up the others.
//! [`JobFeed::shutdown`] tears them all down; no merge is applied after it
//! returns.

use std::sync::Arc;
use std::time::Duration;

use reportdesk_core::{JobRegistry, ReportJob};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ReportService;
use crate::client::HubClient;
use crate::events::{ConnectionStatus, LoadState};
use crate::poll::PollSource;
use crate::push::PushSource;
use crate::reconciler::Reconciler;
use crate::reconnect::ReconnectConfig;

/// How long shutdown waits for each task.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for one feed.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub poll_interval: Duration,
    pub reconnect: ReconnectConfig,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            poll_interval: crate::poll::DEFAULT_POLL_INTERVAL,
            reconnect: ReconnectConfig::default(),
        }
    }
}

pub struct JobFeed {
    jobs: watch::Receiver<Vec<ReportJob>>,
    connection: watch::Receiver<ConnectionStatus>,
    load: watch::Receiver<LoadState>,
    cancel: CancellationToken,
    reconciler_task: JoinHandle<JobRegistry>,
    load_task: JoinHandle<()>,
    poll_task: JoinHandle<()>,
    push_task: JoinHandle<()>,
}

impl JobFeed {
    /// Build and start the feed. Returns at once; the initial load, the
    /// hub subscription and the poll schedule all run as tasks. Track the
    /// initial load through [`JobFeed::load_state`].
    ///
    /// `hub` is optional so a feed can run on polling alone. Must be called
    /// from within a tokio runtime.
    pub fn start(
        service: Arc<dyn ReportService>,
        hub: Option<HubClient>,
        settings: FeedSettings,
    ) -> Self {
        let cancel = CancellationToken::new();

        let (reconciler, merges) = Reconciler::new(JobRegistry::new());
        let jobs = reconciler.subscribe();
        let reconciler_task = tokio::spawn(reconciler.run(cancel.child_token()));

        let (connection, push_task) = match hub {
            Some(client) => {
                let push = PushSource::new(client, settings.reconnect, merges.clone());
                let status = push.status();
                (status, tokio::spawn(push.run(cancel.child_token())))
            }
            None => {
                let (_, status) = watch::channel(ConnectionStatus::Stopped);
                (status, tokio::spawn(async {}))
            }
        };

        let poll = PollSource::new(service, settings.poll_interval, merges);
        let (load_tx, load) = watch::channel(LoadState::Loading);
        let load_task =
            tokio::spawn(run_initial_load(poll.clone(), load_tx, cancel.child_token()));
        let poll_task = tokio::spawn(poll.run(cancel.child_token()));

        Self {
            jobs,
            connection,
            load,
            cancel,
            reconciler_task,
            load_task,
            poll_task,
            push_task,
        }
    }

    /// Live ordered job list.
    pub fn jobs(&self) -> watch::Receiver<Vec<ReportJob>> {
        self.jobs.clone()
    }

    /// Live push connection status.
    pub fn connection(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.clone()
    }

    /// Progress of the activation fetch.
    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.load.clone()
    }

    /// Stop polling, release the hub subscription and stop merging.
    pub async fn shutdown(self) {
        tracing::info!("Shutting down job feed");
        self.cancel.cancel();

        let tasks = [
            ("load", self.load_task),
            ("poll", self.poll_task),
            ("push", self.push_task),
        ];
        for (name, handle) in tasks {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!(task = name, "Task did not stop in time");
            }
        }
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, self.reconciler_task).await.is_err() {
            tracing::warn!(task = "reconciler", "Task did not stop in time");
        }

        tracing::info!("Job feed shut down");
    }
}

/// One-off activation fetch. A stalled request is abandoned on cancel.
async fn run_initial_load(
    poll: PollSource,
    state: watch::Sender<LoadState>,
    cancel: CancellationToken,
) {
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = poll.initial_load() => result,
    };
    state.send_replace(match result {
        Ok(count) => LoadState::Loaded { count },
        Err(e) => LoadState::Failed(e.to_string()),
    });
}
