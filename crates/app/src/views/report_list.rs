//! Live job list view.
//!
//! Activating the view builds the job feed (registry, reconciler, poll
//! and push sources) for this view alone; deactivating tears it down.
//! Activation never waits on the network: the view starts in the loading
//! state and renders whatever the feed has so far.

use std::sync::Arc;

use reportdesk_client::client::HubClient;
use reportdesk_client::{ConnectionStatus, FeedSettings, JobFeed, LoadState, ReportService};
use reportdesk_core::ReportJob;
use tokio::sync::watch;

use crate::views::render::{render_table, JobRow};

/// Message shown when the activation fetch failed.
pub const LOAD_FAILED_MESSAGE: &str = "Could not load reports; retrying in the background.";

pub struct ReportListView {
    feed: JobFeed,
    jobs: watch::Receiver<Vec<ReportJob>>,
    connection: watch::Receiver<ConnectionStatus>,
    load: watch::Receiver<LoadState>,
}

impl ReportListView {
    /// Start the feed. The initial load, polling and the push subscription
    /// run in the background.
    pub fn activate(
        service: Arc<dyn ReportService>,
        hub: Option<HubClient>,
        settings: FeedSettings,
    ) -> Self {
        let feed = JobFeed::start(service, hub, settings);
        let jobs = feed.jobs();
        let connection = feed.connection();
        let load = feed.load_state();
        Self {
            feed,
            jobs,
            connection,
            load,
        }
    }

    /// Current ordered job list.
    pub fn jobs(&self) -> Vec<ReportJob> {
        self.jobs.borrow().clone()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        *self.connection.borrow()
    }

    /// True until the activation fetch has completed or failed.
    pub fn is_loading(&self) -> bool {
        self.load.borrow().is_loading()
    }

    /// User-facing notice when the activation fetch failed.
    pub fn load_error(&self) -> Option<&'static str> {
        match *self.load.borrow() {
            LoadState::Failed(_) => Some(LOAD_FAILED_MESSAGE),
            _ => None,
        }
    }

    /// Wait until the activation fetch has completed or failed.
    pub async fn loaded(&mut self) -> LoadState {
        if let Ok(state) = self.load.wait_for(|state| !state.is_loading()).await {
            return state.clone();
        }
        // The feed stopped before the fetch finished.
        self.load.borrow().clone()
    }

    /// Resolves when the job list, the connection status or the load
    /// state changes. Returns `false` once the feed has stopped.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            jobs = self.jobs.changed() => jobs.is_ok(),
            // A feed without a hub has no status sender, and the load
            // sender goes away once the fetch is done; such branches are
            // then disabled.
            Ok(()) = self.connection.changed() => true,
            Ok(()) = self.load.changed() => true,
        }
    }

    pub fn render(&mut self) -> String {
        let rows: Vec<JobRow> = self.jobs.borrow_and_update().iter().map(JobRow::from).collect();
        let connection = *self.connection.borrow_and_update();
        let loading = self.load.borrow_and_update().is_loading();
        let mut text = render_table(&rows, connection);
        if loading {
            text.push_str("  Fetching job list...\n");
        }
        if let Some(message) = self.load_error() {
            text.push_str("  ");
            text.push_str(message);
            text.push('\n');
        }
        text
    }

    /// Stop polling and the push subscription. No merges happen after
    /// this returns.
    pub async fn deactivate(self) {
        self.feed.shutdown().await;
    }
}
