//! Periodic full-list refresh.
//!
//! [`PollSource::initial_load`] performs the one-off fetch at activation;
//! [`PollSource::run`] then refreshes every interval. Every successful
//! fetch is an authoritative snapshot for the registry. A failed tick is
//! logged and the schedule carries on.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::{ReportApiError, ReportService};
use crate::reconciler::MergeHandle;

/// Default refresh period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct PollSource {
    service: Arc<dyn ReportService>,
    interval: Duration,
    merges: MergeHandle,
}

impl PollSource {
    pub fn new(service: Arc<dyn ReportService>, interval: Duration, merges: MergeHandle) -> Self {
        Self {
            service,
            interval,
            merges,
        }
    }

    /// Fetch once and hand the snapshot to the registry. Returns the
    /// number of jobs fetched once the registry holds them.
    pub async fn initial_load(&self) -> Result<usize, ReportApiError> {
        let jobs = self.service.list_reports().await.map_err(|e| {
            tracing::error!(error = %e, "Initial job list fetch failed");
            e
        })?;
        let count = jobs.len();
        self.merges.replace_all(jobs).await;
        // Readers of the load result expect the snapshot to be applied.
        self.merges.flush().await;
        tracing::info!(count, "Initial job list loaded");
        Ok(count)
    }

    /// Refresh on a fixed period until cancelled. The first tick fires one
    /// full interval after the call.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.service.list_reports() => result,
            };

            match result {
                Ok(jobs) => {
                    tracing::debug!(count = jobs.len(), "Poll tick fetched job list");
                    if !self.merges.replace_all(jobs).await {
                        tracing::debug!("Reconciler gone, stopping poll");
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Poll tick failed, will retry next tick");
                }
            }
        }

        tracing::debug!("Poll source stopped");
    }
}
