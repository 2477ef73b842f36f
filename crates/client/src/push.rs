//! Push-based single-job updates from the report hub.
//!
//! [`PushSource::run`] keeps one hub subscription alive for as long as it
//! is not cancelled: connect, process messages, back off, repeat. Missed
//! updates while disconnected are recovered by the next poll tick.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::HubClient;
use crate::events::ConnectionStatus;
use crate::processor::{process_messages, SessionEnd, KEEP_ALIVE_INTERVAL};
use crate::reconciler::MergeHandle;
use crate::reconnect::{wait_or_cancel, Backoff, ReconnectConfig};

pub struct PushSource {
    client: HubClient,
    reconnect: ReconnectConfig,
    keep_alive: Duration,
    merges: MergeHandle,
    status: watch::Sender<ConnectionStatus>,
}

impl PushSource {
    pub fn new(client: HubClient, reconnect: ReconnectConfig, merges: MergeHandle) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Connecting);
        Self {
            client,
            reconnect,
            keep_alive: KEEP_ALIVE_INTERVAL,
            merges,
            status,
        }
    }

    /// Observe connection status changes.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Core connection loop: connect -> process messages -> back off.
    ///
    /// Runs until the cancellation token is triggered or the reconciler
    /// goes away.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(hub_url = self.client.hub_url(), "Starting push source");
        let mut backoff = Backoff::new(self.reconnect.clone());

        loop {
            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.client.connect() => result,
            };

            match connected {
                Ok(connection) => {
                    self.status.send_replace(ConnectionStatus::Connected);
                    let started = Instant::now();

                    let end =
                        process_messages(connection, &self.merges, self.keep_alive, &cancel).await;
                    let lasted = started.elapsed();
                    let lasted_ms = lasted.as_millis() as u64;
                    match end {
                        SessionEnd::Cancelled | SessionEnd::MergesClosed => break,
                        SessionEnd::Closed { reason } => {
                            tracing::info!(?reason, lasted_ms, "Hub connection closed");
                        }
                        SessionEnd::Failed(error) => {
                            tracing::warn!(error = %error, lasted_ms, "Hub connection lost");
                        }
                    }
                    if backoff.session_ended(lasted) {
                        tracing::debug!("Hub session was stable, backoff reset");
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        attempt = backoff.attempt(),
                        "Hub connection failed",
                    );
                }
            }

            let wait = backoff.next_wait();
            let attempt = backoff.attempt();
            self.status.send_replace(ConnectionStatus::Reconnecting { attempt });
            tracing::info!(
                hub_url = self.client.hub_url(),
                attempt,
                delay_ms = wait.as_millis() as u64,
                "Reconnecting to report hub",
            );

            if !wait_or_cancel(wait, &cancel).await {
                break;
            }
        }

        self.status.send_replace(ConnectionStatus::Stopped);
        tracing::info!("Push source stopped");
    }
}
