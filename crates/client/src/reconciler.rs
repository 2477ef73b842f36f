//! The single event loop that owns the job registry.
//!
//! Poll and push sources never touch the [`JobRegistry`] directly. They
//! send [`RegistryCommand`]s through a [`MergeHandle`]; the
//! [`Reconciler`] task applies them one at a time in the order they were
//! received, so two merges can never interleave. Once the cancellation
//! token fires the reconciler stops and any queued commands are dropped.

use reportdesk_core::{JobRegistry, MergeOutcome, ReportJob};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Queue depth between the sources and the reconciler.
const COMMAND_CHANNEL_CAPACITY: usize = 256;

/// A merge request from one of the update sources.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Authoritative full snapshot from a list fetch.
    ReplaceAll(Vec<ReportJob>),
    /// A single job change from the push channel.
    ApplyUpdate(ReportJob),
    /// Acknowledged once every earlier command has been applied.
    Flush(oneshot::Sender<()>),
}

/// Cloneable sender side handed to the update sources.
#[derive(Debug, Clone)]
pub struct MergeHandle {
    tx: mpsc::Sender<RegistryCommand>,
}

impl MergeHandle {
    /// Queue a snapshot. Returns `false` if the reconciler has stopped.
    pub async fn replace_all(&self, jobs: Vec<ReportJob>) -> bool {
        self.tx.send(RegistryCommand::ReplaceAll(jobs)).await.is_ok()
    }

    /// Queue a single-job update. Returns `false` if the reconciler has
    /// stopped.
    pub async fn apply_update(&self, job: ReportJob) -> bool {
        self.tx.send(RegistryCommand::ApplyUpdate(job)).await.is_ok()
    }

    /// Wait until every command queued before this call has been applied.
    /// Returns `false` if the reconciler stopped first.
    pub async fn flush(&self) -> bool {
        let (ack, done) = oneshot::channel();
        if self.tx.send(RegistryCommand::Flush(ack)).await.is_err() {
            return false;
        }
        done.await.is_ok()
    }
}

pub struct Reconciler {
    registry: JobRegistry,
    commands: mpsc::Receiver<RegistryCommand>,
}

impl Reconciler {
    /// Wrap a registry and return the handle sources use to feed it.
    pub fn new(registry: JobRegistry) -> (Self, MergeHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        (Self { registry, commands }, MergeHandle { tx })
    }

    /// Observe the registry's ordered job list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ReportJob>> {
        self.registry.subscribe()
    }

    /// Apply commands until cancelled or every [`MergeHandle`] is dropped.
    /// Returns the registry in its final state.
    pub async fn run(mut self, cancel: CancellationToken) -> JobRegistry {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Reconciler cancelled");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => {
                        tracing::debug!("All merge handles dropped, reconciler exiting");
                        break;
                    }
                },
            }
        }
        self.commands.close();
        self.registry
    }

    fn apply(&mut self, command: RegistryCommand) {
        match command {
            RegistryCommand::ReplaceAll(jobs) => {
                let count = jobs.len();
                let changed = self.registry.replace_all(jobs);
                tracing::debug!(count, changed, "Applied job snapshot");
            }
            RegistryCommand::ApplyUpdate(job) => {
                let job_id = job.id.clone();
                match self.registry.apply_update(job) {
                    MergeOutcome::Inserted => {
                        tracing::debug!(job_id = %job_id, "New job from update");
                    }
                    MergeOutcome::Replaced { position } => {
                        tracing::debug!(job_id = %job_id, position, "Job updated in place");
                    }
                    MergeOutcome::Unchanged { .. } => {
                        tracing::trace!(job_id = %job_id, "Duplicate update ignored");
                    }
                }
            }
            RegistryCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
