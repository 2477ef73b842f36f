//! Ordered, observable store of known report jobs.
//!
//! [`JobRegistry`] is the single source of truth for the job list. Two
//! producers feed it: full snapshots via [`JobRegistry::replace_all`] and
//! single-job updates via [`JobRegistry::apply_update`]. Both are
//! synchronous and idempotent. Observers get the current ordered list
//! through a [`watch`] channel from [`JobRegistry::subscribe`].
//!
//! Snapshots are authoritative: a snapshot that lags behind a pushed update
//! will move that job's status back until the next update arrives. That
//! reversion is logged, not suppressed.

use std::collections::HashSet;

use tokio::sync::watch;

use crate::job::ReportJob;
use crate::types::JobId;

/// What [`JobRegistry::apply_update`] did with a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The id was new and the job now sits at the front.
    Inserted,
    /// The id existed and its entry was replaced in place.
    Replaced { position: usize },
    /// The id existed with an identical value; nothing changed.
    Unchanged { position: usize },
}

pub struct JobRegistry {
    jobs: Vec<ReportJob>,
    observers: watch::Sender<Vec<ReportJob>>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        let (observers, _) = watch::channel(Vec::new());
        Self {
            jobs: Vec::new(),
            observers,
        }
    }

    /// Current ordered job list, newest-first for pushed jobs.
    pub fn jobs(&self) -> &[ReportJob] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn position(&self, id: &JobId) -> Option<usize> {
        self.jobs.iter().position(|j| &j.id == id)
    }

    pub fn get(&self, id: &JobId) -> Option<&ReportJob> {
        self.jobs.iter().find(|j| &j.id == id)
    }

    /// Register an observer. The receiver always holds the latest list and
    /// is marked changed after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ReportJob>> {
        self.observers.subscribe()
    }

    /// Replace the whole contents with a snapshot, keeping its order.
    ///
    /// Duplicate ids inside the snapshot keep their first occurrence.
    /// Returns `true` when the visible list changed.
    pub fn replace_all(&mut self, jobs: Vec<ReportJob>) -> bool {
        let mut seen = HashSet::with_capacity(jobs.len());
        let mut next = Vec::with_capacity(jobs.len());

        for job in jobs {
            if !seen.insert(job.id.clone()) {
                tracing::warn!(
                    job_id = %job.id,
                    "Snapshot contains duplicate job id, keeping first",
                );
                continue;
            }
            if let Some(previous) = self.get(&job.id) {
                if previous.status.regresses_to(job.status) {
                    tracing::debug!(
                        job_id = %job.id,
                        from = ?previous.status,
                        to = ?job.status,
                        "Snapshot moved job status backward",
                    );
                }
            }
            next.push(job);
        }

        if next == self.jobs {
            return false;
        }
        self.jobs = next;
        self.notify();
        true
    }

    /// Merge one job: replace in place if known, otherwise prepend.
    /// Never removes entries.
    pub fn apply_update(&mut self, job: ReportJob) -> MergeOutcome {
        match self.position(&job.id) {
            Some(position) if self.jobs[position] == job => MergeOutcome::Unchanged { position },
            Some(position) => {
                let previous = std::mem::replace(&mut self.jobs[position], job);
                if previous.status.regresses_to(self.jobs[position].status) {
                    tracing::debug!(
                        job_id = %previous.id,
                        from = ?previous.status,
                        to = ?self.jobs[position].status,
                        "Update moved job status backward",
                    );
                }
                self.notify();
                MergeOutcome::Replaced { position }
            }
            None => {
                self.jobs.insert(0, job);
                self.notify();
                MergeOutcome::Inserted
            }
        }
    }

    fn notify(&self) {
        // send_replace stores the value even when nobody is subscribed.
        self.observers.send_replace(self.jobs.clone());
    }
}
