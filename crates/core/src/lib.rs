//! Domain model for report-generation jobs.
//!
//! - [`job`]: the [`ReportJob`](job::ReportJob) record and its wire format.
//! - [`status`]: status labels and display classes.
//! - [`validation`]: the create-report request and its date-range check.
//! - [`registry`]: the ordered, observable store that both update sources
//!   merge into.

pub mod error;
pub mod job;
pub mod registry;
pub mod status;
pub mod types;
pub mod validation;

pub use job::{JobStatus, ReportJob, ReportType};
pub use registry::{JobRegistry, MergeOutcome};
