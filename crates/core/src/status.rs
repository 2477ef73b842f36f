//! Display mapping for [`JobStatus`].

use crate::job::JobStatus;

pub const CLASS_PENDING: &str = "status-pending";
pub const CLASS_PROCESSING: &str = "status-processing";
pub const CLASS_COMPLETED: &str = "status-completed";
/// Failed jobs and anything this client does not recognize.
pub const CLASS_FAILED: &str = "status-failed";

pub fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "Pending",
        JobStatus::Processing => "Processing",
        JobStatus::Completed => "Completed",
        JobStatus::Failed => "Failed",
        JobStatus::Unrecognized => "Unknown",
    }
}

/// Display class for a status. Total over every value; unknown statuses
/// fall back to the failed class.
pub fn status_class(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => CLASS_PENDING,
        JobStatus::Processing => CLASS_PROCESSING,
        JobStatus::Completed => CLASS_COMPLETED,
        _ => CLASS_FAILED,
    }
}
