//! New-report form.
//!
//! Holds raw field input, validates the date range locally and only then
//! calls the report service.

use reportdesk_client::ReportService;
use reportdesk_core::error::CoreError;
use reportdesk_core::validation::CreateReportRequest;
use reportdesk_core::{ReportJob, ReportType};

use crate::router::View;

/// Message shown when the service rejects or fails the submission.
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit report request.";

/// Result of [`CreateReportForm::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A required field is empty; nothing happened.
    Incomplete,
    /// Local validation failed; no remote call was made.
    Invalid,
    /// The service call failed.
    Failed,
    /// The job was created; navigate to `next`.
    Created { job: ReportJob, next: View },
}

#[derive(Debug, Clone, Default)]
pub struct CreateReportForm {
    pub report_type: String,
    pub start_date: String,
    pub end_date: String,
    is_loading: bool,
    error_message: Option<String>,
}

impl CreateReportForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report types offered by the form.
    pub fn report_types() -> &'static [ReportType] {
        &ReportType::ALL
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn is_complete(&self) -> bool {
        [&self.report_type, &self.start_date, &self.end_date]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    /// Validate and submit.
    pub async fn submit(&mut self, service: &dyn ReportService) -> SubmitOutcome {
        self.error_message = None;
        if !self.is_complete() {
            return SubmitOutcome::Incomplete;
        }

        let request = match CreateReportRequest::from_form(
            &self.report_type,
            &self.start_date,
            &self.end_date,
        ) {
            Ok(request) => request,
            Err(CoreError::Validation(message)) => {
                tracing::debug!(message = %message, "Report request rejected locally");
                self.error_message = Some(message);
                return SubmitOutcome::Invalid;
            }
        };

        self.is_loading = true;
        let result = service.create_report(&request).await;
        self.is_loading = false;

        match result {
            Ok(job) => {
                tracing::info!(job_id = %job.id, "Report request submitted");
                SubmitOutcome::Created {
                    job,
                    next: View::ReportList,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Error creating report");
                self.error_message = Some(SUBMIT_FAILED_MESSAGE.to_string());
                SubmitOutcome::Failed
            }
        }
    }

    /// Leave the form without side effects.
    pub fn cancel(&self) -> View {
        View::ReportList
    }

    pub fn render(&self) -> String {
        let types: Vec<&str> = Self::report_types().iter().map(|t| t.as_str()).collect();
        let mut out = format!(
            "New report request\n  type:  {}\n  start: {}\n  end:   {}\n  (types: {})\n",
            display(&self.report_type),
            display(&self.start_date),
            display(&self.end_date),
            types.join(", "),
        );
        if let Some(message) = &self.error_message {
            out.push_str("  error: ");
            out.push_str(message);
            out.push('\n');
        }
        out
    }
}

fn display(field: &str) -> &str {
    if field.trim().is_empty() {
        "<unset>"
    } else {
        field
    }
}
