//! Plain-text rendering of the job list.

use std::fmt::Write;

use reportdesk_client::ConnectionStatus;
use reportdesk_core::status::{status_class, status_label};
use reportdesk_core::ReportJob;

/// One display row of the job table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub id: String,
    pub report_type: &'static str,
    pub date_range: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub created_at: String,
}

impl From<&ReportJob> for JobRow {
    fn from(job: &ReportJob) -> Self {
        Self {
            id: job.id.to_string(),
            report_type: job.report_type.as_str(),
            date_range: format!("{} .. {}", job.start_date, job.end_date),
            status_label: status_label(job.status),
            status_class: status_class(job.status),
            created_at: job.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Render the list view as a fixed-width table.
pub fn render_table(rows: &[JobRow], connection: ConnectionStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Report jobs ({} total, updates {connection})", rows.len());

    if rows.is_empty() {
        out.push_str("  No report jobs yet. Type `new` to request one.\n");
        return out;
    }

    let id_width = rows.iter().map(|r| r.id.len()).max().unwrap_or(2).max(2);
    let _ = writeln!(
        out,
        "  {:<id_width$}  {:<12}  {:<24}  {:<10}  {}",
        "ID", "TYPE", "RANGE", "STATUS", "CREATED"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<id_width$}  {:<12}  {:<24}  {:<10}  {}",
            row.id, row.report_type, row.date_range, row.status_label, row.created_at
        );
    }
    out
}
