//! View models for the two screens.
//!
//! Both are plain structs with no terminal dependency so they can be
//! exercised directly in tests. [`render`] turns them into text.

pub mod create_report;
pub mod render;
pub mod report_list;

pub use create_report::{CreateReportForm, SubmitOutcome};
pub use render::JobRow;
pub use report_list::ReportListView;
