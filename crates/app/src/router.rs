//! The two navigable views and their paths.

use std::fmt;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Live job list (default).
    #[default]
    ReportList,
    /// New-report form.
    CreateReport,
}

impl View {
    pub fn path(self) -> &'static str {
        match self {
            View::ReportList => "reports",
            View::CreateReport => "create-report",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Resolve a path to a view. The empty path redirects to the list.
pub fn resolve(path: &str) -> Result<View, AppError> {
    match path.trim().trim_matches('/') {
        "" | "reports" => Ok(View::ReportList),
        "create-report" => Ok(View::CreateReport),
        other => Err(AppError::UnknownRoute(other.to_string())),
    }
}
