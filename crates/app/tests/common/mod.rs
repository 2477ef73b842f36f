//! Shared fixtures for app integration tests.

use std::sync::Arc;
use std::time::Duration;

use reportdesk_client::{FeedSettings, ReportApi, ReportService};
use wiremock::MockServer;

pub fn job_json(id: u64, status: u8) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "reportType": "Sales",
        "startDate": "2024-06-01T00:00:00",
        "endDate": "2024-06-10T00:00:00",
        "status": status,
        "createdAt": "2024-06-11T08:00:00Z",
    })
}

pub fn service(server: &MockServer) -> Arc<dyn ReportService> {
    Arc::new(ReportApi::new(server.uri()))
}

/// Feed settings with a short poll period so tests observe ticks quickly.
pub fn fast_settings() -> FeedSettings {
    FeedSettings {
        poll_interval: Duration::from_millis(50),
        ..FeedSettings::default()
    }
}
