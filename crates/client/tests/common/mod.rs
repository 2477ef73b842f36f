//! Shared fixtures for client integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reportdesk_client::{ReportApiError, ReportService};
use reportdesk_core::types::JobId;
use reportdesk_core::validation::CreateReportRequest;
use reportdesk_core::{JobStatus, ReportJob, ReportType};

pub fn job(id: u64, status: JobStatus) -> ReportJob {
    ReportJob {
        id: JobId::from(id),
        report_type: ReportType::Sales,
        start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        status,
        created_at: Utc.with_ymd_and_hms(2024, 6, 11, 8, 0, 0).unwrap(),
    }
}

pub fn job_json(id: u64, status: u8) -> serde_json::Value {
    serde_json::json!({
        "id": id.to_string(),
        "reportType": "Sales",
        "startDate": "2024-06-01T00:00:00",
        "endDate": "2024-06-10T00:00:00",
        "status": status,
        "createdAt": "2024-06-11T08:00:00Z",
    })
}

/// Scripted report service. Each `list_reports` call pops the next
/// scripted response; once the script is exhausted the last response
/// repeats.
pub struct FakeService {
    responses: Mutex<VecDeque<Result<Vec<ReportJob>, u16>>>,
    last: Mutex<Result<Vec<ReportJob>, u16>>,
    pub list_calls: AtomicUsize,
}

impl FakeService {
    pub fn new(responses: Vec<Result<Vec<ReportJob>, u16>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(Ok(Vec::new())),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportService for FakeService {
    async fn list_reports(&self) -> Result<Vec<ReportJob>, ReportApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        let response = match next {
            Some(response) => {
                *self.last.lock().unwrap() = response.clone();
                response
            }
            None => self.last.lock().unwrap().clone(),
        };
        response.map_err(|status| ReportApiError::Api {
            status,
            body: "scripted failure".into(),
        })
    }

    async fn create_report(&self, _request: &CreateReportRequest) -> Result<ReportJob, ReportApiError> {
        Err(ReportApiError::Api {
            status: 501,
            body: "not scripted".into(),
        })
    }
}
