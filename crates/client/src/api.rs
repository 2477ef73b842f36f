//! REST API client for the report service.
//!
//! Wraps `POST /reports` and `GET /reports` using [`reqwest`]. The
//! [`ReportService`] trait is the seam the poll source and the create
//! form depend on, so both can run against a fake in tests.

use async_trait::async_trait;
use reportdesk_core::validation::CreateReportRequest;
use reportdesk_core::ReportJob;

/// Remote operations the client needs from the report service.
#[async_trait]
pub trait ReportService: Send + Sync {
    /// Fetch every known job, in the order the service returns them.
    async fn list_reports(&self) -> Result<Vec<ReportJob>, ReportApiError>;

    /// Submit a new report job and return it as created.
    async fn create_report(
        &self,
        request: &CreateReportRequest,
    ) -> Result<ReportJob, ReportApiError>;
}

/// HTTP client for one report service.
pub struct ReportApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the report REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ReportApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Report API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl ReportApi {
    /// Create a client for the service at `api_url`, e.g.
    /// `https://localhost:7232`. A trailing slash is ignored.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    fn reports_url(&self) -> String {
        format!("{}/reports", self.api_url)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ReportApiError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ReportApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ReportApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ReportApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ReportService for ReportApi {
    /// Sends `GET /reports`.
    async fn list_reports(&self) -> Result<Vec<ReportJob>, ReportApiError> {
        let response = self.client.get(self.reports_url()).send().await?;
        Self::parse_response(response).await
    }

    /// Sends `POST /reports` with the request as a camelCase JSON body.
    async fn create_report(
        &self,
        request: &CreateReportRequest,
    ) -> Result<ReportJob, ReportApiError> {
        let response = self
            .client
            .post(self.reports_url())
            .json(request)
            .send()
            .await?;

        let job: ReportJob = Self::parse_response(response).await?;
        tracing::info!(
            job_id = %job.id,
            report_type = %job.report_type,
            "Report job created",
        );
        Ok(job)
    }
}
