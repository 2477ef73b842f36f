//! The report job record as exchanged with the report service.
//!
//! The service is lenient about its encodings (numeric or named status,
//! date-only or date-time ranges), so decoding here accepts every shape
//! the service has been seen to send and normalizes it.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

/// One report-generation request and its current lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportJob {
    pub id: JobId,
    pub report_type: ReportType,
    #[serde(deserialize_with = "wire::date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "wire::date")]
    pub end_date: NaiveDate,
    pub status: JobStatus,
    #[serde(deserialize_with = "wire::timestamp")]
    pub created_at: Timestamp,
}

impl ReportJob {
    /// Copy of this job with a different status.
    pub fn with_status(&self, status: JobStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// ReportType
// ---------------------------------------------------------------------------

/// The fixed set of reports the service can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
    Sales,
    UserActivity,
    Inventory,
    AuditLog,
}

impl ReportType {
    /// Every report type, in the order offered to the user.
    pub const ALL: [ReportType; 4] = [
        ReportType::Sales,
        ReportType::UserActivity,
        ReportType::Inventory,
        ReportType::AuditLog,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Sales => "Sales",
            ReportType::UserActivity => "UserActivity",
            ReportType::Inventory => "Inventory",
            ReportType::AuditLog => "AuditLog",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = CoreError;

    /// Case-insensitive match against the type names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::Validation(format!("Unknown report type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a job.
///
/// The service only ever moves a job forward
/// (`Pending -> Processing -> Completed | Failed`). `Unrecognized` covers any
/// value this client does not know so one odd record cannot poison a whole
/// list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Unrecognized,
}

impl JobStatus {
    /// Position in the forward-only lifecycle. Terminal states share a rank.
    pub fn rank(self) -> Option<u8> {
        match self {
            JobStatus::Pending => Some(0),
            JobStatus::Processing => Some(1),
            JobStatus::Completed | JobStatus::Failed => Some(2),
            JobStatus::Unrecognized => None,
        }
    }

    /// True when moving from `self` to `next` goes backward in the lifecycle.
    pub fn regresses_to(self, next: JobStatus) -> bool {
        match (self.rank(), next.rank()) {
            (Some(current), Some(next)) => next < current,
            _ => false,
        }
    }

    fn from_ordinal(n: i64) -> Self {
        match n {
            0 => JobStatus::Pending,
            1 => JobStatus::Processing,
            2 => JobStatus::Completed,
            3 => JobStatus::Failed,
            _ => JobStatus::Unrecognized,
        }
    }

    fn from_name(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            other => match other.parse::<i64>() {
                Ok(n) => Self::from_ordinal(n),
                Err(_) => JobStatus::Unrecognized,
            },
        }
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(crate::status::status_label(*self))
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawStatus {
            Ordinal(i64),
            Name(String),
            Other(serde_json::Value),
        }

        Ok(match RawStatus::deserialize(deserializer)? {
            RawStatus::Ordinal(n) => JobStatus::from_ordinal(n),
            RawStatus::Name(s) => JobStatus::from_name(&s),
            RawStatus::Other(value) => {
                tracing::debug!(%value, "Unrecognized job status value");
                JobStatus::Unrecognized
            }
        })
    }
}

// ---- wire helpers ----

mod wire {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    /// Accepts `YYYY-MM-DD` or any date-time whose first ten characters are
    /// the date.
    pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let date_part = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|e| de::Error::custom(format!("invalid date '{raw}': {e}")))
    }

    /// Accepts RFC 3339, or a naive date-time taken to be UTC.
    pub fn timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
    }
}
