//! Create-report request and its client-side checks.
//!
//! The date-range rule is checked here so a bad range never reaches the
//! network.

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::Serialize;
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::job::ReportType;

/// Message shown when the end date does not come after the start date.
pub const END_DATE_MESSAGE: &str = "End Date must be greater than Start Date.";

/// Body of `POST /reports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_date_range"))]
pub struct CreateReportRequest {
    pub report_type: ReportType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CreateReportRequest {
    /// Build a request from raw form input, rejecting unparseable fields
    /// and an inverted or empty date range.
    pub fn from_form(
        report_type: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Self, CoreError> {
        let request = Self {
            report_type: report_type.parse()?,
            start_date: parse_form_date(start_date, "Start Date")?,
            end_date: parse_form_date(end_date, "End Date")?,
        };
        request.check()?;
        Ok(request)
    }

    /// Run the validation rules, flattening failures into one message.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .into_values()
                .flat_map(|errs| errs.iter())
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| END_DATE_MESSAGE.to_string());
            CoreError::Validation(message)
        })
    }
}

fn validate_date_range(request: &CreateReportRequest) -> Result<(), ValidationError> {
    if request.end_date <= request.start_date {
        let mut error = ValidationError::new("date_range");
        error.message = Some(Cow::Borrowed(END_DATE_MESSAGE));
        return Err(error);
    }
    Ok(())
}

fn parse_form_date(value: &str, field: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!("{field} must be a date in YYYY-MM-DD format."))
    })
}
