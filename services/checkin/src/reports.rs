//! CSV attendance reports
//!
//! Rows are streamed through a `csv::Writer` into the response buffer; the
//! per-user counts arrive pre-aggregated from the database, so memory use
//! is one row of output at a time plus the count list itself.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::{AppError, AppResult};
use crate::models::UserCheckInCount;

/// Render the all-users report: one row per user with contact details
/// and total check-in count
pub fn users_csv(counts: &[UserCheckInCount]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["student_id", "name", "department", "contact", "checkin_count"])
        .map_err(csv_failure)?;

    for entry in counts {
        let count = entry.count.to_string();
        writer
            .write_record([
                entry.username.as_str(),
                entry.name.as_str(),
                entry.department.as_str(),
                entry.contact.as_str(),
                count.as_str(),
            ])
            .map_err(csv_failure)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Storage(e.into_error()))
}

/// Render the per-period report: one row per user with the count of
/// records falling inside the period
pub fn period_csv(counts: &[UserCheckInCount]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["student_id", "name", "department", "checkin_count"])
        .map_err(csv_failure)?;

    for entry in counts {
        let count = entry.count.to_string();
        writer
            .write_record([
                entry.username.as_str(),
                entry.name.as_str(),
                entry.department.as_str(),
                count.as_str(),
            ])
            .map_err(csv_failure)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Storage(e.into_error()))
}

/// Wrap CSV bytes in an attachment response
pub fn csv_response(filename: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn csv_failure(e: csv::Error) -> AppError {
    tracing::error!("Failed to render CSV report: {}", e);
    AppError::InternalServerError
}
