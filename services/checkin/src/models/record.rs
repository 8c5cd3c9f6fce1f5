//! Check-in record model and admin views

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Durable evidence that a user submitted required content on a given date
///
/// `user_id` is the username string; records outlive user deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckInRecord {
    pub id: i64,
    pub user_id: String,
    pub date: NaiveDate,
    pub file_path: String,
}

/// A record together with the first characters of its stored content,
/// for the admin per-user listing
#[derive(Debug, Clone, Serialize)]
pub struct RecordPreview {
    pub date: NaiveDate,
    pub file_path: String,
    pub preview: String,
}

/// Check-in submission payload
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInSubmission {
    pub contents: String,
}

/// Per-user check-in count, used by the admin reports
#[derive(Debug, Clone, Serialize)]
pub struct UserCheckInCount {
    pub username: String,
    pub name: String,
    pub department: String,
    pub contact: String,
    pub count: i64,
}
