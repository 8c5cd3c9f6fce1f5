//! Sign period and exception date models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An admin-defined inclusive date range during which check-ins are expected
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SignPeriod {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SignPeriod {
    /// Whether `date` falls inside this period (inclusive on both ends)
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Payload for creating a sign period
#[derive(Debug, Clone, Deserialize)]
pub struct NewSignPeriod {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A date within a period exempted from the check-in requirement
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SignInException {
    pub id: i64,
    pub period_id: i64,
    pub exception_date: NaiveDate,
}

/// Payload for adding an exception date to a period
#[derive(Debug, Clone, Deserialize)]
pub struct NewSignInException {
    pub exception_date: NaiveDate,
}
