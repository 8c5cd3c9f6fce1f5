//! Sign period and exception date repository

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, AppResult, is_unique_violation};
use crate::models::{NewSignPeriod, SignInException, SignPeriod};

/// Repository for sign periods and their exception dates
#[derive(Clone)]
pub struct PeriodRepository {
    pool: PgPool,
}

impl PeriodRepository {
    /// Create a new period repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a sign period
    ///
    /// Overlapping periods are allowed; `find_active` defines the tie-break.
    pub async fn create(&self, new_period: &NewSignPeriod) -> AppResult<SignPeriod> {
        info!(
            "Creating sign period {} ({} .. {})",
            new_period.name, new_period.start_date, new_period.end_date
        );

        let period = sqlx::query_as::<_, SignPeriod>(
            r#"
            INSERT INTO sign_periods (name, start_date, end_date)
            VALUES ($1, $2, $3)
            RETURNING id, name, start_date, end_date
            "#,
        )
        .bind(&new_period.name)
        .bind(new_period.start_date)
        .bind(new_period.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(period)
    }

    /// List all sign periods, most recent first
    pub async fn list(&self) -> AppResult<Vec<SignPeriod>> {
        let periods = sqlx::query_as::<_, SignPeriod>(
            r#"
            SELECT id, name, start_date, end_date
            FROM sign_periods
            ORDER BY start_date DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    /// Find a sign period by ID
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<SignPeriod>> {
        let period = sqlx::query_as::<_, SignPeriod>(
            r#"
            SELECT id, name, start_date, end_date
            FROM sign_periods
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }

    /// Find the sign period active on `date`, if any
    ///
    /// When periods overlap, the one with the earliest start date (then
    /// lowest id) wins, so "first match" is deterministic across requests.
    pub async fn find_active(&self, date: NaiveDate) -> AppResult<Option<SignPeriod>> {
        let period = sqlx::query_as::<_, SignPeriod>(
            r#"
            SELECT id, name, start_date, end_date
            FROM sign_periods
            WHERE start_date <= $1 AND end_date >= $1
            ORDER BY start_date, id
            LIMIT 1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }

    /// Add an exception (rest) date to a period
    pub async fn add_exception(
        &self,
        period_id: i64,
        exception_date: NaiveDate,
    ) -> AppResult<SignInException> {
        info!(
            "Adding exception date {} to period {}",
            exception_date, period_id
        );

        let result = sqlx::query_as::<_, SignInException>(
            r#"
            INSERT INTO sign_in_exceptions (period_id, exception_date)
            VALUES ($1, $2)
            RETURNING id, period_id, exception_date
            "#,
        )
        .bind(period_id)
        .bind(exception_date)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(exception) => Ok(exception),
            Err(e) if is_unique_violation(&e) => Err(AppError::Validation(
                "That date is already a rest day for this period".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// List the exception dates of a period
    pub async fn list_exceptions(&self, period_id: i64) -> AppResult<Vec<SignInException>> {
        let exceptions = sqlx::query_as::<_, SignInException>(
            r#"
            SELECT id, period_id, exception_date
            FROM sign_in_exceptions
            WHERE period_id = $1
            ORDER BY exception_date
            "#,
        )
        .bind(period_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(exceptions)
    }

    /// Whether `date` is registered as an exception for `period_id`
    pub async fn is_exception(&self, period_id: i64, date: NaiveDate) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM sign_in_exceptions
            WHERE period_id = $1 AND exception_date = $2
            "#,
        )
        .bind(period_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}
