//! Check-in record repository
//!
//! The `(user_id, date)` unique constraint on `check_in_records` is the
//! authoritative duplicate guard; the insert maps a unique violation to
//! `AppError::AlreadyCheckedIn` so a lost race never becomes a server error.

use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::error::{AppError, AppResult, is_unique_violation};
use crate::models::{CheckInRecord, SignPeriod, UserCheckInCount};

/// Repository for check-in records and per-user counts
#[derive(Clone)]
pub struct RecordRepository {
    pool: PgPool,
}

impl RecordRepository {
    /// Create a new record repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the record for one accepted submission
    ///
    /// Two concurrent submissions for the same (user, date) cannot both
    /// succeed: the second insert hits the unique constraint and the caller
    /// rolls back its content file.
    pub async fn insert(
        &self,
        user_id: &str,
        date: NaiveDate,
        file_path: &str,
    ) -> AppResult<CheckInRecord> {
        info!("Recording check-in for {} on {}", user_id, date);

        let result = sqlx::query_as::<_, CheckInRecord>(
            r#"
            INSERT INTO check_in_records (user_id, date, file_path)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, date, file_path
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(file_path)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(record) => Ok(record),
            Err(e) if is_unique_violation(&e) => Err(AppError::AlreadyCheckedIn),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a record exists for (user, date)
    ///
    /// Pre-check for friendlier messages only; the unique constraint is
    /// what actually prevents duplicates.
    pub async fn exists(&self, user_id: &str, date: NaiveDate) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM check_in_records WHERE user_id = $1 AND date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Total check-in count for one user
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM check_in_records WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// All records of one user, newest first
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<CheckInRecord>> {
        let records = sqlx::query_as::<_, CheckInRecord>(
            r#"
            SELECT id, user_id, date, file_path
            FROM check_in_records
            WHERE user_id = $1
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Per-user check-in counts within a period
    ///
    /// LEFT JOIN so that every known user appears exactly once, with count 0
    /// when they have no record in range. Stable order by user id.
    pub async fn counts_by_user_in_period(
        &self,
        period: &SignPeriod,
    ) -> AppResult<Vec<UserCheckInCount>> {
        let rows = sqlx::query(
            r#"
            SELECT u.username, u.name, u.department, u.contact, COUNT(r.id) AS count
            FROM users u
            LEFT JOIN check_in_records r
                ON r.user_id = u.username
                AND r.date >= $1
                AND r.date <= $2
            GROUP BY u.id, u.username, u.name, u.department, u.contact
            ORDER BY u.id
            "#,
        )
        .bind(period.start_date)
        .bind(period.end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(user_count_from_row).collect())
    }

    /// Per-user check-in counts across all dates
    pub async fn counts_for_all_users(&self) -> AppResult<Vec<UserCheckInCount>> {
        let rows = sqlx::query(
            r#"
            SELECT u.username, u.name, u.department, u.contact, COUNT(r.id) AS count
            FROM users u
            LEFT JOIN check_in_records r ON r.user_id = u.username
            GROUP BY u.id, u.username, u.name, u.department, u.contact
            ORDER BY u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(user_count_from_row).collect())
    }

    /// Per-user counts restricted to one page of users, for the admin table
    pub async fn counts_for_users(&self, usernames: &[String]) -> AppResult<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, COUNT(id) AS count
            FROM check_in_records
            WHERE user_id = ANY($1)
            GROUP BY user_id
            "#,
        )
        .bind(usernames)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("user_id"), row.get("count")))
            .collect())
    }
}

fn user_count_from_row(row: sqlx::postgres::PgRow) -> UserCheckInCount {
    UserCheckInCount {
        username: row.get("username"),
        name: row.get("name"),
        department: row.get("department"),
        contact: row.get("contact"),
        count: row.get("count"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{DatabaseConfig, init_pool};

    fn far_future() -> NaiveDate {
        NaiveDate::from_ymd_opt(2099, 1, 1).unwrap()
    }

    /// The unique constraint, not the pre-check, is what stops duplicates:
    /// a second insert for the same (user, date) must surface as
    /// `AlreadyCheckedIn`, never as a plain database error.
    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance with migrations applied"]
    async fn test_duplicate_insert_maps_to_already_checked_in() {
        let pool = init_pool(&DatabaseConfig::from_env().unwrap()).await.unwrap();
        let repo = RecordRepository::new(pool.clone());

        let user_id = "999900010001";
        let date = far_future();

        sqlx::query("DELETE FROM check_in_records WHERE user_id = $1")
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();

        repo.insert(user_id, date, "/tmp/first.txt").await.unwrap();

        let second = repo.insert(user_id, date, "/tmp/second.txt").await;
        assert!(matches!(second, Err(AppError::AlreadyCheckedIn)));

        assert!(repo.exists(user_id, date).await.unwrap());
        assert_eq!(repo.count_by_user(user_id).await.unwrap(), 1);

        sqlx::query("DELETE FROM check_in_records WHERE user_id = $1")
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();
    }

    /// The per-period aggregation is an outer join: a user with no records
    /// in range must still appear, with count 0.
    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance with migrations applied"]
    async fn test_period_counts_include_zero_record_users() {
        let pool = init_pool(&DatabaseConfig::from_env().unwrap()).await.unwrap();
        let repo = RecordRepository::new(pool.clone());

        let username = "999900010002";
        let period = SignPeriod {
            id: 0,
            name: "Far future".to_string(),
            start_date: NaiveDate::from_ymd_opt(2099, 2, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2099, 2, 28).unwrap(),
        };

        sqlx::query("DELETE FROM check_in_records WHERE user_id = $1")
            .bind(username)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            r#"
            INSERT INTO users (username, name, department, contact, password_hash)
            VALUES ($1, 'Zero Records', 'Engineering', '12345', 'x')
            "#,
        )
        .bind(username)
        .execute(&pool)
        .await
        .unwrap();

        let counts = repo.counts_by_user_in_period(&period).await.unwrap();
        let entry = counts
            .iter()
            .find(|c| c.username == username)
            .expect("user without records missing from period counts");
        assert_eq!(entry.count, 0);

        // A record outside the range must not change the period count
        repo.insert(username, NaiveDate::from_ymd_opt(2099, 3, 1).unwrap(), "/tmp/out.txt")
            .await
            .unwrap();
        // One inside the range brings it to 1
        repo.insert(username, NaiveDate::from_ymd_opt(2099, 2, 10).unwrap(), "/tmp/in.txt")
            .await
            .unwrap();

        let counts = repo.counts_by_user_in_period(&period).await.unwrap();
        let entry = counts.iter().find(|c| c.username == username).unwrap();
        assert_eq!(entry.count, 1);

        sqlx::query("DELETE FROM check_in_records WHERE user_id = $1")
            .bind(username)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&pool)
            .await
            .unwrap();
    }
}
