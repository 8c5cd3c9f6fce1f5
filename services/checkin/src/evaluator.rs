//! Attendance eligibility evaluation and submission handling
//!
//! The eligibility rule itself is a pure function over three facts (is a
//! period active, is today a rest day, has the user already checked in) so
//! it can be tested without a database. The surrounding orchestration
//! fetches those facts and, on an accepted submission, stores the content
//! file before inserting the record row.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{CheckInRecord, SignPeriod};
use crate::repositories::{PeriodRepository, RecordRepository};
use crate::storage::ContentStore;
use crate::validation::validate_content;

/// Outcome of an eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// The user may check in today
    Eligible,
    /// Today falls outside every sign period
    NoActivePeriod,
    /// Today is an exception date of the active period
    RestDay,
    /// The user already has a record for today
    AlreadyCheckedIn,
}

impl Eligibility {
    /// The rejection error for an ineligible state, if any
    pub fn as_rejection(self) -> Option<AppError> {
        match self {
            Eligibility::Eligible => None,
            Eligibility::NoActivePeriod => Some(AppError::NoActivePeriod),
            Eligibility::RestDay => Some(AppError::RestDay),
            Eligibility::AlreadyCheckedIn => Some(AppError::AlreadyCheckedIn),
        }
    }
}

/// Eligibility decision
///
/// Checks are ordered: without an active period nothing else matters, a
/// rest day trumps an existing record.
pub fn decide(period_active: bool, rest_day: bool, already_checked_in: bool) -> Eligibility {
    if !period_active {
        Eligibility::NoActivePeriod
    } else if rest_day {
        Eligibility::RestDay
    } else if already_checked_in {
        Eligibility::AlreadyCheckedIn
    } else {
        Eligibility::Eligible
    }
}

/// An eligibility result together with the period it was judged against
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub eligibility: Eligibility,
    pub period: Option<SignPeriod>,
}

/// Evaluates check-in eligibility and performs accepted submissions
#[derive(Clone)]
pub struct AttendanceEvaluator {
    periods: PeriodRepository,
    records: RecordRepository,
    store: ContentStore,
}

impl AttendanceEvaluator {
    /// Create a new evaluator
    pub fn new(
        periods: PeriodRepository,
        records: RecordRepository,
        store: ContentStore,
    ) -> Self {
        Self {
            periods,
            records,
            store,
        }
    }

    /// Determine whether `username` may check in on `today`
    pub async fn evaluate(&self, today: NaiveDate, username: &str) -> AppResult<Evaluation> {
        let period = self.periods.find_active(today).await?;

        let rest_day = match &period {
            Some(p) => self.periods.is_exception(p.id, today).await?,
            None => false,
        };

        let already = self.records.exists(username, today).await?;

        Ok(Evaluation {
            eligibility: decide(period.is_some(), rest_day, already),
            period,
        })
    }

    /// Validate and persist one check-in submission
    ///
    /// The content file is written first, then the record row is inserted.
    /// If the insert fails for any reason (including a concurrent duplicate
    /// slipping past the pre-check) the file is removed again, so no record
    /// exists without content and no content lingers without a record.
    pub async fn submit(
        &self,
        today: NaiveDate,
        username: &str,
        content: &str,
    ) -> AppResult<CheckInRecord> {
        validate_content(content).map_err(AppError::Validation)?;

        let evaluation = self.evaluate(today, username).await?;
        if let Some(rejection) = evaluation.eligibility.as_rejection() {
            return Err(rejection);
        }

        let content = content.trim();
        let path = self.store.write(username, today, content).await?;
        let path_str = path.to_string_lossy().into_owned();

        match self.records.insert(username, today, &path_str).await {
            Ok(record) => {
                info!("Check-in accepted for {} on {}", username, today);
                Ok(record)
            }
            Err(e) => {
                if discard_content_on(&e) {
                    if let Err(cleanup) = self.store.remove(&path).await {
                        warn!(
                            "Failed to remove content file after rejected insert {}: {}",
                            path.display(),
                            cleanup
                        );
                    }
                }
                Err(e)
            }
        }
    }
}

/// Whether a failed record insert should remove the content file
///
/// On a duplicate, a concurrent submission already committed a record for
/// this (user, date) and the slot file belongs to it; deleting it would
/// leave that record without stored content. Any other failure means no
/// record exists, so the file must go.
fn discard_content_on(err: &AppError) -> bool {
    !matches!(err, AppError::AlreadyCheckedIn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn april() -> SignPeriod {
        SignPeriod {
            id: 1,
            name: "First stage".to_string(),
            start_date: date(2025, 4, 1),
            end_date: date(2025, 4, 30),
        }
    }

    #[test]
    fn test_no_active_period_wins() {
        assert_eq!(decide(false, false, false), Eligibility::NoActivePeriod);
        // Without a period, rest-day and duplicate state are irrelevant
        assert_eq!(decide(false, true, true), Eligibility::NoActivePeriod);
    }

    #[test]
    fn test_rest_day_trumps_existing_record() {
        assert_eq!(decide(true, true, false), Eligibility::RestDay);
        assert_eq!(decide(true, true, true), Eligibility::RestDay);
    }

    #[test]
    fn test_already_checked_in() {
        assert_eq!(decide(true, false, true), Eligibility::AlreadyCheckedIn);
    }

    #[test]
    fn test_eligible() {
        assert_eq!(decide(true, false, false), Eligibility::Eligible);
    }

    #[test]
    fn test_april_scenario() {
        // Period 2025-04-01..2025-04-30 with exception 2025-04-05: the 5th
        // is a rest day even though in range, the 6th is a normal day.
        let period = april();
        let exception = date(2025, 4, 5);

        let on_fifth = period.contains(date(2025, 4, 5));
        assert!(on_fifth);
        assert_eq!(
            decide(on_fifth, exception == date(2025, 4, 5), false),
            Eligibility::RestDay
        );

        let on_sixth = period.contains(date(2025, 4, 6));
        assert_eq!(
            decide(on_sixth, exception == date(2025, 4, 6), false),
            Eligibility::Eligible
        );
    }

    #[test]
    fn test_dates_outside_every_period() {
        let period = april();
        for d in [date(2025, 3, 31), date(2025, 5, 1), date(2024, 4, 15)] {
            assert_eq!(
                decide(period.contains(d), false, false),
                Eligibility::NoActivePeriod
            );
        }
    }

    #[test]
    fn test_duplicate_insert_keeps_content_file() {
        assert!(!discard_content_on(&AppError::AlreadyCheckedIn));
    }

    #[test]
    fn test_other_insert_failures_discard_content_file() {
        assert!(discard_content_on(&AppError::Database(
            sqlx::Error::PoolClosed
        )));
        assert!(discard_content_on(&AppError::InternalServerError));
    }

    /// Two racing submissions share one slot path; when the second insert
    /// loses to the unique constraint, its rollback must leave the slot
    /// file in place for the committed record.
    #[tokio::test]
    async fn test_losing_submission_does_not_delete_winner_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::storage::ContentStore::new(dir.path());
        let d = date(2025, 4, 6);

        let winner_path = store.write("202500010001", d, "winner content").await.unwrap();
        let loser_path = store.write("202500010001", d, "loser content").await.unwrap();
        assert_eq!(winner_path, loser_path);

        // The loser's insert comes back AlreadyCheckedIn; the slot file
        // stays, so the winner's record still has stored content.
        if discard_content_on(&AppError::AlreadyCheckedIn) {
            store.remove(&loser_path).await.unwrap();
        }

        assert!(winner_path.exists());
    }

    #[test]
    fn test_rejection_mapping() {
        assert!(Eligibility::Eligible.as_rejection().is_none());
        assert!(matches!(
            Eligibility::NoActivePeriod.as_rejection(),
            Some(AppError::NoActivePeriod)
        ));
        assert!(matches!(
            Eligibility::RestDay.as_rejection(),
            Some(AppError::RestDay)
        ));
        assert!(matches!(
            Eligibility::AlreadyCheckedIn.as_rejection(),
            Some(AppError::AlreadyCheckedIn)
        ));
    }
}
