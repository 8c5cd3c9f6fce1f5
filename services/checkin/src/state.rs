//! Application state shared across handlers

use sqlx::PgPool;

use crate::evaluator::AttendanceEvaluator;
use crate::jwt::JwtService;
use crate::repositories::{PeriodRepository, RecordRepository, UserRepository};
use crate::storage::ContentStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub period_repository: PeriodRepository,
    pub record_repository: RecordRepository,
    pub content_store: ContentStore,
    pub evaluator: AttendanceEvaluator,
}
