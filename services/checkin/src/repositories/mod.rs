//! Repositories for database operations

pub mod period;
pub mod record;
pub mod user;

pub use period::PeriodRepository;
pub use record::RecordRepository;
pub use user::UserRepository;
