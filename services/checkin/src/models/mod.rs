//! Check-in service models

pub mod period;
pub mod record;
pub mod user;

// Re-export for convenience
pub use period::{NewSignInException, NewSignPeriod, SignInException, SignPeriod};
pub use record::{CheckInRecord, CheckInSubmission, RecordPreview, UserCheckInCount};
pub use user::{ChangePassword, EditableField, LoginCredentials, NewUser, User};
