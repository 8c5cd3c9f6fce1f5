//! Check-in service routes

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path as FsPath;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    evaluator::{Eligibility, Evaluation},
    middleware::{AuthUser, admin_middleware, auth_middleware},
    models::{
        ChangePassword, CheckInSubmission, EditableField, LoginCredentials, NewSignInException,
        NewSignPeriod, NewUser, RecordPreview, SignPeriod, User, UserCheckInCount,
    },
    reports,
    state::AppState,
    validation,
};

/// Page size for admin listings
const PER_PAGE: i64 = 20;

/// Characters of stored content shown in admin record previews
const PREVIEW_CHARS: usize = 100;

/// Query parameters for paginated admin listings with CSV export
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub export: Option<String>,
}

impl ListQuery {
    fn wants_csv(&self) -> bool {
        self.export.as_deref() == Some("csv")
    }

    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Response for a successful login
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Response for the check-in status page
#[derive(Serialize)]
pub struct CheckInStatus {
    pub eligibility: Eligibility,
    pub message: String,
    pub period: Option<SignPeriod>,
    pub total_checkins: i64,
}

/// Payload for editing one user field
#[derive(Debug, Deserialize)]
pub struct EditFieldPayload {
    pub value: String,
}

/// One row of the paginated admin user table
#[derive(Serialize)]
pub struct UserRow {
    #[serde(flatten)]
    pub user: User,
    pub checkin_count: i64,
}

/// Create the router for the check-in service
pub fn create_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/CheckIn", get(checkin_status).post(submit_checkin))
        .route("/logout", get(logout).post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/delete/:id", post(delete_user))
        .route("/admin/users/edit/:id/:field", post(edit_user_field))
        .route("/admin/change_password", post(change_password))
        .route("/admin/user/:username/records", get(user_records))
        .route("/admin/sign_periods", get(list_sign_periods))
        .route("/admin/sign_periods/add", post(add_sign_period))
        .route(
            "/admin/sign_periods/:id/exceptions",
            get(list_exceptions).post(add_exception),
        )
        .route("/admin/records_by_period/:id", get(records_by_period))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state)
}

/// Today's date in server-local time; all eligibility checks share it
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "checkin-service"
    }))
}

/// Describe the registration payload
///
/// The GET half of the route pair; the HTML form lives with the external
/// web layer, so clients get the expected field list instead.
pub async fn register_form() -> impl IntoResponse {
    Json(json!({
        "message": "POST a JSON body to register",
        "fields": ["username", "password", "name", "department", "contact"],
    }))
}

/// Describe the login payload
pub async fn login_form() -> impl IntoResponse {
    Json(json!({
        "message": "POST a JSON body to log in",
        "fields": ["username", "password"],
    }))
}

/// Register a new student account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> AppResult<impl IntoResponse> {
    validation::validate_username(&payload.username).map_err(AppError::Validation)?;
    validation::validate_password(&payload.password).map_err(AppError::Validation)?;
    validation::validate_required(&payload.name, "Name").map_err(AppError::Validation)?;
    validation::validate_required(&payload.department, "Department")
        .map_err(AppError::Validation)?;
    validation::validate_required(&payload.contact, "Contact").map_err(AppError::Validation)?;

    let user = state.user_repository.create(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful, please log in",
            "user": user,
        })),
    ))
}

/// Log in and receive an access token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> AppResult<impl IntoResponse> {
    info!("Login attempt for user: {}", payload.username);

    let user = state
        .user_repository
        .find_by_username(&payload.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !state.user_repository.verify_password(&user, &payload.password) {
        return Err(AppError::Unauthorized);
    }

    let access_token = state.jwt_service.generate_access_token(&user).map_err(|e| {
        tracing::error!("Failed to generate access token: {}", e);
        AppError::InternalServerError
    })?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    }))
}

/// Log out
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout(Extension(user): Extension<AuthUser>) -> AppResult<impl IntoResponse> {
    info!("Logout for user {}", user.username);

    Ok(Json(json!({"message": "Logged out"})))
}

/// Current check-in eligibility plus the caller's total count
pub async fn checkin_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let Evaluation {
        eligibility,
        period,
    } = state.evaluator.evaluate(today(), &user.username).await?;

    let total_checkins = state
        .record_repository
        .count_by_user(&user.username)
        .await?;

    let message = match eligibility {
        Eligibility::Eligible => "You can check in today".to_string(),
        Eligibility::NoActivePeriod => "No active sign period today".to_string(),
        Eligibility::RestDay => "Today is a rest day, no check-in required".to_string(),
        Eligibility::AlreadyCheckedIn => "Already checked in today".to_string(),
    };

    Ok(Json(CheckInStatus {
        eligibility,
        message,
        period,
        total_checkins,
    }))
}

/// Submit today's check-in content
pub async fn submit_checkin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CheckInSubmission>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .evaluator
        .submit(today(), &user.username, &payload.contents)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Checked in successfully",
            "record": record,
        })),
    ))
}

/// Admin: list users with check-in counts, or export everyone as CSV
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<axum::response::Response> {
    if query.wants_csv() {
        let counts = state.record_repository.counts_for_all_users().await?;
        let body = reports::users_csv(&counts)?;
        return Ok(reports::csv_response("users.csv", body));
    }

    let page = query.page();
    let users = state.user_repository.list_paginated(page, PER_PAGE).await?;
    let total = state.user_repository.count_all().await?;

    let usernames: Vec<String> = users.iter().map(|u| u.username.clone()).collect();
    let counts = state.record_repository.counts_for_users(&usernames).await?;

    let rows: Vec<UserRow> = users
        .into_iter()
        .map(|user| {
            let checkin_count = counts
                .iter()
                .find(|(username, _)| *username == user.username)
                .map(|(_, count)| *count)
                .unwrap_or(0);
            UserRow {
                user,
                checkin_count,
            }
        })
        .collect();

    Ok(Json(json!({
        "users": rows,
        "page": page,
        "per_page": PER_PAGE,
        "total": total,
    }))
    .into_response())
}

/// Admin: delete a user
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if !state.user_repository.delete(id).await? {
        return Err(AppError::NotFound);
    }

    Ok(Json(json!({"message": "User deleted"})))
}

/// Admin: edit one enumerated user field
///
/// The field name is part of the path; anything outside the editable set
/// is a 404.
pub async fn edit_user_field(
    State(state): State<AppState>,
    Path((id, field)): Path<(i64, String)>,
    Json(payload): Json<EditFieldPayload>,
) -> AppResult<impl IntoResponse> {
    let field: EditableField = field.parse().map_err(|_| AppError::NotFound)?;
    validation::validate_required(&payload.value, "Value").map_err(AppError::Validation)?;

    if !state
        .user_repository
        .update_field(id, field, &payload.value)
        .await?
    {
        return Err(AppError::NotFound);
    }

    Ok(Json(json!({"message": "User updated"})))
}

/// Admin: set a new password for any user
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePassword>,
) -> AppResult<impl IntoResponse> {
    validation::validate_password(&payload.new_password).map_err(AppError::Validation)?;

    if !state
        .user_repository
        .set_password(&payload.username, &payload.new_password)
        .await?
    {
        return Err(AppError::NotFound);
    }

    Ok(Json(json!({"message": "Password changed"})))
}

/// Admin: one user's check-in history with content previews
pub async fn user_records(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;

    let records = state.record_repository.list_by_user(&username).await?;

    let mut previews = Vec::with_capacity(records.len());
    for record in &records {
        let preview = state
            .content_store
            .preview(FsPath::new(&record.file_path), PREVIEW_CHARS)
            .await;
        previews.push(RecordPreview {
            date: record.date,
            file_path: record.file_path.clone(),
            preview,
        });
    }

    Ok(Json(json!({
        "user": user,
        "records": previews,
        "total": previews.len(),
    })))
}

/// Admin: list all sign periods
pub async fn list_sign_periods(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let periods = state.period_repository.list().await?;

    Ok(Json(periods))
}

/// Admin: create a sign period
pub async fn add_sign_period(
    State(state): State<AppState>,
    Json(payload): Json<NewSignPeriod>,
) -> AppResult<impl IntoResponse> {
    validation::validate_required(&payload.name, "Name").map_err(AppError::Validation)?;
    if payload.start_date > payload.end_date {
        return Err(AppError::Validation(
            "Start date must not be after end date".to_string(),
        ));
    }

    let period = state.period_repository.create(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Sign period added",
            "period": period,
        })),
    ))
}

/// Admin: list the exception dates of a period
pub async fn list_exceptions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let period = state
        .period_repository
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;

    let exceptions = state.period_repository.list_exceptions(period.id).await?;

    Ok(Json(json!({
        "period": period,
        "exceptions": exceptions,
    })))
}

/// Admin: add an exception (rest) date to a period
pub async fn add_exception(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<NewSignInException>,
) -> AppResult<impl IntoResponse> {
    let period = state
        .period_repository
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !period.contains(payload.exception_date) {
        return Err(AppError::Validation(
            "Exception date must fall inside the period".to_string(),
        ));
    }

    let exception = state
        .period_repository
        .add_exception(period.id, payload.exception_date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Rest day added",
            "exception": exception,
        })),
    ))
}

/// Admin: per-user check-in counts within a period, or the CSV export
pub async fn records_by_period(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<axum::response::Response> {
    let period = state
        .period_repository
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;

    let counts = state
        .record_repository
        .counts_by_user_in_period(&period)
        .await?;

    if query.wants_csv() {
        let body = reports::period_csv(&counts)?;
        let filename = format!("records_period_{}.csv", period.id);
        return Ok(reports::csv_response(&filename, body));
    }

    let page = query.page();
    let total = counts.len();
    let start = ((page - 1) * PER_PAGE) as usize;
    let records: Vec<UserCheckInCount> = counts
        .into_iter()
        .skip(start)
        .take(PER_PAGE as usize)
        .collect();

    Ok(Json(json!({
        "period": period,
        "records": records,
        "page": page,
        "per_page": PER_PAGE,
        "total": total,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_form_routes_answer_get() {
        let response = register_form().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = login_form().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
