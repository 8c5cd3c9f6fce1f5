//! Authentication middleware for JWT bearer tokens

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user information, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// Validate the bearer token on the request and return the caller
fn authenticate(state: &AppState, req: &Request<Body>) -> Result<AuthUser, AppError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let claims = state
        .jwt_service
        .validate_token(token)
        .map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        id: claims.sub,
        username: claims.username,
        is_admin: claims.is_admin,
    })
}

/// Middleware for routes that require a logged-in user
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, &req)?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Middleware for admin-only routes
///
/// Non-admin callers get a 403 without any route detail.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, &req)?;
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
