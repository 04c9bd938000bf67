//! Authentication and account endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::UserPublic,
    services::accounts::DeactivationSummary,
};

use super::AuthenticatedUser;

/// Login request
#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user: UserPublic,
}

/// Password reset request
#[derive(Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

/// Authenticate and obtain a JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials or deactivated account")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (token, refresh_token, user) = state
        .services
        .accounts
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        refresh_token,
        token_type: "Bearer".to_string(),
        user: user.into(),
    }))
}

/// Request a password reset email.
/// Always responds 202; the body never reveals whether the account exists.
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 202, description = "Accepted"),
        (status = 504, description = "Email dependency timed out")
    )
)]
pub async fn forgot_password(
    State(state): State<crate::AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> AppResult<StatusCode> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state
        .services
        .accounts
        .request_password_reset(&request.email)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// Deactivate the caller's own account, cancelling all of their active
/// appointments in the same transaction
#[utoipa::path(
    patch,
    path = "/auth/deactivate",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account deactivated", body = DeactivationSummary)
    )
)]
pub async fn deactivate(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<DeactivationSummary>> {
    let summary = state
        .services
        .accounts
        .deactivate_account(claims.user_id)
        .await?;

    Ok(Json(summary))
}
