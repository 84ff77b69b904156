//! Account handlers: register, login, logout, password reset.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use atlas_auth::{extract_bearer_token, hash_password, verify_password, Role};
use atlas_core::{Id, ValidationErrors};
use atlas_db::{CreateUserDto, UpdateUserDto, UserRow};
use atlas_notifications::templates::{
    confirmation_html, confirmation_text, password_reset_html, password_reset_text,
};
use atlas_notifications::{EmailAddress, EmailMessage};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser};

const RESET_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Id,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_subscribed: bool,
}

impl UserResponse {
    fn from_row(row: &UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email.clone(),
            name: row.name.clone(),
            role: row.role.clone(),
            is_subscribed: row.is_subscribed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

fn validate_credentials(
    email: &str,
    password: &str,
    min_length: usize,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if email.trim().is_empty() || !email.contains('@') {
        errors.add("email", "is not a valid address");
    }
    if password.len() < min_length {
        errors.add("password", "is too short");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn send_best_effort(state: &AppState, message: EmailMessage) {
    let mailer = state.mailer.clone();
    tokio::spawn(async move {
        if let Err(err) = mailer.send(&message).await {
            warn!(%err, "Email delivery failed");
        }
    });
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    validate_credentials(
        &request.email,
        &request.password,
        state.config.auth.password_min_length,
    )
    .map_err(ApiError::Validation)?;

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("hashing failed: {}", e)))?;

    let row = state
        .users()?
        .create(CreateUserDto {
            email: request.email.trim().to_lowercase(),
            name: request.name,
            password_hash,
            role: Role::Member.as_str().to_string(),
        })
        .await?;

    let confirmation_url = format!("{}/login", state.config.email.frontend_base_url);
    let config = &state.config.email;
    send_best_effort(
        &state,
        EmailMessage::new(
            EmailAddress::new(&config.from_address).with_name(&config.from_name),
            vec![EmailAddress::new(&row.email)],
            "Welcome aboard",
            confirmation_text(&confirmation_url),
        )
        .with_html(confirmation_html(&confirmation_url)),
    );

    info!(user_id = row.id, "User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from_row(&row))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let row = state
        .users()?
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let verified = verify_password(&request.password, &row.password_hash)
        .map_err(|e| ApiError::internal(format!("verification failed: {}", e)))?;
    if !verified {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let role = Role::parse(&row.role).unwrap_or(Role::Member);
    let token = state
        .jwt
        .create_token(
            row.id,
            role,
            Some(row.email.clone()),
            state.config.auth.token_expiration_seconds as i64,
        )
        .map_err(|e| ApiError::internal(format!("token issue failed: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from_row(&row),
    }))
}

/// POST /auth/logout
///
/// Revokes the presented token; subsequent requests with it fail
/// validation.
pub async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::unauthorized("Expected a bearer token"))?;

    state
        .jwt
        .revoke(token)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/forgot-password
///
/// Always answers 202; whether the address exists is not disclosed.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<StatusCode> {
    let Some(row) = state.users()?.find_by_email(&request.email).await? else {
        return Ok(StatusCode::ACCEPTED);
    };

    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
    state
        .users()?
        .set_reset_token(row.id, &token, expires_at)
        .await?;

    let config = &state.config.email;
    let reset_url = format!(
        "{}/reset-password?token={}",
        config.frontend_base_url, token
    );
    send_best_effort(
        &state,
        EmailMessage::new(
            EmailAddress::new(&config.from_address).with_name(&config.from_name),
            vec![EmailAddress::new(&row.email)],
            "Reset your password",
            password_reset_text(),
        )
        .with_html(password_reset_html(&reset_url)),
    );

    info!(user_id = row.id, "Password reset token issued");
    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    if request.password.len() < state.config.auth.password_min_length {
        let mut errors = ValidationErrors::new();
        errors.add("password", "is too short");
        return Err(ApiError::Validation(errors));
    }

    let row = state
        .users()?
        .find_by_valid_reset_token(&request.token)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired reset token"))?;

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("hashing failed: {}", e)))?;
    state
        .users()?
        .update_profile(
            row.id,
            UpdateUserDto {
                password_hash: Some(password_hash),
                ..UpdateUserDto::default()
            },
        )
        .await?;
    state.users()?.clear_reset_token(row.id).await?;

    info!(user_id = row.id, "Password reset completed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    let row = state
        .users()?
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("user", user.id))?;
    Ok(Json(UserResponse::from_row(&row)))
}
