//! Application state and axum extractors.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use atlas_assets::{AssetLedger, ObjectStore};
use atlas_auth::{extract_bearer_token, CurrentUser, JwtService};
use atlas_billing::{PaymentGateway, WebhookVerifier};
use atlas_content::{BackgroundPicker, ContentCoordinator};
use atlas_core::config::AppConfig;
use atlas_db::UserRepository;
use atlas_notifications::Mailer;

use crate::error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub classes: Arc<ContentCoordinator>,
    pub units: Arc<ContentCoordinator>,
    pub posts: Arc<ContentCoordinator>,
    pub picker: Arc<BackgroundPicker>,
    pub ledger: Arc<dyn AssetLedger>,
    pub objects: Arc<dyn ObjectStore>,
    pub jwt: Arc<JwtService>,
    pub users: Option<Arc<UserRepository>>,
    pub mailer: Arc<dyn Mailer>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub webhook_verifier: Arc<dyn WebhookVerifier>,
}

impl AppState {
    /// The user repository, absent only in storage-less test setups.
    pub fn users(&self) -> Result<&UserRepository, ApiError> {
        self.users
            .as_deref()
            .ok_or_else(|| ApiError::internal("user repository not configured"))
    }
}

/// Authenticated caller extractor. Any valid bearer token passes.
pub struct AuthenticatedUser(pub CurrentUser);

fn authenticate(parts: &Parts, jwt: &JwtService) -> Result<CurrentUser, ApiError> {
    let header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let token = extract_bearer_token(header)
        .ok_or_else(|| ApiError::unauthorized("Expected a bearer token"))?;

    let claims = jwt
        .validate_token(token)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let id = claims
        .sub
        .parse()
        .map_err(|_| ApiError::unauthorized("Malformed token subject"))?;

    let mut user = CurrentUser::new(id, claims.role);
    user.email = claims.email;
    Ok(user)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        Ok(AuthenticatedUser(authenticate(parts, &app_state.jwt)?))
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Caller with content-mutation rights (editor or admin).
pub struct EditorUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for EditorUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = authenticate(parts, &app_state.jwt)?;
        if !user.role.can_edit_content() {
            return Err(ApiError::forbidden("Editor role required"));
        }
        Ok(EditorUser(user))
    }
}

impl std::ops::Deref for EditorUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
