//! Subscription checkout and payment webhooks.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use atlas_billing::WebhookEvent;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

/// POST /billing/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<CheckoutResponse>> {
    let checkout_url = state
        .gateway
        .create_subscription_session(user.id)
        .await
        .map_err(|e| ApiError::internal(format!("checkout session failed: {}", e)))?;
    Ok(Json(CheckoutResponse { checkout_url }))
}

/// POST /billing/cancel
///
/// Cancels at the processor first; the local flag only flips once the
/// processor has accepted the cancellation.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<StatusCode> {
    let row = state
        .users()?
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

    let subscription_id = row
        .stripe_subscription_id
        .ok_or_else(|| ApiError::bad_request("No active subscription"))?;

    state
        .gateway
        .cancel_subscription(&subscription_id)
        .await
        .map_err(|e| ApiError::internal(format!("cancellation failed: {}", e)))?;

    state.users()?.set_subscription(user.id, false, None).await?;
    info!(user_id = user.id, "Subscription cancelled");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /webhook/stripe
///
/// The processor signs the raw body; verification runs before any
/// parsing. Unhandled event types are acknowledged and dropped.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing stripe-signature header"))?;

    let payload = state
        .webhook_verifier
        .verify(&body, signature)
        .map_err(|e| ApiError::bad_request(format!("webhook rejected: {}", e)))?;

    let event = WebhookEvent::parse(payload)
        .map_err(|e| ApiError::bad_request(format!("malformed webhook payload: {}", e)))?;

    match event {
        WebhookEvent::SubscriptionActivated {
            user_id,
            subscription_id,
        } => {
            state
                .users()?
                .set_subscription(user_id, true, Some(&subscription_id))
                .await?;
            info!(user_id, "Subscription activated");
        }
        WebhookEvent::Ignored { event_type } => {
            warn!(event_type, "Ignoring unhandled webhook event");
        }
    }

    Ok(StatusCode::OK)
}
