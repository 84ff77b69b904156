//! # atlas-billing
//!
//! The subscription billing boundary. The payment processor is reached
//! only through the [`PaymentGateway`] and [`WebhookVerifier`] traits;
//! the processor SDK itself lives behind the deployment boundary. What
//! this crate owns is the webhook event model and the parsing of a
//! verified payload into it.

use async_trait::async_trait;
use atlas_core::Id;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Payment gateway error: {0}")]
    Gateway(String),
    #[error("Webhook signature verification failed")]
    BadSignature,
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),
}

pub type BillingResult<T> = Result<T, BillingError>;

/// Checkout and subscription management at the processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a subscription checkout for a user, returning the hosted
    /// checkout URL. The user id rides along as session metadata and
    /// comes back in the completion webhook.
    async fn create_subscription_session(&self, user_id: Id) -> BillingResult<String>;

    /// Cancel an active subscription at the processor.
    async fn cancel_subscription(&self, subscription_id: &str) -> BillingResult<()>;
}

/// Signature verification for incoming webhook payloads.
pub trait WebhookVerifier: Send + Sync {
    /// Verify the payload against its signature header, returning the
    /// raw JSON body on success.
    fn verify<'a>(&self, payload: &'a [u8], signature: &str) -> BillingResult<&'a [u8]>;
}

/// Events this backend reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout completed; the user's subscription is live.
    SubscriptionActivated {
        user_id: Id,
        subscription_id: String,
    },
    /// Any event type this backend does not handle.
    Ignored { event_type: String },
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: RawSession,
}

#[derive(Deserialize)]
struct RawSession {
    #[serde(default)]
    subscription: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

impl WebhookEvent {
    /// Parse a verified webhook body.
    ///
    /// `checkout.session.completed` must carry the user id in the session
    /// metadata and the subscription id on the session; anything else is
    /// a malformed payload. Unrecognized event types are reported as
    /// `Ignored`, not as errors.
    pub fn parse(body: &[u8]) -> BillingResult<WebhookEvent> {
        let raw: RawEvent = serde_json::from_slice(body)
            .map_err(|e| BillingError::MalformedPayload(e.to_string()))?;

        match raw.event_type.as_str() {
            "checkout.session.completed" => {
                let session = raw.data.object;
                let user_id = session
                    .metadata
                    .and_then(|m| m.user_id)
                    .ok_or_else(|| {
                        BillingError::MalformedPayload("userId missing in metadata".to_string())
                    })?
                    .parse::<Id>()
                    .map_err(|_| {
                        BillingError::MalformedPayload("userId is not numeric".to_string())
                    })?;
                let subscription_id = session.subscription.ok_or_else(|| {
                    BillingError::MalformedPayload("subscription missing on session".to_string())
                })?;

                Ok(WebhookEvent::SubscriptionActivated {
                    user_id,
                    subscription_id,
                })
            }
            other => {
                debug!(event_type = other, "Unhandled webhook event type");
                Ok(WebhookEvent::Ignored {
                    event_type: other.to_string(),
                })
            }
        }
    }
}

/// Gateway returning canned values, for tests and development.
pub struct TestGateway {
    pub checkout_url: String,
}

impl Default for TestGateway {
    fn default() -> Self {
        Self {
            checkout_url: "https://checkout.test/session".to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for TestGateway {
    async fn create_subscription_session(&self, user_id: Id) -> BillingResult<String> {
        Ok(format!("{}?client_reference_id={}", self.checkout_url, user_id))
    }

    async fn cancel_subscription(&self, _subscription_id: &str) -> BillingResult<()> {
        Ok(())
    }
}

/// Verifier that accepts any payload, for tests and development.
pub struct NoopVerifier;

impl WebhookVerifier for NoopVerifier {
    fn verify<'a>(&self, payload: &'a [u8], _signature: &str) -> BillingResult<&'a [u8]> {
        Ok(payload)
    }
}
