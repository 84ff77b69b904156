//! Contact-form relay.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;

use atlas_notifications::templates::{contact_html, contact_text};
use atlas_notifications::{EmailAddress, EmailMessage};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// POST /contact
///
/// Relays the form to the configured contact address with the sender
/// set as reply-to.
pub async fn send_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> ApiResult<StatusCode> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(ApiError::bad_request("A valid sender email is required"));
    }
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message can't be blank"));
    }

    let config = &state.config.email;
    let message = EmailMessage::new(
        EmailAddress::new(&config.from_address).with_name(&config.from_name),
        vec![EmailAddress::new(&config.contact_address)],
        format!("[Contact] {}", request.subject),
        contact_text(&request.email, &request.subject, &request.message),
    )
    .with_html(contact_html(&request.email, &request.subject, &request.message))
    .reply_to(EmailAddress::new(&request.email));

    state
        .mailer
        .send(&message)
        .await
        .map_err(|e| ApiError::internal(format!("contact relay failed: {}", e)))?;

    info!(sender = %request.email, "Contact form relayed");
    Ok(StatusCode::ACCEPTED)
}
