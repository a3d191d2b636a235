use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use folio_protocol::{ContactMessage, ContactRequest, ContactResponse};
use tracing::info;

use super::required;
use crate::auth::AdminUser;
use crate::constants::MAX_CONTACT_MESSAGE_LENGTH;
use crate::error::{AppError, AppJson};
use crate::state::AppState;
use crate::store::new_id;

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Store a contact-form submission
pub async fn create(
    State(state): State<AppState>,
    AppJson(body): AppJson<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    let name = required(&body.name)?;
    let email = required(&body.email)?;
    let message = required(&body.message)?;

    if !looks_like_email(&email) {
        return Err(AppError::BadRequest("Please enter a valid email".into()));
    }
    if message.chars().count() > MAX_CONTACT_MESSAGE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Message must be at most {MAX_CONTACT_MESSAGE_LENGTH} characters"
        )));
    }

    let contact = ContactMessage {
        id: new_id(),
        name,
        email,
        message,
        created_at: Utc::now(),
    };
    let contact_id = contact.id.clone();
    state.store.messages.insert(contact_id.clone(), contact).await;

    info!(id = %contact_id, "Stored contact message");
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            message: "Message sent successfully".to_string(),
            contact_id,
        }),
    ))
}

/// All contact messages, newest first
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Json<Vec<ContactMessage>> {
    Json(state.store.messages.all().await)
}
