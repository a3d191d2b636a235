use axum::extract::State;
use axum::Json;
use folio_protocol::{ChatRequest, ChatResponse};
use tracing::warn;

use super::required;
use crate::chat::build_messages;
use crate::constants::{CHAT_APOLOGY, CHAT_SYSTEM_PROMPT, MAX_CHAT_MESSAGE_LENGTH};
use crate::error::{AppError, AppJson};
use crate::state::AppState;

/// Answer a chat message.
///
/// Upstream failures still return 200, with `success: false` and an apology
/// the UI can show as-is.
pub async fn chat(
    State(state): State<AppState>,
    AppJson(body): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = required(&body.message)?;
    if message.chars().count() > MAX_CHAT_MESSAGE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Message must be at most {MAX_CHAT_MESSAGE_LENGTH} characters"
        )));
    }

    let messages = build_messages(CHAT_SYSTEM_PROMPT, &body.history, &message);
    match state.chat.complete(&messages).await {
        Ok(response) => Ok(Json(ChatResponse {
            success: true,
            response,
        })),
        Err(e) => {
            warn!(error = %e, "Chat completion failed");
            Ok(Json(ChatResponse {
                success: false,
                response: CHAT_APOLOGY.to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::constants::CHAT_APOLOGY;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_unavailable_upstream_apologizes_with_200() {
        // The test config has no chat API key
        let router = create_test_router(create_test_state());
        let (status, body) = call(
            &router,
            "POST",
            "/api/chat",
            Some(json!({"message": "What do you build?", "history": []})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["response"], CHAT_APOLOGY);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let router = create_test_router(create_test_state());
        let (status, _) = call(&router, "POST", "/api/chat", Some(json!({"message": " "})), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
