//! Proxy to an OpenAI-compatible chat-completion endpoint

use std::fmt;
use std::time::Duration;

use folio_protocol::{ChatRole, ChatTurn};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{CHAT_HISTORY_TURNS, CHAT_TIMEOUT};

#[derive(Debug)]
pub enum ChatError {
    /// The HTTP client could not be built
    Setup(String),
    NotConfigured,
    Upstream(String),
    EmptyReply,
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(msg) => write!(f, "Failed to build chat client: {msg}"),
            Self::NotConfigured => write!(f, "Chat API key is not configured"),
            Self::Upstream(msg) => write!(f, "Chat upstream error: {msg}"),
            Self::EmptyReply => write!(f, "Chat upstream returned no reply"),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Assemble the upstream conversation: the system prompt, the most recent
/// user/assistant turns with non-blank content, then the new message.
pub fn build_messages(system: &str, history: &[ChatTurn], message: &str) -> Vec<ChatTurn> {
    let usable: Vec<&ChatTurn> = history
        .iter()
        .filter(|t| matches!(t.role, ChatRole::User | ChatRole::Assistant))
        .filter(|t| !t.content.trim().is_empty())
        .collect();
    let recent = &usable[usable.len().saturating_sub(CHAT_HISTORY_TURNS)..];

    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(ChatTurn::new(ChatRole::System, system));
    messages.extend(recent.iter().map(|t| (*t).clone()));
    messages.push(ChatTurn::new(ChatRole::User, message));
    messages
}

/// Client for the chat-completion upstream
pub struct ChatClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(api_url: &str, api_key: Option<String>, model: &str) -> Result<Self, ChatError> {
        Self::with_timeout(api_url, api_key, model, CHAT_TIMEOUT)
    }

    pub fn with_timeout(
        api_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Setup(e.to_string()))?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
            api_key,
            model: model.to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn complete(&self, messages: &[ChatTurn]) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;

        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: 0.7,
            max_tokens: 500,
        };

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ChatError::Upstream(format!("HTTP {status}")));
        }

        let completion: CompletionResponse = resp.json().await?;
        debug!(choices = completion.choices.len(), "Chat completion received");

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(ChatError::EmptyReply)
    }
}
