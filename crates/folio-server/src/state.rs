use std::sync::Arc;

use chrono::Utc;
use folio_protocol::{Clock, SystemClock};
use tracing::{error, info};

use crate::auth::{hash_password, JwtKeys};
use crate::chat::{ChatClient, ChatError};
use crate::config::Config;
use crate::error::AppError;
use crate::store::{new_id, Store, UserRecord};

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub jwt: Arc<JwtKeys>,
    pub chat: Arc<ChatClient>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Build state from configuration, seeding the administrator account
    /// when credentials are configured.
    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        let users = match (&config.admin_email, &config.admin_password) {
            (Some(email), Some(password)) => match admin_user(email, password) {
                Ok(user) => {
                    info!(email = %email, "Seeding administrator account");
                    vec![user]
                }
                Err(e) => {
                    error!(email = %email, error = ?e, "Failed to seed administrator account");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        Ok(Self {
            store: Arc::new(Store::with_users(users)),
            jwt: Arc::new(JwtKeys::new(
                &config.jwt_secret,
                config.jwt_expiration_secs,
                config.jwt_leeway_secs,
            )),
            chat: Arc::new(ChatClient::new(
                &config.chat_api_url,
                config.chat_api_key.clone(),
                &config.chat_model,
            )?),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// An administrator record with a freshly salted password hash
pub fn admin_user(email: &str, password: &str) -> Result<UserRecord, AppError> {
    Ok(UserRecord {
        id: new_id(),
        email: email.trim().to_string(),
        password_hash: hash_password(password)?,
        is_admin: true,
        created_at: Utc::now(),
    })
}
