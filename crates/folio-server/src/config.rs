use std::env;

use crate::constants::{DEFAULT_BODY_LIMIT_BYTES, DEFAULT_JWT_EXPIRATION_SECS};

/// Secret used when `JWT_SECRET` is unset. Only fit for local development.
pub const DEV_JWT_SECRET: &str = "folio-dev-secret-change-me";

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    /// Clock skew tolerated when checking token expiry
    pub jwt_leeway_secs: i64,
    /// Administrator account seeded at startup when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub chat_api_url: String,
    pub chat_api_key: Option<String>,
    pub chat_model: String,
    pub body_limit_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiration_secs: DEFAULT_JWT_EXPIRATION_SECS,
            jwt_leeway_secs: 0,
            admin_email: None,
            admin_password: None,
            chat_api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            chat_api_key: None,
            chat_model: "gpt-4o-mini".to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret);

        let jwt_expiration_secs = env::var("JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.jwt_expiration_secs);

        let jwt_leeway_secs = env::var("JWT_LEEWAY_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.jwt_leeway_secs);

        let admin_email = env::var("ADMIN_EMAIL").ok().filter(|s| !s.is_empty());
        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty());

        let chat_api_url = env::var("CHAT_API_URL").unwrap_or(defaults.chat_api_url);
        let chat_api_key = env::var("CHAT_API_KEY").ok().filter(|s| !s.is_empty());
        let chat_model = env::var("CHAT_MODEL").unwrap_or(defaults.chat_model);

        let body_limit_bytes = env::var("BODY_LIMIT_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.body_limit_bytes);

        Self {
            port,
            cors_origins,
            jwt_secret,
            jwt_expiration_secs,
            jwt_leeway_secs,
            admin_email,
            admin_password,
            chat_api_url,
            chat_api_key,
            chat_model,
            body_limit_bytes,
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}
