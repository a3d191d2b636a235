use folio_server::{start_server, AppState, Config};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("folio_server=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    let config = Config::from_env();
    info!(port = config.port, "Starting folio-server");
    info!(origins = ?config.cors_origins, "CORS allow-list");

    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }
    if config.admin_email.is_none() || config.admin_password.is_none() {
        warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; login is disabled");
    }
    if config.chat_api_key.is_none() {
        warn!("CHAT_API_KEY not set; chat replies will be apologies");
    }

    let state = AppState::from_config(&config)?;
    start_server(state, &config).await?;

    Ok(())
}
