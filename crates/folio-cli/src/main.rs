//! `folio`: command-line access to the portfolio API

mod error;
mod token_file;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use folio_client::protocol::ContactRequest;
use folio_client::{ClientConfig, CredentialStore, ListQuery, MemoryCredentialStore, PortfolioClient};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::token_file::FileCredentialStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Command-line client for the folio portfolio API")]
struct Cli {
    /// API base URL
    #[arg(long, env = "FOLIO_API_URL")]
    api_url: Option<String>,

    /// Bearer token to use instead of the saved one
    #[arg(long, env = "FOLIO_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Where `login` saves the token
    #[arg(long, env = "FOLIO_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the API is up
    Health,
    /// Log in and save the token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FOLIO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the saved token
    Logout,
    /// Show the logged-in principal
    Me,
    /// Portfolio entries
    Portfolios {
        #[command(subcommand)]
        action: ListOrGet,
    },
    /// Projects
    Projects {
        #[command(subcommand)]
        action: ListOrGet,
    },
    /// Send a contact message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// List contact messages (administrators only)
    Messages,
    /// Ask the site assistant a question
    Chat { message: String },
}

#[derive(Subcommand, Debug)]
enum ListOrGet {
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        category: Option<String>,
    },
    Get { id: String },
}

impl ListOrGet {
    fn query(page: Option<u32>, limit: Option<u32>, category: Option<String>) -> ListQuery {
        ListQuery {
            page,
            limit,
            category,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_client(cli: &Cli) -> Result<PortfolioClient> {
    let mut config = ClientConfig::from_env();
    if let Some(ref url) = cli.api_url {
        config = config.with_api_url(url.clone());
    }

    // An explicit token is used for this invocation only
    let store: Arc<dyn CredentialStore> = match cli.token {
        Some(_) => Arc::new(MemoryCredentialStore::new()),
        None => Arc::new(FileCredentialStore::new(
            cli.token_file
                .clone()
                .unwrap_or_else(FileCredentialStore::default_path),
        )),
    };

    let client = PortfolioClient::with_store(&config, store)?;
    if let Some(ref token) = cli.token {
        client.dispatcher().gate().sign_in(token)?;
    }
    Ok(client)
}

async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli)?;

    match cli.command {
        Command::Health => print_json(&client.health().await?),
        Command::Login { email, password } => {
            let principal = client.login(&email, &password).await?;
            eprintln!("Logged in as {}", principal.email);
            Ok(())
        }
        Command::Logout => {
            client.logout();
            eprintln!("Logged out");
            Ok(())
        }
        Command::Me => print_json(&client.me().await?),
        Command::Portfolios { action } => match action {
            ListOrGet::List {
                page,
                limit,
                category,
            } => print_json(
                &client
                    .list_portfolios(&ListOrGet::query(page, limit, category))
                    .await?,
            ),
            ListOrGet::Get { id } => print_json(&client.get_portfolio(&id).await?),
        },
        Command::Projects { action } => match action {
            ListOrGet::List {
                page,
                limit,
                category,
            } => print_json(
                &client
                    .list_projects(&ListOrGet::query(page, limit, category))
                    .await?,
            ),
            ListOrGet::Get { id } => print_json(&client.get_project(&id).await?),
        },
        Command::Contact {
            name,
            email,
            message,
        } => {
            let request = ContactRequest {
                name,
                email,
                message,
            };
            print_json(&client.send_message(&request).await?)
        }
        Command::Messages => print_json(&client.list_messages().await?),
        Command::Chat { message } => {
            let reply = client.chat(&message, &[]).await?;
            println!("{}", reply.response);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "folio_cli=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_nested_list_command() {
        let cli = Cli::try_parse_from([
            "folio",
            "--api-url",
            "http://localhost:5000",
            "portfolios",
            "list",
            "--page",
            "2",
            "--category",
            "rust",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:5000"));
        match cli.command {
            Command::Portfolios {
                action: ListOrGet::List { page, category, .. },
            } => {
                assert_eq!(page, Some(2));
                assert_eq!(category.as_deref(), Some("rust"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_contact_requires_all_fields() {
        assert!(Cli::try_parse_from(["folio", "contact", "--name", "Ada"]).is_err());
    }
}
