use std::fmt;

use folio_client::ClientError;

#[derive(Debug)]
pub enum CliError {
    Client(ClientError),
    Json(serde_json::Error),
}

impl CliError {
    /// Message shown to the user on failure
    pub fn user_message(&self) -> String {
        match self {
            CliError::Client(e) => e.user_message(),
            CliError::Json(e) => format!("Could not format output: {e}"),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Client(e) => write!(f, "{e}"),
            CliError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Client(e) => Some(e),
            CliError::Json(e) => Some(e),
        }
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        CliError::Client(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
