//! Error types and the failure taxonomy for the folio client

use std::fmt;

pub use folio_protocol::AuthFailure;

/// Errors from the folio client
#[derive(Debug)]
pub enum ClientError {
    /// No response was received (DNS, connect, reset, CORS preflight)
    Network(String),
    /// The transport gave up waiting for a response
    Timeout,
    /// The server answered with a non-success status
    Status {
        status: u16,
        message: Option<String>,
        code: Option<String>,
    },
    /// The credential is known to be unusable before any request is sent
    Auth(AuthFailure),
    /// A success response could not be decoded
    Decode(String),
    /// The client was configured with unusable settings
    Config(String),
}

/// Classification of a [`ClientError`], shared by the retry policy and the
/// dispatcher so the "is this worth retrying" decision lives in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Timeout,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx, including cold-start 503s
    ServiceUnavailable,
    /// HTTP 4xx other than 401 and 429
    ClientError,
    Auth(AuthFailure),
    /// Undecodable response or bad local configuration
    Invalid,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::Network
                | ErrorKind::Timeout
                | ErrorKind::RateLimited
                | ErrorKind::ServiceUnavailable
        )
    }
}

/// Classify an error.
///
/// Pure function of the error: no status (network failure) and timeouts are
/// retryable, as are 429 and 5xx; every other 4xx is final.
pub fn classify(error: &ClientError) -> ErrorKind {
    match error {
        ClientError::Network(_) => ErrorKind::Network,
        ClientError::Timeout => ErrorKind::Timeout,
        ClientError::Status { status, code, .. } => match *status {
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::ServiceUnavailable,
            401 => ErrorKind::Auth(
                code.as_deref()
                    .and_then(AuthFailure::from_code)
                    .unwrap_or(AuthFailure::Invalid),
            ),
            _ => ErrorKind::ClientError,
        },
        ClientError::Auth(failure) => ErrorKind::Auth(*failure),
        ClientError::Decode(_) | ClientError::Config(_) => ErrorKind::Invalid,
    }
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        classify(self)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short message suitable for showing to a person.
    ///
    /// Server-provided messages are used for client errors; everything else
    /// maps to a fixed sentence so internal details never leak.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Network => {
                "Unable to reach the server. Please check your connection.".to_string()
            }
            ErrorKind::Timeout => "The server took too long to respond.".to_string(),
            ErrorKind::RateLimited => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            ErrorKind::ServiceUnavailable => {
                "The server is waking up. Please try again in a few seconds.".to_string()
            }
            ErrorKind::Auth(failure) => failure.message().to_string(),
            ErrorKind::ClientError => match self {
                ClientError::Status {
                    message: Some(msg), ..
                } if !msg.trim().is_empty() => msg.clone(),
                ClientError::Status { status: 404, .. } => "Not found.".to_string(),
                _ => "The request could not be completed.".to_string(),
            },
            ErrorKind::Invalid => "Unexpected response from the server.".to_string(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Status {
                status,
                message: Some(msg),
                ..
            } => write!(f, "HTTP {status}: {msg}"),
            Self::Status { status, .. } => write!(f, "HTTP {status}"),
            Self::Auth(failure) => write!(f, "Authentication error: {}", failure.message()),
            Self::Decode(msg) => write!(f, "Decode error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> ClientError {
        ClientError::Status {
            status,
            message: None,
            code: None,
        }
    }

    #[test]
    fn test_network_and_timeout_are_retryable() {
        assert!(classify(&ClientError::Network("reset".into())).is_retryable());
        assert!(classify(&ClientError::Timeout).is_retryable());
    }

    #[test]
    fn test_429_and_5xx_are_retryable() {
        assert_eq!(classify(&status(429)), ErrorKind::RateLimited);
        for code in [500, 502, 503, 504, 599] {
            assert_eq!(classify(&status(code)), ErrorKind::ServiceUnavailable);
            assert!(classify(&status(code)).is_retryable());
        }
    }

    #[test]
    fn test_other_4xx_are_final() {
        for code in [400, 403, 404, 409, 422] {
            assert_eq!(classify(&status(code)), ErrorKind::ClientError);
            assert!(!classify(&status(code)).is_retryable());
        }
    }

    #[test]
    fn test_401_uses_server_code() {
        let err = ClientError::Status {
            status: 401,
            message: Some("Session expired".into()),
            code: Some("auth_expired".into()),
        };
        assert_eq!(classify(&err), ErrorKind::Auth(AuthFailure::Expired));

        // Unknown or absent code falls back to Invalid
        assert_eq!(classify(&status(401)), ErrorKind::Auth(AuthFailure::Invalid));
        assert!(!classify(&status(401)).is_retryable());
    }

    #[test]
    fn test_user_message_prefers_server_message_for_client_errors() {
        let err = ClientError::Status {
            status: 400,
            message: Some("Invalid credentials".into()),
            code: None,
        };
        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(status(400).user_message(), "The request could not be completed.");
        assert_eq!(status(404).user_message(), "Not found.");
    }

    #[test]
    fn test_user_message_hides_internal_details() {
        let err = ClientError::Status {
            status: 500,
            message: Some("panicked at src/store.rs:42".into()),
            code: None,
        };
        assert!(!err.user_message().contains("store.rs"));

        let err = ClientError::Decode("expected value at line 1 column 1".into());
        assert_eq!(err.user_message(), "Unexpected response from the server.");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", status(503)), "HTTP 503");
        assert_eq!(format!("{}", ClientError::Timeout), "Request timed out");
    }
}
