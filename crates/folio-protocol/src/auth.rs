use serde::{Deserialize, Serialize};

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Authenticated identity, as returned by `GET /api/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
}

/// Claims embedded in a bearer credential.
///
/// The server signs these with HS256; clients only read them (to learn the
/// principal and the expiry) and never verify the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Principal id
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub admin: bool,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(principal: &Principal, issued_at: i64, ttl_secs: i64) -> Self {
        Self {
            sub: principal.id.clone(),
            email: principal.email.clone(),
            admin: principal.is_admin,
            iat: issued_at,
            exp: issued_at + ttl_secs,
        }
    }

    /// A credential is expired once its `exp` is in the past.
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp <= now
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.sub.clone(),
            email: self.email.clone(),
            is_admin: self.admin,
        }
    }
}

/// Why a request failed authentication.
///
/// The server reports this as the `code` field of a 401 body so the client
/// can classify the failure without parsing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailure {
    /// No credential on a route that requires one
    Missing,
    /// Signature or shape verification failed
    Invalid,
    /// Embedded expiry has passed
    Expired,
}

impl AuthFailure {
    pub fn code(self) -> &'static str {
        match self {
            AuthFailure::Missing => "auth_missing",
            AuthFailure::Invalid => "auth_invalid",
            AuthFailure::Expired => "auth_expired",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "auth_missing" => Some(AuthFailure::Missing),
            "auth_invalid" => Some(AuthFailure::Invalid),
            "auth_expired" => Some(AuthFailure::Expired),
            _ => None,
        }
    }

    /// Short human-readable description
    pub fn message(self) -> &'static str {
        match self {
            AuthFailure::Missing => "No token, authorization denied",
            AuthFailure::Invalid => "Token is not valid",
            AuthFailure::Expired => "Session expired, please log in again",
        }
    }
}

/// Source of "now" for credential expiry checks.
///
/// Injected so expiry logic can be tested against fixed instants.
pub trait Clock: Send + Sync {
    /// Current time as Unix epoch seconds
    fn now_epoch_secs(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            id: "u1".to_string(),
            email: "me@example.com".to_string(),
            is_admin: true,
        }
    }

    #[test]
    fn test_claims_expiry_boundary() {
        let claims = TokenClaims::new(&principal(), 1_000, 60);
        assert_eq!(claims.exp, 1_060);
        assert!(!claims.is_expired(1_059));
        assert!(claims.is_expired(1_060));
        assert!(claims.is_expired(2_000));
    }

    #[test]
    fn test_claims_round_trip_principal() {
        let claims = TokenClaims::new(&principal(), 0, 10);
        assert_eq!(claims.principal(), principal());
    }

    #[test]
    fn test_auth_failure_codes() {
        for failure in [AuthFailure::Missing, AuthFailure::Invalid, AuthFailure::Expired] {
            assert_eq!(AuthFailure::from_code(failure.code()), Some(failure));
        }
        assert_eq!(AuthFailure::from_code("something_else"), None);
    }

    #[test]
    fn test_principal_serializes_camel_case() {
        let json = serde_json::to_value(principal()).unwrap();
        assert_eq!(json["isAdmin"], true);
        assert!(json.get("is_admin").is_none());
    }
}
