use std::collections::HashSet;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use folio_protocol::{AuthFailure, Principal, TokenClaims};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Legacy header some clients still send the token in
pub(crate) const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// HS256 signing and verification keys
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    leeway_secs: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_secs: i64, leeway_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            leeway_secs,
        }
    }

    pub fn issue(&self, principal: &Principal, now: i64) -> Result<String, AppError> {
        let claims = TokenClaims::new(principal, now, self.ttl_secs);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Check the signature, then expiry against `now`.
    ///
    /// Expiry is checked here rather than by `jsonwebtoken` so tests can pin
    /// the clock.
    pub fn verify(&self, token: &str, now: i64) -> Result<Principal, AuthFailure> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AuthFailure::Invalid
        })?;

        if data.claims.exp + self.leeway_secs <= now {
            return Err(AuthFailure::Expired);
        }
        Ok(data.claims.principal())
    }
}

/// Argon2id hash in PHC string form; the salt travels inside it
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            debug!(error = %e, "Stored password hash is unreadable");
            false
        }
    }
}

/// Pull the token from `Authorization: Bearer ...` or `x-auth-token`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .unwrap_or(value)
            .trim();
        if !token.is_empty() {
            return Some(token);
        }
    }
    headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Admit or reject a request based on its bearer credential
pub fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<Principal, AuthFailure> {
    let token = bearer_token(headers).ok_or(AuthFailure::Missing)?;
    state.jwt.verify(token, state.clock.now_epoch_secs())
}

/// Axum extractor that requires a valid bearer token.
///
/// ```ignore
/// async fn my_handler(AuthUser(principal): AuthUser, ...) -> Result<..., AppError> { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state)
            .map(AuthUser)
            .map_err(AppError::Unauthorized)
    }
}

/// Like [`AuthUser`] but the principal must be an administrator
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = authenticate(&parts.headers, state).map_err(AppError::Unauthorized)?;
        if !principal.is_admin {
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser(principal))
    }
}

/// Optional authentication for open routes; a bad token reads as anonymous
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Principal>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(authenticate(&parts.headers, state).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const NOW: i64 = 1_704_067_200;

    fn principal() -> Principal {
        Principal {
            id: "u1".into(),
            email: "admin@example.com".into(),
            is_admin: true,
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = JwtKeys::new("secret", 3600, 0);
        let token = keys.issue(&principal(), NOW).unwrap();
        assert_eq!(keys.verify(&token, NOW + 10).unwrap(), principal());
    }

    #[test]
    fn test_expired_token() {
        let keys = JwtKeys::new("secret", 3600, 0);
        let token = keys.issue(&principal(), NOW).unwrap();
        assert_eq!(keys.verify(&token, NOW + 3600), Err(AuthFailure::Expired));
    }

    #[test]
    fn test_leeway_tolerates_skew() {
        let keys = JwtKeys::new("secret", 3600, 60);
        let token = keys.issue(&principal(), NOW).unwrap();
        assert!(keys.verify(&token, NOW + 3630).is_ok());
        assert_eq!(keys.verify(&token, NOW + 3660), Err(AuthFailure::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = JwtKeys::new("secret", 3600, 0)
            .issue(&principal(), NOW)
            .unwrap();
        let other = JwtKeys::new("different", 3600, 0);
        assert_eq!(other.verify(&token, NOW), Err(AuthFailure::Invalid));
        assert_eq!(other.verify("garbage", NOW), Err(AuthFailure::Invalid));
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        // Fresh salt per hash
        assert_ne!(hash, hash_password("hunter2").unwrap());
    }

    #[test]
    fn test_unreadable_hash_never_verifies() {
        assert!(!verify_password("hunter2", ""));
        assert!(!verify_password("hunter2", "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7"));
    }

    #[test]
    fn test_bearer_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("legacy"));
        assert_eq!(bearer_token(&headers), Some("legacy"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }
}
