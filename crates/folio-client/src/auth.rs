//! Client half of the auth gate: credential storage and bearer attachment

use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use folio_protocol::{Clock, Principal, SystemClock, TokenClaims};
use tracing::{debug, info};

use crate::error::{AuthFailure, ClientError, Result};
use crate::transport::ApiRequest;

/// A bearer token together with the claims read from its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    claims: TokenClaims,
}

impl Credential {
    /// Read the claims segment of a JWT. The signature is not checked here;
    /// only the server can do that.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(ClientError::Auth(AuthFailure::Invalid)),
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| ClientError::Auth(AuthFailure::Invalid))?;
        let claims: TokenClaims =
            serde_json::from_slice(&bytes).map_err(|_| ClientError::Auth(AuthFailure::Invalid))?;

        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn principal(&self) -> Principal {
        self.claims.principal()
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.claims.is_expired(now)
    }
}

/// Where the held credential lives between requests
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;
    fn set(&self, credential: Credential);
    fn clear(&self);
}

/// Process-memory credential store
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.inner.read().ok().and_then(|c| c.clone())
    }

    fn set(&self, credential: Credential) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(credential);
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }
}

/// Caller-side authentication state. There is no partial state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(Principal),
}

/// Attaches the held credential to outgoing requests and drives the
/// `Unauthenticated -> Authenticated -> Unauthenticated` transitions.
#[derive(Clone)]
pub struct AuthGate {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl AuthGate {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The held credential if it has not expired.
    ///
    /// An expired credential is discarded on discovery.
    pub fn current(&self) -> Option<Credential> {
        let credential = self.store.get()?;
        if credential.is_expired(self.clock.now_epoch_secs()) {
            info!(principal = %credential.claims.sub, "Credential expired, signing out");
            self.store.clear();
            return None;
        }
        Some(credential)
    }

    pub fn state(&self) -> AuthState {
        match self.current() {
            Some(credential) => AuthState::Authenticated(credential.principal()),
            None => AuthState::Unauthenticated,
        }
    }

    /// Add the bearer credential when a live one is held; otherwise send the
    /// request anonymously.
    pub fn attach(&self, request: ApiRequest) -> ApiRequest {
        match self.current() {
            Some(credential) => request.with_bearer(credential.token),
            None => ApiRequest {
                bearer: None,
                ..request
            },
        }
    }

    /// Adopt the token returned by a successful login
    pub fn sign_in(&self, token: &str) -> Result<Principal> {
        let credential = Credential::parse(token)?;
        if credential.is_expired(self.clock.now_epoch_secs()) {
            return Err(ClientError::Auth(AuthFailure::Expired));
        }
        let principal = credential.principal();
        self.store.set(credential);
        info!(principal = %principal.id, "Signed in");
        Ok(principal)
    }

    pub fn sign_out(&self) {
        self.store.clear();
        debug!("Signed out");
    }

    /// The server rejected the credential a request carried.
    ///
    /// Only that credential is discarded; one adopted while the request was
    /// in flight is kept.
    pub fn on_auth_failure(&self, failure: AuthFailure, rejected: Option<&str>) {
        let Some(rejected) = rejected else {
            return;
        };
        match self.store.get() {
            Some(held) if held.token() == rejected => {
                info!(reason = failure.code(), "Server rejected credential, signing out");
                self.store.clear();
            }
            Some(_) => {
                debug!(reason = failure.code(), "Rejected credential already replaced");
            }
            None => {}
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_tokens::{admin, token_for};
    use super::*;
    use folio_protocol::FixedClock;

    const NOW: i64 = 1_704_067_200;

    fn gate_at(now: i64) -> (AuthGate, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let gate = AuthGate::with_clock(store.clone(), Arc::new(FixedClock(now)));
        (gate, store)
    }

    #[test]
    fn test_parse_reads_claims() {
        let token = token_for(&admin(), NOW, 3600);
        let credential = Credential::parse(&token).unwrap();
        assert_eq!(credential.principal(), admin());
        assert_eq!(credential.claims().exp, NOW + 3600);
        assert_eq!(credential.token(), token);
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        for bad in ["", "abc", "a.b", "a.b.c.d", "a.!!!.c", "a.e30.c"] {
            assert!(
                matches!(Credential::parse(bad), Err(ClientError::Auth(AuthFailure::Invalid))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_attach_adds_bearer_when_live() {
        let (gate, _) = gate_at(NOW);
        gate.sign_in(&token_for(&admin(), NOW, 3600)).unwrap();

        let request = gate.attach(ApiRequest::get("/api/auth/me"));
        assert!(request.bearer.is_some());
    }

    #[test]
    fn test_attach_omits_bearer_when_absent() {
        let (gate, _) = gate_at(NOW);
        let request = gate.attach(ApiRequest::get("/api/portfolios").with_bearer("stale"));
        assert!(request.bearer.is_none());
    }

    #[test]
    fn test_attach_never_sends_expired_credential() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.set(Credential::parse(&token_for(&admin(), NOW - 7200, 3600)).unwrap());
        let gate = AuthGate::with_clock(store.clone(), Arc::new(FixedClock(NOW)));

        let request = gate.attach(ApiRequest::get("/api/auth/me"));
        assert!(request.bearer.is_none());
        // Discovery of expiry signs the caller out
        assert!(store.get().is_none());
        assert_eq!(gate.state(), AuthState::Unauthenticated);
    }

    #[test]
    fn test_state_transitions() {
        let (gate, _) = gate_at(NOW);
        assert_eq!(gate.state(), AuthState::Unauthenticated);

        let principal = gate.sign_in(&token_for(&admin(), NOW, 60)).unwrap();
        assert_eq!(gate.state(), AuthState::Authenticated(principal));

        gate.sign_out();
        assert_eq!(gate.state(), AuthState::Unauthenticated);

        let token = token_for(&admin(), NOW, 60);
        gate.sign_in(&token).unwrap();
        gate.on_auth_failure(AuthFailure::Invalid, Some(&token));
        assert_eq!(gate.state(), AuthState::Unauthenticated);
    }

    #[test]
    fn test_rejection_of_replaced_credential_keeps_new_one() {
        let (gate, _) = gate_at(NOW);
        let stale = token_for(&admin(), NOW - 10, 60);
        let fresh = token_for(&admin(), NOW, 3600);
        gate.sign_in(&stale).unwrap();
        gate.sign_in(&fresh).unwrap();

        gate.on_auth_failure(AuthFailure::Expired, Some(&stale));
        assert_eq!(gate.state(), AuthState::Authenticated(admin()));

        // An anonymous request's 401 says nothing about the held credential
        gate.on_auth_failure(AuthFailure::Missing, None);
        assert_eq!(gate.current().unwrap().token(), fresh);
    }

    #[test]
    fn test_sign_in_rejects_already_expired_token() {
        let (gate, store) = gate_at(NOW);
        let err = gate.sign_in(&token_for(&admin(), NOW - 100, 10)).unwrap_err();
        assert!(matches!(err, ClientError::Auth(AuthFailure::Expired)));
        assert!(store.get().is_none());
    }
}
