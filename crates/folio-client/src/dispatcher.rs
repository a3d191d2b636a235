//! The composed request path: cache, auth, retry, warmup

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::AuthGate;
use crate::cache::ResponseCache;
use crate::error::{ErrorKind, Result};
use crate::probe::ColdStartProbe;
use crate::retry::{RetryConfig, RetryPolicy, ShouldRetry};
use crate::transport::{ApiRequest, Transport};

/// What to invoke and how it may be retried
#[derive(Debug, Clone)]
pub struct RemoteCall {
    pub request: ApiRequest,
    /// Only idempotent calls are retried
    pub idempotent: bool,
    /// Overrides the dispatcher's retry classifier for this call
    pub should_retry: Option<ShouldRetry>,
}

impl RemoteCall {
    /// A read or other call that is safe to repeat
    pub fn idempotent(request: ApiRequest) -> Self {
        Self {
            request,
            idempotent: true,
            should_retry: None,
        }
    }

    /// A call with side effects; attempted exactly once
    pub fn once(request: ApiRequest) -> Self {
        Self {
            request,
            idempotent: false,
            should_retry: None,
        }
    }

    pub fn with_classifier(mut self, should_retry: ShouldRetry) -> Self {
        self.should_retry = Some(should_retry);
        self
    }
}

/// Client-facing facade over the resilience components.
///
/// Per dispatch the order is fixed: cache check, credential attach, retried
/// transport call, cache write; on terminal failure a 503-class error fires
/// the cold-start probe before the error is returned.
pub struct RequestDispatcher {
    transport: Arc<dyn Transport>,
    gate: AuthGate,
    retry: RetryConfig,
    cache: Arc<ResponseCache>,
    probe: ColdStartProbe,
}

impl RequestDispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        gate: AuthGate,
        retry: RetryConfig,
        cache: Arc<ResponseCache>,
        probe: ColdStartProbe,
    ) -> Self {
        Self {
            transport,
            gate,
            retry,
            cache,
            probe,
        }
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Dispatch `call`, serving from and populating the cache under
    /// `cache_key` when one is given.
    pub async fn dispatch(&self, call: &RemoteCall, cache_key: Option<&str>) -> Result<Value> {
        if let Some(key) = cache_key {
            if let Some(value) = self.cache.get(key).await {
                debug!(key, "Response cache hit");
                return Ok(value);
            }
        }

        let request = self.gate.attach(call.request.clone());
        let request = &request;
        let policy = RetryPolicy::new(self.retry_config_for(call));

        let result = policy
            .execute(move || self.transport.send(request))
            .await;

        match result {
            Ok(value) => {
                if let Some(key) = cache_key {
                    self.cache.set(key, value.clone()).await;
                }
                Ok(value)
            }
            Err(err) => {
                let kind = err.kind();
                warn!(
                    method = %call.request.method,
                    path = %call.request.path,
                    error = %err,
                    kind = ?kind,
                    "Request failed"
                );
                match kind {
                    ErrorKind::ServiceUnavailable => {
                        // Detached: the caller's result does not wait on the pings
                        drop(self.probe.warm());
                    }
                    ErrorKind::Auth(failure) => {
                        self.gate.on_auth_failure(failure, request.bearer.as_deref())
                    }
                    _ => {}
                }
                Err(err)
            }
        }
    }

    /// [`dispatch`](Self::dispatch) and decode the body into `T`
    pub async fn dispatch_json<T: DeserializeOwned>(
        &self,
        call: &RemoteCall,
        cache_key: Option<&str>,
    ) -> Result<T> {
        let value = self.dispatch(call, cache_key).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Drop cached responses whose key contains `pattern`
    pub fn invalidate(&self, pattern: &str) {
        self.cache.delete_matching(pattern);
    }

    fn retry_config_for(&self, call: &RemoteCall) -> RetryConfig {
        let mut config = if call.idempotent {
            self.retry.clone()
        } else {
            RetryConfig::no_retry()
        };
        if let Some(should_retry) = call.should_retry {
            config.should_retry = should_retry;
        }
        config
    }
}
