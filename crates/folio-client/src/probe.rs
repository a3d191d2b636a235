//! Fire-and-forget warmup pings for a cold-starting backend

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::transport::{ApiRequest, Transport};

/// Cheap liveness endpoints that do not touch the database
pub const DEFAULT_PROBE_ENDPOINTS: [&str; 3] =
    ["/api", "/api/portfolios/health", "/api/messages/health"];

/// Pings liveness endpoints so the hosting platform spins an instance up
/// before the caller re-issues its real request.
#[derive(Clone)]
pub struct ColdStartProbe {
    transport: Arc<dyn Transport>,
    endpoints: Vec<String>,
}

impl ColdStartProbe {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Vec<String>) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn with_default_endpoints(transport: Arc<dyn Transport>) -> Self {
        let endpoints = DEFAULT_PROBE_ENDPOINTS.iter().map(|e| e.to_string()).collect();
        Self::new(transport, endpoints)
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Ping the configured endpoints in the background
    pub fn warm(&self) -> JoinHandle<()> {
        self.warm_endpoints(self.endpoints.clone())
    }

    /// Ping `endpoints` in a detached task.
    ///
    /// Returns immediately. Outcomes are discarded; the handle may be dropped
    /// without affecting the pings.
    pub fn warm_endpoints(&self, endpoints: Vec<String>) -> JoinHandle<()> {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            let requests: Vec<ApiRequest> = endpoints.into_iter().map(ApiRequest::get).collect();
            let results = join_all(requests.iter().map(|r| transport.send(r))).await;
            for (request, result) in requests.iter().zip(results) {
                match result {
                    Ok(_) => debug!(endpoint = %request.path, "Warmup ping succeeded"),
                    Err(e) => debug!(endpoint = %request.path, error = %e, "Warmup ping failed"),
                }
            }
        })
    }
}
