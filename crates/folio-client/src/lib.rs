//! Resilient client for the folio portfolio API
//!
//! The API runs on a serverless host that sleeps when idle, so first
//! requests often fail with a 503 or time out while an instance boots. Every
//! call goes through a [`RequestDispatcher`], which in order:
//!
//! 1. serves the response from the [`ResponseCache`] when a fresh one exists;
//! 2. attaches the held bearer credential via the [`AuthGate`];
//! 3. runs the [`Transport`] call under a [`RetryPolicy`] with exponential
//!    backoff (idempotent calls only);
//! 4. caches a successful response;
//! 5. on a terminal 5xx, fires the [`ColdStartProbe`] in the background and
//!    returns the error. A 401 clears the held credential.
//!
//! [`PortfolioClient`] wraps this in typed methods for each API route.
//!
//! ```no_run
//! # async fn demo() -> folio_client::Result<()> {
//! use folio_client::{ClientConfig, ListQuery, PortfolioClient};
//!
//! let client = PortfolioClient::new(&ClientConfig::from_env())?;
//! let page = client.list_portfolios(&ListQuery::page(1, 10)).await?;
//! println!("{} portfolios", page.pagination.total);
//! # Ok(())
//! # }
//! ```

mod auth;
mod cache;
mod client;
mod config;
mod dispatcher;
mod error;
mod probe;
mod retry;
mod transport;

pub use auth::{AuthGate, AuthState, Credential, CredentialStore, MemoryCredentialStore};
pub use cache::{CacheStats, ResponseCache, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
pub use client::{ListQuery, PortfolioClient};
pub use config::ClientConfig;
pub use dispatcher::{RemoteCall, RequestDispatcher};
pub use error::{classify, AuthFailure, ClientError, ErrorKind, Result};
pub use probe::{ColdStartProbe, DEFAULT_PROBE_ENDPOINTS};
pub use retry::{default_should_retry, RetryConfig, RetryPolicy, ShouldRetry};
pub use transport::{ApiRequest, HttpTransport, Transport};

pub use folio_protocol as protocol;
