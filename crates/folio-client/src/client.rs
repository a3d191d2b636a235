//! Typed access to the portfolio API

use std::sync::Arc;

use folio_protocol::{
    ChatRequest, ChatResponse, ChatTurn, CommentResponse, ContactMessage, ContactRequest,
    ContactResponse, DeleteResponse, HealthResponse, LoginRequest, LoginResponse, NewComment,
    NewPortfolio, NewProject, Portfolio, PortfolioListing, PortfolioPage, Principal, Project,
    ProjectListing, ProjectPage,
};
use serde::Serialize;
use serde_json::Value;

use crate::auth::{AuthGate, AuthState, CredentialStore, MemoryCredentialStore};
use crate::cache::{CacheStats, ResponseCache};
use crate::config::ClientConfig;
use crate::dispatcher::{RemoteCall, RequestDispatcher};
use crate::error::Result;
use crate::probe::ColdStartProbe;
use crate::retry::RetryConfig;
use crate::transport::{ApiRequest, HttpTransport, Transport};

const PORTFOLIOS_PREFIX: &str = "portfolios:";
const PROJECTS_PREFIX: &str = "projects:";

/// Listing filter for portfolios and projects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
}

impl ListQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(page) = self.page {
            request = request.with_query("page", page);
        }
        if let Some(limit) = self.limit {
            request = request.with_query("limit", limit);
        }
        if let Some(ref category) = self.category {
            request = request.with_query("category", category);
        }
        request
    }

    fn cache_key(&self, prefix: &str) -> String {
        format!(
            "{prefix}list:{}:{}:{}",
            self.page.map(|p| p.to_string()).unwrap_or_default(),
            self.limit.map(|l| l.to_string()).unwrap_or_default(),
            self.category.as_deref().unwrap_or("all"),
        )
    }
}

/// Client for the folio API.
///
/// Reads are retried and cached; writes are attempted once and invalidate
/// the cached reads they could have changed.
pub struct PortfolioClient {
    dispatcher: RequestDispatcher,
}

impl PortfolioClient {
    /// Build an HTTP client with an in-memory credential store.
    ///
    /// Starts the cache sweep, so it must be called within a tokio runtime.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryCredentialStore::new()))
    }

    pub fn with_store(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.api_url, config.timeout)?);
        let cache = Arc::new(ResponseCache::new(config.cache_ttl, config.sweep_interval));
        cache.init();
        Ok(Self::with_parts(
            transport,
            AuthGate::new(store),
            config.retry_config(),
            cache,
        ))
    }

    /// Assemble a client from explicit components
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        gate: AuthGate,
        retry: RetryConfig,
        cache: Arc<ResponseCache>,
    ) -> Self {
        let probe = ColdStartProbe::with_default_endpoints(transport.clone());
        Self {
            dispatcher: RequestDispatcher::new(transport, gate, retry, cache, probe),
        }
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    pub fn auth_state(&self) -> AuthState {
        self.dispatcher.gate().state()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.dispatcher.cache().stats().await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.read(ApiRequest::get("/api"), None).await
    }

    // --- auth ---

    /// Exchange credentials for a bearer token and hold it
    pub async fn login(&self, email: &str, password: &str) -> Result<Principal> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .write(ApiRequest::post("/api/auth/login", to_value(&body)?))
            .await?;
        self.dispatcher.gate().sign_in(&response.token)
    }

    pub fn logout(&self) {
        self.dispatcher.gate().sign_out();
    }

    pub async fn me(&self) -> Result<Principal> {
        self.read(ApiRequest::get("/api/auth/me"), None).await
    }

    // --- portfolios ---

    pub async fn list_portfolios(&self, query: &ListQuery) -> Result<PortfolioPage> {
        let key = query.cache_key(PORTFOLIOS_PREFIX);
        let listing: PortfolioListing = self
            .read(query.apply(ApiRequest::get("/api/portfolios")), Some(&key))
            .await?;
        Ok(listing.into_page())
    }

    pub async fn get_portfolio(&self, id: &str) -> Result<Portfolio> {
        let key = format!("{PORTFOLIOS_PREFIX}{id}");
        self.read(ApiRequest::get(format!("/api/portfolios/{id}")), Some(&key))
            .await
    }

    pub async fn create_portfolio(&self, portfolio: &NewPortfolio) -> Result<Portfolio> {
        let request = ApiRequest::post("/api/portfolios", to_value(portfolio)?);
        self.write_and_invalidate(request, PORTFOLIOS_PREFIX).await
    }

    pub async fn update_portfolio(&self, id: &str, portfolio: &NewPortfolio) -> Result<Portfolio> {
        let request = ApiRequest::put(format!("/api/portfolios/{id}"), to_value(portfolio)?);
        self.write_and_invalidate(request, PORTFOLIOS_PREFIX).await
    }

    pub async fn delete_portfolio(&self, id: &str) -> Result<DeleteResponse> {
        let request = ApiRequest::delete(format!("/api/portfolios/{id}"));
        self.write_and_invalidate(request, PORTFOLIOS_PREFIX).await
    }

    pub async fn add_comment(&self, portfolio_id: &str, comment: &NewComment) -> Result<CommentResponse> {
        let request = ApiRequest::post(
            format!("/api/portfolios/{portfolio_id}/comments"),
            to_value(comment)?,
        );
        self.write_and_invalidate(request, PORTFOLIOS_PREFIX).await
    }

    // --- projects ---

    pub async fn list_projects(&self, query: &ListQuery) -> Result<ProjectPage> {
        let key = query.cache_key(PROJECTS_PREFIX);
        let listing: ProjectListing = self
            .read(query.apply(ApiRequest::get("/api/projects")), Some(&key))
            .await?;
        Ok(listing.into_page())
    }

    pub async fn get_project(&self, id: &str) -> Result<Project> {
        let key = format!("{PROJECTS_PREFIX}{id}");
        self.read(ApiRequest::get(format!("/api/projects/{id}")), Some(&key))
            .await
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Project> {
        let request = ApiRequest::post("/api/projects", to_value(project)?);
        self.write_and_invalidate(request, PROJECTS_PREFIX).await
    }

    pub async fn update_project(&self, id: &str, project: &NewProject) -> Result<Project> {
        let request = ApiRequest::put(format!("/api/projects/{id}"), to_value(project)?);
        self.write_and_invalidate(request, PROJECTS_PREFIX).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<DeleteResponse> {
        let request = ApiRequest::delete(format!("/api/projects/{id}"));
        self.write_and_invalidate(request, PROJECTS_PREFIX).await
    }

    // --- contact & chat ---

    pub async fn send_message(&self, message: &ContactRequest) -> Result<ContactResponse> {
        self.write(ApiRequest::post("/api/messages", to_value(message)?))
            .await
    }

    /// Contact messages, newest first (administrators only)
    pub async fn list_messages(&self) -> Result<Vec<ContactMessage>> {
        self.read(ApiRequest::get("/api/messages"), None).await
    }

    pub async fn chat(&self, message: &str, history: &[ChatTurn]) -> Result<ChatResponse> {
        let body = ChatRequest {
            message: message.to_string(),
            history: history.to_vec(),
        };
        self.write(ApiRequest::post("/api/chat", to_value(&body)?))
            .await
    }

    async fn read<T: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
        cache_key: Option<&str>,
    ) -> Result<T> {
        self.dispatcher
            .dispatch_json(&RemoteCall::idempotent(request), cache_key)
            .await
    }

    async fn write<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.dispatcher
            .dispatch_json(&RemoteCall::once(request), None)
            .await
    }

    async fn write_and_invalidate<T: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
        prefix: &str,
    ) -> Result<T> {
        let result = self.write(request).await;
        // A failed write may still have landed server-side
        self.dispatcher.invalidate(prefix);
        result
    }
}

fn to_value<T: Serialize>(body: &T) -> Result<Value> {
    Ok(serde_json::to_value(body)?)
}
