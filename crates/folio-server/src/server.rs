//! Router assembly and the HTTP listener

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::AUTH_TOKEN_HEADER;
use crate::config::Config;
use crate::routes;
use crate::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!(origin = %o, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(AUTH_TOKEN_HEADER),
        ])
        .allow_credentials(true)
}

/// Create the HTTP router
pub fn create_router(state: AppState, config: &Config) -> Router {
    Router::new()
        // Health (no store access)
        .route("/api", get(routes::health::root))
        .route("/api/portfolios/health", get(routes::health::portfolios))
        .route("/api/messages/health", get(routes::health::messages))
        // Auth
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        // Portfolios
        .route(
            "/api/portfolios",
            get(routes::portfolios::list).post(routes::portfolios::create),
        )
        .route(
            "/api/portfolios/{id}",
            get(routes::portfolios::get)
                .put(routes::portfolios::update)
                .delete(routes::portfolios::delete),
        )
        .route(
            "/api/portfolios/{id}/comments",
            post(routes::portfolios::add_comment),
        )
        // Projects
        .route(
            "/api/projects",
            get(routes::projects::list).post(routes::projects::create),
        )
        .route(
            "/api/projects/{id}",
            get(routes::projects::get)
                .put(routes::projects::update)
                .delete(routes::projects::delete),
        )
        // Contact
        .route(
            "/api/messages",
            get(routes::messages::list).post(routes::messages::create),
        )
        .route("/api/contact", post(routes::messages::create))
        // Chat
        .route("/api/chat", post(routes::chat::chat))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: AppState, config: &Config) -> std::io::Result<()> {
    let router = create_router(state, config);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(port = config.port, "Listening");
    axum::serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_endpoints() {
        let router = create_test_router(create_test_state());
        for (uri, service) in [
            ("/api", "folio-api"),
            ("/api/portfolios/health", "portfolios"),
            ("/api/messages/health", "messages"),
        ] {
            let (status, body) = call(&router, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["status"], "ok");
            assert_eq!(body["service"], service);
        }
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let router = create_test_router(create_test_state());

        let (status, body) = call(
            &router,
            "POST",
            "/api/auth/login",
            Some(json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, me) = call(&router, "GET", "/api/auth/me", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], ADMIN_EMAIL);
        assert_eq!(me["isAdmin"], true);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let router = create_test_router(create_test_state());

        let (status, body) = call(
            &router,
            "POST",
            "/api/auth/login",
            Some(json!({"email": ADMIN_EMAIL, "password": "wrong"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "Invalid credentials");

        let (status, body) = call(&router, "POST", "/api/auth/login", Some(json!({})), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "Please enter all fields");
    }

    #[tokio::test]
    async fn test_expired_token_is_reported_as_expired() {
        let state = create_test_state();
        let token = admin_token(&state);
        // A day later than issue, past the default lifetime
        let later = state
            .clone()
            .with_clock(std::sync::Arc::new(folio_protocol::FixedClock(NOW + 86_400)));
        let router = create_test_router(later);

        let (status, body) = call(&router, "GET", "/api/auth/me", None, Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "auth_expired");
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_listed_origin() {
        let router = create_test_router(create_test_state());
        let resp = router
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/portfolios")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_legacy_token_header() {
        let router = create_test_router(create_test_state());
        let resp = router
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/portfolios")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-auth-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let allowed = resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        assert!(allowed.contains("x-auth-token"), "allowed: {allowed}");
    }

    #[tokio::test]
    async fn test_cors_ignores_unlisted_origin() {
        let router = create_test_router(create_test_state());
        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/api")
                    .header(header::ORIGIN, "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let router = create_test_router(create_test_state());
        let (status, _) = call(&router, "GET", "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
