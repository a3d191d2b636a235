//! Liveness endpoints. These never touch the store so they answer as soon
//! as an instance is up, which is what the client's warmup pings rely on.

use axum::Json;
use chrono::Utc;
use folio_protocol::HealthResponse;

fn ok(service: &str) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: service.to_string(),
        timestamp: Utc::now(),
    })
}

pub async fn root() -> Json<HealthResponse> {
    ok("folio-api")
}

pub async fn portfolios() -> Json<HealthResponse> {
    ok("portfolios")
}

pub async fn messages() -> Json<HealthResponse> {
    ok("messages")
}
