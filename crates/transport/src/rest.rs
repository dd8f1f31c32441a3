/// REST/JSON surface: `/health`, `/events`, `/query`, `/stats`, matching
/// spec.md §6.1 exactly. Grounded on the facade's own method signatures —
/// handlers are thin, all decision logic lives in `causal-memory-core`.
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use causal_memory_core::CausalMemory;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::rate_limit::IpRateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub memory: Arc<CausalMemory>,
    pub api_key: Option<Arc<str>>,
    pub events_limiter: Arc<IpRateLimiter>,
    pub query_limiter: Arc<IpRateLimiter>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", post(add_event))
        .route("/query", post(query))
        .route("/stats", get(stats))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

async fn require_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = &state.api_key {
        let provided = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_ref()) {
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

async fn health(State(state): State<AppState>) -> Response {
    match state.memory.stats().await {
        Ok(_) => Json(json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "database_connected": true,
        }))
        .into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "version": env!("CARGO_PKG_VERSION"),
                "database_connected": false,
            })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct AddEventRequest {
    effect_text: String,
}

#[derive(Serialize)]
struct AddEventResponse {
    event_id: u64,
    success: bool,
}

async fn add_event(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<AddEventRequest>,
) -> Result<Json<AddEventResponse>, ApiError> {
    if !state.events_limiter.check(addr.ip()) {
        return Err(ApiError::RateLimited);
    }
    let event_id = state.memory.add_event(payload.effect_text).await?;
    Ok(Json(AddEventResponse { event_id, success: true }))
}

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Serialize)]
struct QueryResponse {
    narrative: String,
    success: bool,
}

async fn query(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if !state.query_limiter.check(addr.ip()) {
        return Err(ApiError::RateLimited);
    }
    let narrative = state.memory.query(&payload.query).await?;
    Ok(Json(QueryResponse { narrative, success: true }))
}

#[derive(Serialize)]
struct StatsResponse {
    total_events: usize,
    linked_events: usize,
    orphan_events: usize,
    chain_coverage: f32,
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.memory.stats().await?;
    Ok(Json(StatsResponse {
        total_events: stats.total_events,
        linked_events: stats.linked_events,
        orphan_events: stats.orphan_events,
        chain_coverage: stats.chain_coverage,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use causal_memory_core::testing::{NullEmbedder, NullJudge};
    use causal_memory_core::CausalMemoryConfig;
    use tower::ServiceExt;

    fn tmp_db_path(label: &str) -> std::path::PathBuf {
        tempfile::Builder::new()
            .prefix(&format!("causal-memory-rest-{label}-"))
            .tempdir()
            .unwrap()
            .into_path()
            .join("store.jsonl")
    }

    fn test_state(label: &str) -> AppState {
        let memory = CausalMemory::open(
            tmp_db_path(label),
            Arc::new(NullEmbedder::new(16)),
            Arc::new(NullJudge),
            CausalMemoryConfig::default(),
        )
        .unwrap();
        AppState {
            memory: Arc::new(memory),
            api_key: None,
            events_limiter: Arc::new(IpRateLimiter::new(60)),
            query_limiter: Arc::new(IpRateLimiter::new(120)),
        }
    }

    fn test_addr() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy_on_a_fresh_store() {
        let router = router(test_state("health"));
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_query_is_rejected_with_400() {
        let router = Router::new()
            .route("/query", post(query))
            .with_state(test_state("badquery"));
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/query")
                    .header("content-type", "application/json")
                    .extension(ConnectInfo(test_addr()))
                    .body(axum::body::Body::from(r#"{"query":"   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_event_then_query_round_trips() {
        let state = test_state("roundtrip");
        let events_router = Router::new().route("/events", post(add_event)).with_state(state.clone());
        let add_response = events_router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/events")
                    .header("content-type", "application/json")
                    .extension(ConnectInfo(test_addr()))
                    .body(axum::body::Body::from(r#"{"effect_text":"User opened the application"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(add_response.status(), StatusCode::OK);

        let query_router = Router::new().route("/query", post(query)).with_state(state);
        let query_response = query_router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/query")
                    .header("content-type", "application/json")
                    .extension(ConnectInfo(test_addr()))
                    .body(axum::body::Body::from(r#"{"query":"application"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(query_response.status(), StatusCode::OK);
    }
}
