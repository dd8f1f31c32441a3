pub mod error;
pub mod mcp;
pub mod rate_limit;
pub mod request_id;
pub mod rest;
pub mod tools;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use causal_memory_config::AppConfig;
use causal_memory_core::CausalMemory;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use rest::AppState;

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config.cors_origins_list();
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect();
        AllowOrigin::list(values)
    };
    CorsLayer::new().allow_origin(allow_origin)
}

/// Runs the service per spec.md §6's transport-selection rule: a REST+MCP
/// HTTP server when `PORT` is configured, an MCP stdio loop otherwise.
/// Both adapters share the one `CausalMemory` instance passed in; neither
/// holds state of its own beyond request-scoped buffers (§5).
pub async fn serve(config: &AppConfig, memory: Arc<CausalMemory>) -> Result<()> {
    let Some(port) = config.server.port else {
        tracing::info!("no PORT configured, serving the tool-call protocol over stdio");
        return mcp::serve_stdio(memory).await;
    };

    let state = AppState {
        memory: memory.clone(),
        api_key: config.server.api_key.clone().map(Arc::from),
        events_limiter: Arc::new(rate_limit::IpRateLimiter::new(config.server.rate_limit_events_per_min)),
        query_limiter: Arc::new(rate_limit::IpRateLimiter::new(config.server.rate_limit_query_per_min)),
    };

    let app = rest::router(state)
        .merge(mcp::http_router(memory))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "binding REST + tool-call protocol server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
