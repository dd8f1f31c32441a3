use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::response::IntoResponse;
use axum::routing::get;
use causal_memory_core::CausalMemory;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;

use crate::tools::CausalMemoryTools;

/// Reads framed JSON-RPC tool-call messages from stdin and writes responses
/// to stdout. Used when no `PORT` is configured (spec.md §6.2).
pub async fn serve_stdio(memory: Arc<CausalMemory>) -> Result<()> {
    let service = CausalMemoryTools::new(memory).serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Builds the axum sub-router exposing the tool-call protocol over HTTP —
/// the streamable-HTTP transport unifies the liveness/SSE/message endpoints
/// spec.md §6.2 describes into a single path handling both GET (event
/// stream) and POST (message) verbs; `/` still answers with a liveness
/// banner for anything that only checks the root is up.
pub fn http_router(memory: Arc<CausalMemory>) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(CausalMemoryTools::new(memory.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .route("/", get(|| async { "causal-memory tool server".into_response() }))
        .nest_service("/mcp", service)
}
