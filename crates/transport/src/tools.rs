/// The tool-call protocol surface from spec.md §6.2: `add_event` and
/// `query`, exposed as `rmcp` tools over whichever transport `mcp::serve`
/// picks. Mirrors, at the framing level, the teacher's unified-daemon
/// command dispatch (`server/connection.rs`'s `ClientCommand` match) —
/// here `rmcp` owns the JSON-RPC envelope instead of a bespoke one.
use std::sync::Arc;

use causal_memory_core::CausalMemory;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

/// Embedded in both the server's instructions and each tool description so
/// a calling agent forms the query-then-record habit even if it only reads
/// one of the two: consult this memory for relevant context before acting
/// on a task, then record what happened as a new event once it has.
const PROTOCOL_BANNER: &str =
    "Protocol: before acting on a task, call `query` with a description of \
     the task to recall relevant prior context. After acting, call \
     `add_event` to record what happened so future queries can find it.";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddEventParams {
    /// The effect text to record as a new event.
    pub effect: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryParams {
    /// The natural-language query to assemble a narrative for.
    pub query: String,
}

#[derive(Clone)]
pub struct CausalMemoryTools {
    memory: Arc<CausalMemory>,
    tool_router: ToolRouter<CausalMemoryTools>,
}

#[tool_router]
impl CausalMemoryTools {
    pub fn new(memory: Arc<CausalMemory>) -> Self {
        Self {
            memory,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Record a new event and link it to its most likely cause. Call this after acting on a task so the outcome becomes part of the causal record.")]
    async fn add_event(
        &self,
        Parameters(params): Parameters<AddEventParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.memory.add_event(params.effect).await {
            Ok(event_id) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Recorded event {event_id}."
            ))])),
            Err(err) => Ok(CallToolResult::error(vec![Content::text(err.to_string())])),
        }
    }

    #[tool(description = "Retrieve a causal narrative relevant to a query. Call this before acting on a task to recall relevant context.")]
    async fn query(&self, Parameters(params): Parameters<QueryParams>) -> Result<CallToolResult, McpError> {
        match self.memory.query(&params.query).await {
            Ok(narrative) => Ok(CallToolResult::success(vec![Content::text(narrative)])),
            Err(err) => Ok(CallToolResult::error(vec![Content::text(err.to_string())])),
        }
    }
}

#[tool_handler]
impl ServerHandler for CausalMemoryTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!(
                "Causal event memory: add_event records an observation, query returns a narrative of the chain it belongs to. {PROTOCOL_BANNER}"
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
