use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::AegisConfig;
use crate::retrieval::PLAN_RESULT_COUNT;
use crate::retrieval::server::RetrievalState;

/// Parameters for plan retrieval
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetInsurancePlanParams {
    /// The coverage being looked for, including relevant risk factors
    pub query: String,
}

/// MCP Server for AEGIS - exposes the insurance plan corpus to MCP hosts
#[derive(Clone)]
pub struct AegisMcpServer {
    state: RetrievalState,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AegisMcpServer {
    pub fn new(state: RetrievalState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    /// Retrieve the insurance plans that best match a coverage query
    #[tool(description = "Retrieve the insurance plans that best match a coverage query")]
    async fn get_insurance_plan(
        &self,
        params: Parameters<GetInsurancePlanParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = params.0.query;

        let embeddings = match self
            .state
            .embedder
            .embed(std::slice::from_ref(&query))
            .await
        {
            Ok(embeddings) => embeddings,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Plan search failed: {}",
                    e
                ))]));
            }
        };
        let Some(query_vector) = embeddings.into_iter().next() else {
            return Ok(CallToolResult::error(vec![Content::text(
                "Plan search failed: embedding backend returned no vector",
            )]));
        };

        match self
            .state
            .store
            .search_plans(&query_vector, PLAN_RESULT_COUNT)
        {
            Ok(hits) => {
                let passages: Vec<String> = hits
                    .iter()
                    .map(|hit| format!("**{}** (score {:.3})\n{}", hit.id, hit.score, hit.text))
                    .collect();

                let content = if passages.is_empty() {
                    format!("No insurance plans found for: {}", query)
                } else {
                    passages.join("\n\n---\n\n")
                };

                Ok(CallToolResult::success(vec![Content::text(content)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Plan search failed: {}",
                e
            ))])),
        }
    }
}

impl ServerHandler for AegisMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::default(),
            server_info: Implementation {
                name: "aegis-mcp-server".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "AEGIS MCP Server - finds health insurance plans matching a coverage query"
                    .into(),
            ),
        }
    }
}

/// Start the MCP server with stdio transport
pub async fn start_stdio_server(cfg: &AegisConfig) -> crate::types::Result<()> {
    use rmcp::{ServiceExt, transport::io::stdio};

    let state = RetrievalState::from_config(cfg).await?;
    let service = AegisMcpServer::new(state)
        .serve(stdio())
        .await
        .map_err(|e| crate::types::AppError::Internal(format!("MCP server error: {}", e)))?;

    service
        .waiting()
        .await
        .map_err(|e| crate::types::AppError::Internal(format!("MCP server error: {}", e)))?;

    Ok(())
}
