//! Insurance plan lookup tool.
//!
//! Queries the plan retrieval service over HTTP. The policy agent calls
//! this with a condition summary and receives the closest-matching plan
//! passages to ground its recommendation.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::retrieval::{SearchRequest, SearchResponse};
use crate::tools::registry::Tool;
use crate::types::{AppError, Result};

/// Searches the plan retrieval service for relevant insurance plans.
pub struct GetInsurancePlanTool {
    client: reqwest::Client,
    base_url: String,
}

impl GetInsurancePlanTool {
    /// Create a tool targeting the retrieval service at `base_url`.
    ///
    /// The `reqwest::Client` is shared so repeated lookups reuse the
    /// same connection pool.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Tool for GetInsurancePlanTool {
    fn name(&self) -> &str {
        "get_insurance_plan"
    }

    fn description(&self) -> &str {
        "Search available health insurance plans for coverage matching a medical profile"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Medical conditions or coverage needs to search plans for"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'query' parameter".to_string()))?;

        let request = SearchRequest {
            query: query.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Plan search request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Retrieval(format!("Plan search failed: {}", e)))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Invalid plan search response: {}", e)))?;

        let results = serde_json::to_value(&body.results)
            .map_err(|e| AppError::Retrieval(format!("Invalid plan search response: {}", e)))?;

        Ok(json!({
            "query": query,
            "results": results,
            "count": body.results.len()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition() {
        let tool = GetInsurancePlanTool::new(reqwest::Client::new(), "http://localhost:15001");
        assert_eq!(tool.name(), "get_insurance_plan");
        assert!(!tool.description().is_empty());

        let schema = tool.parameters_schema();
        assert!(schema["properties"]["query"].is_object());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let tool = GetInsurancePlanTool::new(reqwest::Client::new(), "http://localhost:15001/");
        assert_eq!(tool.base_url, "http://localhost:15001");
    }

    #[tokio::test]
    async fn missing_query_is_invalid_input() {
        let tool = GetInsurancePlanTool::new(reqwest::Client::new(), "http://localhost:15001");
        let result = tool.execute(json!({})).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
