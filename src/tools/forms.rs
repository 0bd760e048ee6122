//! Form handling tools for the intake agent.
//!
//! The intake flow uses exactly two tools: `fetch_schema` loads the
//! health intake form definition, and `present_form` wraps a schema in
//! the structured payload clients render as a fillable form.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::forms::{FormRegistry, form_payload};
use crate::tools::registry::Tool;
use crate::types::{AppError, Result};

/// Loads the intake form schema from the form registry.
pub struct FetchSchemaTool {
    registry: Arc<FormRegistry>,
}

impl FetchSchemaTool {
    pub fn new(registry: Arc<FormRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for FetchSchemaTool {
    fn name(&self) -> &str {
        "fetch_schema"
    }

    fn description(&self) -> &str {
        "Fetch the health intake form schema"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        self.registry.fetch_schema().await
    }
}

/// Wraps a form schema in the payload presented to the user.
pub struct PresentFormTool;

impl PresentFormTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PresentFormTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for PresentFormTool {
    fn name(&self) -> &str {
        "present_form"
    }

    fn description(&self) -> &str {
        "Present a form to the user for completion"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "schema": {
                    "type": "object",
                    "description": "The form schema to present"
                }
            },
            "required": ["schema"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let schema = args
            .get("schema")
            .cloned()
            .ok_or_else(|| AppError::InvalidInput("Missing 'schema' parameter".to_string()))?;

        Ok(form_payload(schema))
    }
}
