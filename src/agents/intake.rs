//! The intake agent served behind the task protocol.
//!
//! First contact runs the two form tools in strict order and hands the
//! questionnaire back as a structured form payload. A submission whose
//! JSON body carries a `form_data` key skips the tools entirely and goes
//! straight to report generation. Identifier values from the submission
//! are scrubbed out of the generated report even if the model repeats
//! them.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::forms::FormRegistry;
use crate::llm::LLMClient;
use crate::protocol::{IntakeHandler, IntakeOutcome};
use crate::tools::ToolRegistry;
use crate::tools::forms::{FetchSchemaTool, PresentFormTool};
use crate::types::{AppError, Result};

const REPORT_INSTRUCTION: &str = "You are an information collector agent for health insurance applications. \
The user has submitted a filled questionnaire form.\n\
Analyze the information and generate a concise risk assessment report titled \"Medical Intake Report\" \
with \"Summary of Information\" and \"Identified Risk Factors\" sections.\n\
Make sure it contains no Personally Identifiable Information: never repeat names, exact ages, addresses \
or other identifying values verbatim; describe them in general terms instead.\n\
Output only the report text.";

/// Collects a user's medical history through a questionnaire form and
/// summarizes the submission into a de-identified report.
pub struct IntakeAgent {
    llm: Box<dyn LLMClient>,
    tools: ToolRegistry,
}

impl IntakeAgent {
    pub fn new(llm: Box<dyn LLMClient>, forms: Arc<FormRegistry>) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(FetchSchemaTool::new(forms)));
        tools.register(Arc::new(PresentFormTool::new()));
        Self { llm, tools }
    }

    /// Fetch the schema, then wrap it as a form payload. Tool order is
    /// fixed; a schema read failure fails the whole turn.
    async fn present_form(&self) -> Result<Value> {
        let schema = self.tools.execute("fetch_schema", json!({})).await?;
        self.tools
            .execute("present_form", json!({ "schema": schema }))
            .await
    }

    async fn summarize(&self, form_data: &Value) -> Result<String> {
        let content = serde_json::to_string(form_data)
            .map_err(|e| AppError::Internal(format!("failed to encode form data: {}", e)))?;
        let report = self
            .llm
            .generate_with_system(REPORT_INSTRUCTION, &content)
            .await?;
        Ok(scrub_identifiers(&report, form_data))
    }
}

/// Whether a form field holds a direct identifier.
fn is_identifier_key(key: &str) -> bool {
    const MARKERS: [&str; 7] = [
        "name", "address", "email", "phone", "contact", "birth", "member",
    ];
    let key = key.to_ascii_lowercase();
    MARKERS.iter().any(|marker| key.contains(marker))
}

/// Remove submitted identifier values from the report narrative.
///
/// The system prompt already forbids repeating them, but the model is
/// not trusted on it: any identifier value that survives generation is
/// replaced in code.
fn scrub_identifiers(report: &str, form_data: &Value) -> String {
    let Some(fields) = form_data.as_object() else {
        return report.to_string();
    };

    let mut scrubbed = report.to_string();
    for (key, value) in fields {
        if !is_identifier_key(key) {
            continue;
        }
        let Some(value) = value.as_str() else {
            continue;
        };
        let value = value.trim();
        // Short or filler values would shred unrelated words.
        if value.len() < 3 || value.eq_ignore_ascii_case("none") {
            continue;
        }
        scrubbed = replace_ignore_ascii_case(&scrubbed, value, "[redacted]");
    }
    scrubbed
}

fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
    let folded_haystack = haystack.to_ascii_lowercase();
    let folded_needle = needle.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    while let Some(found) = folded_haystack[cursor..].find(&folded_needle) {
        let start = cursor + found;
        out.push_str(&haystack[cursor..start]);
        out.push_str(replacement);
        cursor = start + needle.len();
    }
    out.push_str(&haystack[cursor..]);
    out
}

#[async_trait]
impl IntakeHandler for IntakeAgent {
    async fn handle(&self, query: &str, context_id: &str) -> Result<IntakeOutcome> {
        if let Ok(value) = serde_json::from_str::<Value>(query) {
            if let Some(form_data) = value.get("form_data") {
                info!(context_id, "form submission received, generating report");
                let report = self.summarize(form_data).await?;
                return Ok(IntakeOutcome::Report(report));
            }
        }

        debug!(context_id, "presenting intake form");
        let payload = self.present_form().await?;
        if payload.get("form").is_some() {
            Ok(IntakeOutcome::Form(payload))
        } else {
            Ok(IntakeOutcome::Unrecognized(payload.to_string()))
        }
    }
}
