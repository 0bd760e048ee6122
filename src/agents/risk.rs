//! Risk profiler.
//!
//! Turns the de-identified intake report into a risk profile narrative.
//! The report text is embedded verbatim in the system prompt; the model
//! never sees the raw form submission thanks to the prompt rewrite.

use async_trait::async_trait;

use crate::llm::LLMClient;
use crate::memory::{ConversationContext, prompt_messages};
use crate::types::{Result, Turn};

use super::{DOCTOR_AGENT, PipelineAgent, rewrite_form_submissions};

const INSTRUCTION: &str = "You are a doctor agent. Analyze the provided medical summary report to create a risk profile for the user.\n\
Explain the risk profile clearly, how it might affect their insurance application, and any extra medical documents they might need.\n\
Ignore if user says something like ok or awesome or great and get on with your task of giving the risk profile.";

/// Stands in for the report when intake has not produced one.
pub const MISSING_REPORT_NOTE: &str = "No medical summary report is available yet.";

pub struct RiskAgent {
    llm: Box<dyn LLMClient>,
    history_window: usize,
}

impl RiskAgent {
    pub fn new(llm: Box<dyn LLMClient>, history_window: usize) -> Self {
        Self {
            llm,
            history_window,
        }
    }

    fn system_prompt(report: Option<&str>) -> String {
        format!(
            "{}\n\nMEDICAL SUMMARY REPORT:\n{}",
            INSTRUCTION,
            report.unwrap_or(MISSING_REPORT_NOTE)
        )
    }
}

#[async_trait]
impl PipelineAgent for RiskAgent {
    fn name(&self) -> &str {
        DOCTOR_AGENT
    }

    async fn run(&self, _turn: &Turn, context: &ConversationContext) -> Result<Vec<Turn>> {
        let system = Self::system_prompt(context.medical_report.as_deref());
        let window = rewrite_form_submissions(context.windowed_history(self.history_window));

        let mut messages = vec![("system".to_string(), system)];
        messages.extend(prompt_messages(&window));

        let profile = self.llm.generate_with_history(&messages).await?;
        Ok(vec![Turn::agent(DOCTOR_AGENT, profile)])
    }
}
