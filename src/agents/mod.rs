//! The agents that make up the insurance intake pipeline.
//!
//! Three of them run behind the orchestrator: the remote intake adapter
//! (`information_collector`), the risk profiler (`doctor_agent`) and the
//! plan recommender (`policy_agent`). The intake agent itself lives in a
//! separate process behind the task protocol server; see
//! [`intake::IntakeAgent`].

pub mod intake;
pub mod orchestrator;
pub mod policy;
pub mod remote;
pub mod risk;

use async_trait::async_trait;

use crate::types::{Result, Turn, TurnPart, TurnRole};

pub use intake::IntakeAgent;
pub use orchestrator::Orchestrator;
pub use policy::PolicyAgent;
pub use remote::RemoteAgent;
pub use risk::RiskAgent;

/// Author name on turns produced by the remote intake adapter.
pub const INFORMATION_COLLECTOR: &str = "information_collector";
/// Author name on turns produced by the risk profiler.
pub const DOCTOR_AGENT: &str = "doctor_agent";
/// Author name on turns produced by the plan recommender.
pub const POLICY_AGENT: &str = "policy_agent";
/// Author name on turns the orchestrator emits itself.
pub const HEALTH_INSURANCE_AGENT: &str = "health_insurance_agent";

/// Replacement text for raw form submissions in downstream prompts.
pub const FORM_SUMMARIZED_NOTE: &str =
    "Form submitted by user which was summarized by the information collector.";

/// Catch-all user-facing error for failures we cannot explain better.
pub const UNEXPECTED_ERROR_NOTE: &str =
    "An unexpected error occurred while processing your request.";

/// One pipeline stage behind the orchestrator.
///
/// `turn` is the inbound user turn, already appended to the context
/// history. An empty result means the agent had nothing to say for this
/// turn (a no-op, not an error).
#[async_trait]
pub trait PipelineAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn run(
        &self,
        turn: &Turn,
        context: &crate::memory::ConversationContext,
    ) -> Result<Vec<Turn>>;
}

/// Replace raw form submissions in user turns before they reach a model.
///
/// Any user text part containing `form_data` becomes the fixed
/// summarized-form note; every other part is kept as-is, so multi-part
/// turns lose nothing but the raw form JSON.
pub fn rewrite_form_submissions(turns: &[Turn]) -> Vec<Turn> {
    turns
        .iter()
        .map(|turn| {
            if turn.role != TurnRole::User {
                return turn.clone();
            }

            let mut rewritten = turn.clone();
            for part in &mut rewritten.parts {
                if let TurnPart::Text { text } = part {
                    if text.contains("form_data") {
                        *part = TurnPart::text(FORM_SUMMARIZED_NOTE);
                    }
                }
            }
            rewritten
        })
        .collect()
}
