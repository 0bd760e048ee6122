//! Plan recommender.
//!
//! Three fixed steps per turn: derive a search query from the medical
//! summary report, look up matching plans through the retrieval tool,
//! then have the model present the hits as a recommendation. The tool
//! call happens in code; the model only shapes text.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::llm::LLMClient;
use crate::memory::{ConversationContext, prompt_messages};
use crate::tools::Tool;
use crate::types::{Result, Turn};

use super::risk::MISSING_REPORT_NOTE;
use super::{POLICY_AGENT, PipelineAgent, rewrite_form_submissions};

const INSTRUCTION: &str = "You are a policy agent. Your job is to find the best insurance plan.\n\
First, understand the user's requirements from the given medical summary report.\n\
Use their medical summary report to create a detailed query for the get_insurance_plan tool.\n\
Finally, present the recommended plans to the user in a clear format.";

const QUERY_INSTRUCTION: &str = "Write one concise search query describing the coverage needs \
implied by the medical summary report. Respond with only the query text.";

pub struct PolicyAgent {
    llm: Box<dyn LLMClient>,
    plans: Arc<dyn Tool>,
    history_window: usize,
}

impl PolicyAgent {
    pub fn new(llm: Box<dyn LLMClient>, plans: Arc<dyn Tool>, history_window: usize) -> Self {
        Self {
            llm,
            plans,
            history_window,
        }
    }

    fn system_prompt(report: Option<&str>) -> String {
        format!(
            "{}\n\nUSER'S MEDICAL SUMMARY REPORT:\n{}",
            INSTRUCTION,
            report.unwrap_or(MISSING_REPORT_NOTE)
        )
    }
}

#[async_trait]
impl PipelineAgent for PolicyAgent {
    fn name(&self) -> &str {
        POLICY_AGENT
    }

    async fn run(&self, _turn: &Turn, context: &ConversationContext) -> Result<Vec<Turn>> {
        let system = Self::system_prompt(context.medical_report.as_deref());

        let query = self
            .llm
            .generate_with_system(&system, QUERY_INSTRUCTION)
            .await?;
        let query = query.trim().trim_matches('"').to_string();
        debug!(%query, "derived plan search query");

        let hits = self.plans.execute(json!({ "query": query })).await?;
        let rendered_hits =
            serde_json::to_string_pretty(&hits).unwrap_or_else(|_| hits.to_string());

        let window = rewrite_form_submissions(context.windowed_history(self.history_window));
        let mut messages = vec![("system".to_string(), system)];
        messages.extend(prompt_messages(&window));
        messages.push((
            "user".to_string(),
            format!(
                "Insurance plans matching the profile:\n{}\n\nPresent the recommended plans to the user in a clear format.",
                rendered_hits
            ),
        ));

        let recommendation = self.llm.generate_with_history(&messages).await?;
        Ok(vec![Turn::agent(POLICY_AGENT, recommendation)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;
    use parking_lot::Mutex;
    use serde_json::Value;

    struct ScriptedLLM {
        query_reply: String,
        final_reply: String,
        final_messages: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl LLMClient for ScriptedLLM {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(AppError::LLM("unexpected generate call".to_string()))
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.query_reply.clone())
        }

        async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
            *self.final_messages.lock() = messages.to_vec();
            Ok(self.final_reply.clone())
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct StubPlans {
        last_args: Arc<Mutex<Option<Value>>>,
    }

    #[async_trait]
    impl Tool for StubPlans {
        fn name(&self) -> &str {
            "get_insurance_plan"
        }

        fn description(&self) -> &str {
            "stub"
        }

        fn parameters_schema(&self) -> Value {
            json!({})
        }

        async fn execute(&self, args: Value) -> Result<Value> {
            *self.last_args.lock() = Some(args);
            Ok(json!({
                "results": [
                    {"id": "plan-a", "text": "Comprehensive maternity cover"},
                    {"id": "plan-b", "text": "Basic hospital plan"}
                ],
                "count": 2
            }))
        }
    }

    #[tokio::test]
    async fn derives_query_then_recommends_from_hits() {
        let tool_args = Arc::new(Mutex::new(None));
        let final_messages = Arc::new(Mutex::new(Vec::new()));

        let agent = PolicyAgent::new(
            Box::new(ScriptedLLM {
                query_reply: "\"maternity coverage for low-risk profile\"\n".to_string(),
                final_reply: "Plan A fits best.".to_string(),
                final_messages: Arc::clone(&final_messages),
            }),
            Arc::new(StubPlans {
                last_args: Arc::clone(&tool_args),
            }),
            10,
        );

        let mut context = ConversationContext::new("c1");
        context.set_report_once("Medical Intake Report: expecting, otherwise healthy");
        let turn = Turn::user("what plan should I pick?");
        context.push(turn.clone());

        let turns = agent.run(&turn, &context).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].author.as_deref(), Some(POLICY_AGENT));
        assert_eq!(turns[0].joined_text(), "Plan A fits best.");

        // Quotes and whitespace from the model are stripped before search.
        let args = tool_args.lock().clone().unwrap();
        assert_eq!(args["query"], "maternity coverage for low-risk profile");

        let messages = final_messages.lock().clone();
        assert!(messages[0].1.contains("expecting, otherwise healthy"));
        assert!(
            messages
                .last()
                .unwrap()
                .1
                .contains("Comprehensive maternity cover")
        );
    }

    #[tokio::test]
    async fn tool_failure_propagates_as_an_error() {
        struct FailingPlans;

        #[async_trait]
        impl Tool for FailingPlans {
            fn name(&self) -> &str {
                "get_insurance_plan"
            }
            fn description(&self) -> &str {
                "stub"
            }
            fn parameters_schema(&self) -> Value {
                json!({})
            }
            async fn execute(&self, _args: Value) -> Result<Value> {
                Err(AppError::Retrieval("index offline".to_string()))
            }
        }

        let agent = PolicyAgent::new(
            Box::new(ScriptedLLM {
                query_reply: "anything".to_string(),
                final_reply: "unused".to_string(),
                final_messages: Arc::new(Mutex::new(Vec::new())),
            }),
            Arc::new(FailingPlans),
            10,
        );

        let context = ConversationContext::new("c1");
        let err = agent
            .run(&Turn::user("recommend a plan"), &context)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
    }
}
