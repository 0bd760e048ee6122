//! Turn router for the intake pipeline.
//!
//! A finite-state machine, not a prompt: each conversation walks
//! `awaiting_intake → awaiting_form_submission → awaiting_risk →
//! awaiting_policy → done`, and the transition out of every stage is
//! validated against what the stage's agent actually produced. A failed
//! or empty turn leaves the stage where it was.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info};

use crate::config::AegisConfig;
use crate::llm::LLMClientFactory;
use crate::memory::{ConversationContext, ConversationStore, PipelineStage};
use crate::protocol::A2aClient;
use crate::tools::retrieval::GetInsurancePlanTool;
use crate::types::{AppError, Result, Turn};

use super::{
    DOCTOR_AGENT, HEALTH_INSURANCE_AGENT, INFORMATION_COLLECTOR, POLICY_AGENT, PipelineAgent,
    PolicyAgent, RemoteAgent, RiskAgent, UNEXPECTED_ERROR_NOTE,
};

const DONE_NOTE: &str = "Your insurance application review is complete. Start a new conversation to begin another application.";

/// Routes each user turn to the pipeline stage it belongs to.
pub struct Orchestrator {
    conversations: Arc<ConversationStore>,
    intake: Arc<dyn PipelineAgent>,
    risk: Arc<dyn PipelineAgent>,
    policy: Arc<dyn PipelineAgent>,
}

impl Orchestrator {
    pub fn new(
        intake: Arc<dyn PipelineAgent>,
        risk: Arc<dyn PipelineAgent>,
        policy: Arc<dyn PipelineAgent>,
    ) -> Self {
        Self {
            conversations: Arc::new(ConversationStore::new()),
            intake,
            risk,
            policy,
        }
    }

    /// Wire up the real pipeline: remote intake adapter, risk profiler
    /// and plan recommender, all sharing the configured request timeout.
    pub async fn from_config(cfg: &AegisConfig) -> Result<Self> {
        let factory = LLMClientFactory::from_config(&cfg.llm)?;
        let timeout = Duration::from_secs(cfg.orchestrator.request_timeout_secs);
        let window = cfg.orchestrator.history_window;

        let remote = A2aClient::new(&cfg.orchestrator.remote_agent_url, timeout)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;
        let plans = Arc::new(GetInsurancePlanTool::new(
            http,
            cfg.orchestrator.retrieval_url.clone(),
        ));

        Ok(Self::new(
            Arc::new(RemoteAgent::new(remote)),
            Arc::new(RiskAgent::new(factory.create_default().await?, window)),
            Arc::new(PolicyAgent::new(
                factory.create_default().await?,
                plans,
                window,
            )),
        ))
    }

    pub fn conversations(&self) -> Arc<ConversationStore> {
        Arc::clone(&self.conversations)
    }

    pub async fn stage(&self, conversation_id: &str) -> Option<PipelineStage> {
        let context = self.conversations.get(conversation_id)?;
        let stage = context.lock().await.stage;
        Some(stage)
    }

    /// Process one user turn: route it to the current stage's agent,
    /// capture the intake report when it appears, and advance the stage
    /// when the agent's output proves the stage completed.
    pub async fn handle_user_turn(
        &self,
        conversation_id: &str,
        turn: Turn,
    ) -> Result<Vec<Turn>> {
        let context = self.conversations.open(conversation_id);
        let mut guard = context.lock().await;
        guard.push(turn.clone());

        let stage = guard.stage;
        info!(conversation_id, stage = ?stage, "routing user turn");

        let agent = match stage {
            PipelineStage::AwaitingIntake | PipelineStage::AwaitingFormSubmission => &self.intake,
            PipelineStage::AwaitingRisk => &self.risk,
            PipelineStage::AwaitingPolicy => &self.policy,
            PipelineStage::Done => {
                let done = Turn::agent(HEALTH_INSURANCE_AGENT, DONE_NOTE);
                guard.push(done.clone());
                return Ok(vec![done]);
            }
        };

        let turns = match agent.run(&turn, &guard).await {
            Ok(turns) => turns,
            Err(err) => {
                error!(
                    conversation_id,
                    agent = agent.name(),
                    error = %err,
                    "agent turn failed"
                );
                vec![Turn::agent(HEALTH_INSURANCE_AGENT, UNEXPECTED_ERROR_NOTE)]
            }
        };

        // After-turn hook: the first intake turn that mentions a report
        // becomes this conversation's medical report.
        for produced in &turns {
            if produced.author.as_deref() == Some(INFORMATION_COLLECTOR)
                && produced.joined_text().to_lowercase().contains("report")
                && guard.set_report_once(produced.joined_text())
            {
                info!(conversation_id, "medical report captured");
            }
        }

        let next = Self::next_stage(stage, &turns, &guard);
        if next != stage {
            info!(conversation_id, from = ?stage, to = ?next, "pipeline advanced");
            guard.stage = next;
        }

        for produced in &turns {
            guard.push(produced.clone());
        }

        Ok(turns)
    }

    fn next_stage(
        stage: PipelineStage,
        turns: &[Turn],
        context: &ConversationContext,
    ) -> PipelineStage {
        match stage {
            PipelineStage::AwaitingIntake | PipelineStage::AwaitingFormSubmission => {
                if context.medical_report.is_some() {
                    PipelineStage::AwaitingRisk
                } else if turns_carry_form(turns) {
                    PipelineStage::AwaitingFormSubmission
                } else {
                    stage
                }
            }
            PipelineStage::AwaitingRisk => {
                if turns
                    .iter()
                    .any(|t| t.author.as_deref() == Some(DOCTOR_AGENT))
                {
                    PipelineStage::AwaitingPolicy
                } else {
                    stage
                }
            }
            PipelineStage::AwaitingPolicy => {
                if turns
                    .iter()
                    .any(|t| t.author.as_deref() == Some(POLICY_AGENT))
                {
                    PipelineStage::Done
                } else {
                    stage
                }
            }
            PipelineStage::Done => PipelineStage::Done,
        }
    }
}

/// Whether any intake turn carries a form payload (serialized JSON with
/// a top-level `form` key).
fn turns_carry_form(turns: &[Turn]) -> bool {
    turns
        .iter()
        .filter(|t| t.author.as_deref() == Some(INFORMATION_COLLECTOR))
        .flat_map(|t| t.text_parts())
        .any(|text| {
            serde_json::from_str::<Value>(text)
                .map(|v| v.get("form").is_some())
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rstest::rstest;
    use std::collections::VecDeque;

    /// Returns one scripted batch of turns per call.
    struct ScriptedAgent {
        name: &'static str,
        script: Mutex<VecDeque<Result<Vec<Turn>>>>,
    }

    impl ScriptedAgent {
        fn new(name: &'static str, script: Vec<Result<Vec<Turn>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait]
    impl PipelineAgent for ScriptedAgent {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(
            &self,
            _turn: &Turn,
            _context: &ConversationContext,
        ) -> Result<Vec<Turn>> {
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn form_turn() -> Turn {
        Turn::agent(
            INFORMATION_COLLECTOR,
            r#"{"type": "form", "form": {"title": "Q"}, "form_data": {}}"#,
        )
    }

    fn report_turn() -> Turn {
        Turn::agent(
            INFORMATION_COLLECTOR,
            "Medical Intake Report\n\nSummary of Information\nHealthy adult.",
        )
    }

    #[rstest]
    #[case::intake_presents_form(
        PipelineStage::AwaitingIntake,
        vec![form_turn()],
        false,
        PipelineStage::AwaitingFormSubmission
    )]
    #[case::intake_without_form_stays(
        PipelineStage::AwaitingIntake,
        vec![Turn::agent(INFORMATION_COLLECTOR, "What is your age?")],
        false,
        PipelineStage::AwaitingIntake
    )]
    #[case::intake_skips_ahead_once_report_exists(
        PipelineStage::AwaitingIntake,
        vec![],
        true,
        PipelineStage::AwaitingRisk
    )]
    #[case::submission_advances_on_report(
        PipelineStage::AwaitingFormSubmission,
        vec![report_turn()],
        true,
        PipelineStage::AwaitingRisk
    )]
    #[case::resubmission_stays_without_report(
        PipelineStage::AwaitingFormSubmission,
        vec![form_turn()],
        false,
        PipelineStage::AwaitingFormSubmission
    )]
    #[case::risk_advances_on_doctor_turn(
        PipelineStage::AwaitingRisk,
        vec![Turn::agent(DOCTOR_AGENT, "Low risk.")],
        true,
        PipelineStage::AwaitingPolicy
    )]
    #[case::risk_ignores_other_authors(
        PipelineStage::AwaitingRisk,
        vec![Turn::agent(INFORMATION_COLLECTOR, "stray turn")],
        true,
        PipelineStage::AwaitingRisk
    )]
    #[case::risk_stays_on_empty_turns(
        PipelineStage::AwaitingRisk,
        vec![],
        true,
        PipelineStage::AwaitingRisk
    )]
    #[case::policy_advances_to_done(
        PipelineStage::AwaitingPolicy,
        vec![Turn::agent(POLICY_AGENT, "Take plan A.")],
        true,
        PipelineStage::Done
    )]
    #[case::done_is_terminal(
        PipelineStage::Done,
        vec![Turn::agent(POLICY_AGENT, "More plans.")],
        true,
        PipelineStage::Done
    )]
    fn stage_transitions_follow_produced_turns(
        #[case] stage: PipelineStage,
        #[case] turns: Vec<Turn>,
        #[case] report_captured: bool,
        #[case] expected: PipelineStage,
    ) {
        let mut context = ConversationContext::new("c1");
        if report_captured {
            context.set_report_once("Medical Intake Report");
        }
        assert_eq!(Orchestrator::next_stage(stage, &turns, &context), expected);
    }

    #[tokio::test]
    async fn walks_the_full_pipeline() {
        let intake = ScriptedAgent::new(
            INFORMATION_COLLECTOR,
            vec![Ok(vec![form_turn()]), Ok(vec![report_turn()])],
        );
        let risk = ScriptedAgent::new(
            DOCTOR_AGENT,
            vec![Ok(vec![Turn::agent(DOCTOR_AGENT, "Low risk.")])],
        );
        let policy = ScriptedAgent::new(
            POLICY_AGENT,
            vec![Ok(vec![Turn::agent(POLICY_AGENT, "Take plan A.")])],
        );
        let orchestrator = Orchestrator::new(intake, risk, policy);

        orchestrator
            .handle_user_turn("c1", Turn::user("I want insurance"))
            .await
            .unwrap();
        assert_eq!(
            orchestrator.stage("c1").await,
            Some(PipelineStage::AwaitingFormSubmission)
        );

        orchestrator
            .handle_user_turn("c1", Turn::user(r#"{"form_data": {"age": "40"}}"#))
            .await
            .unwrap();
        assert_eq!(
            orchestrator.stage("c1").await,
            Some(PipelineStage::AwaitingRisk)
        );

        let risk_turns = orchestrator
            .handle_user_turn("c1", Turn::user("ok"))
            .await
            .unwrap();
        assert_eq!(risk_turns[0].joined_text(), "Low risk.");
        assert_eq!(
            orchestrator.stage("c1").await,
            Some(PipelineStage::AwaitingPolicy)
        );

        orchestrator
            .handle_user_turn("c1", Turn::user("great"))
            .await
            .unwrap();
        assert_eq!(orchestrator.stage("c1").await, Some(PipelineStage::Done));

        let done_turns = orchestrator
            .handle_user_turn("c1", Turn::user("anything else?"))
            .await
            .unwrap();
        assert_eq!(done_turns[0].joined_text(), DONE_NOTE);

        // The report was captured on the way through.
        let context = orchestrator.conversations().get("c1").unwrap();
        let report = context.lock().await.medical_report.clone().unwrap();
        assert!(report.contains("Medical Intake Report"));
    }

    #[tokio::test]
    async fn connectivity_errors_do_not_advance_the_stage() {
        let intake = ScriptedAgent::new(
            INFORMATION_COLLECTOR,
            vec![Ok(vec![Turn::agent(
                INFORMATION_COLLECTOR,
                "Failed to connect to the remote agent at http://localhost:10010.",
            )])],
        );
        let risk = ScriptedAgent::new(DOCTOR_AGENT, vec![]);
        let policy = ScriptedAgent::new(POLICY_AGENT, vec![]);
        let orchestrator = Orchestrator::new(intake, risk, policy);

        let turns = orchestrator
            .handle_user_turn("c1", Turn::user("I want insurance"))
            .await
            .unwrap();
        assert!(turns[0].joined_text().contains("Failed to connect"));
        assert_eq!(
            orchestrator.stage("c1").await,
            Some(PipelineStage::AwaitingIntake)
        );
    }

    #[tokio::test]
    async fn agent_failures_become_one_error_turn() {
        let intake = ScriptedAgent::new(
            INFORMATION_COLLECTOR,
            vec![Err(AppError::LLM("model unavailable".to_string()))],
        );
        let risk = ScriptedAgent::new(DOCTOR_AGENT, vec![]);
        let policy = ScriptedAgent::new(POLICY_AGENT, vec![]);
        let orchestrator = Orchestrator::new(intake, risk, policy);

        let turns = orchestrator
            .handle_user_turn("c1", Turn::user("hello"))
            .await
            .unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].joined_text(), UNEXPECTED_ERROR_NOTE);
        assert_eq!(turns[0].author.as_deref(), Some(HEALTH_INSURANCE_AGENT));
        assert_eq!(
            orchestrator.stage("c1").await,
            Some(PipelineStage::AwaitingIntake)
        );
    }
}
