//! Conversation state for the intake pipeline.
//!
//! Each conversation owns its pipeline stage, its turn history, and the
//! medical report once intake produces one. The report never leaves the
//! conversation it belongs to; concurrent conversations cannot observe
//! each other's state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::types::{Turn, TurnRole};

/// Default number of recent turns handed to an agent.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Where a conversation sits in the intake pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Intake has not yet asked for the questionnaire.
    AwaitingIntake,
    /// The form went out; the next user turn should carry `form_data`.
    AwaitingFormSubmission,
    /// A report exists; the risk profile has not been produced yet.
    AwaitingRisk,
    /// Risk profile delivered; the plan recommendation is next.
    AwaitingPolicy,
    /// The pipeline has run to completion for this conversation.
    Done,
}

/// Mutable state of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub conversation_id: String,
    pub stage: PipelineStage,
    pub history: Vec<Turn>,
    /// De-identified intake report, set exactly once.
    pub medical_report: Option<String>,
}

impl ConversationContext {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            stage: PipelineStage::AwaitingIntake,
            history: Vec::new(),
            medical_report: None,
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
    }

    /// The most recent `window` turns, oldest first.
    pub fn windowed_history(&self, window: usize) -> &[Turn] {
        if self.history.len() <= window {
            &self.history
        } else {
            &self.history[self.history.len() - window..]
        }
    }

    /// Store the medical report unless one is already present. Returns
    /// whether this call stored it.
    pub fn set_report_once(&mut self, report: impl Into<String>) -> bool {
        if self.medical_report.is_some() {
            return false;
        }
        self.medical_report = Some(report.into());
        true
    }
}

/// All live conversations, keyed by conversation id.
///
/// Contexts sit behind an async mutex because a pipeline turn holds the
/// lock across agent calls; two turns on the same conversation serialize
/// instead of interleaving.
#[derive(Default)]
pub struct ConversationStore {
    conversations: RwLock<HashMap<String, Arc<Mutex<ConversationContext>>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a conversation, creating it on first use.
    pub fn open(&self, conversation_id: &str) -> Arc<Mutex<ConversationContext>> {
        if let Some(context) = self.conversations.read().get(conversation_id) {
            return Arc::clone(context);
        }

        let mut conversations = self.conversations.write();
        Arc::clone(
            conversations
                .entry(conversation_id.to_string())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(ConversationContext::new(conversation_id)))
                }),
        )
    }

    pub fn get(&self, conversation_id: &str) -> Option<Arc<Mutex<ConversationContext>>> {
        self.conversations.read().get(conversation_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.conversations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.read().is_empty()
    }
}

/// Turn history as (role, content) pairs for chat-style prompting.
///
/// Agent turns keep their author out of the role; the model only needs
/// user/assistant alternation. Turns without text render their data
/// parts as compact JSON so form submissions stay visible to the model.
pub fn prompt_messages(turns: &[Turn]) -> Vec<(String, String)> {
    turns
        .iter()
        .map(|turn| {
            let role = match turn.role {
                TurnRole::User => "user".to_string(),
                TurnRole::Agent => "assistant".to_string(),
            };
            let content = if turn.has_text() {
                turn.joined_text()
            } else {
                turn.parts
                    .iter()
                    .filter_map(|part| match part {
                        crate::types::TurnPart::Data { data } => {
                            serde_json::to_string(data).ok()
                        }
                        crate::types::TurnPart::Text { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            (role, content)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TurnPart;
    use serde_json::json;

    #[test]
    fn new_conversations_start_at_intake() {
        let context = ConversationContext::new("c1");
        assert_eq!(context.stage, PipelineStage::AwaitingIntake);
        assert!(context.history.is_empty());
        assert!(context.medical_report.is_none());
    }

    #[test]
    fn open_returns_the_same_context() {
        let store = ConversationStore::new();
        let first = store.open("c1");
        let second = store.open("c1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn windowed_history_keeps_most_recent() {
        let mut context = ConversationContext::new("c1");
        for i in 0..6 {
            context.push(Turn::user(format!("turn {}", i)));
        }

        let window = context.windowed_history(4);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].joined_text(), "turn 2");
        assert_eq!(window[3].joined_text(), "turn 5");

        assert_eq!(context.windowed_history(100).len(), 6);
    }

    #[test]
    fn report_is_written_once() {
        let mut context = ConversationContext::new("c1");
        assert!(context.set_report_once("first report"));
        assert!(!context.set_report_once("second report"));
        assert_eq!(context.medical_report.as_deref(), Some("first report"));
    }

    #[test]
    fn prompt_messages_map_roles_and_data() {
        let turns = vec![
            Turn::user("hello"),
            Turn::agent("insurance_agent", "fill this form"),
            Turn::user_parts(vec![TurnPart::data(json!({"form_data": {"age": "44"}}))]),
        ];

        let messages = prompt_messages(&turns);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], ("user".to_string(), "hello".to_string()));
        assert_eq!(messages[1].0, "assistant");
        assert_eq!(messages[2].0, "user");
        assert!(messages[2].1.contains("form_data"));
    }

    #[tokio::test]
    async fn contexts_mutate_through_the_store() {
        let store = ConversationStore::new();
        {
            let context = store.open("c1");
            let mut guard = context.lock().await;
            guard.stage = PipelineStage::AwaitingRisk;
            guard.set_report_once("report body");
        }

        let context = store.open("c1");
        let guard = context.lock().await;
        assert_eq!(guard.stage, PipelineStage::AwaitingRisk);
        assert_eq!(guard.medical_report.as_deref(), Some("report body"));
    }
}
