//! Remote intake adapter.
//!
//! Bridges the orchestrator's turn model onto the task protocol: text
//! parts of the user turn go out as a wire message, the resulting task
//! or message comes back as a conversation turn. Task and context ids
//! are remembered per conversation so the remote server continues the
//! same task across turns.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::memory::ConversationContext;
use crate::protocol::{A2aClient, Message, Part, SendMessageResult, Task, TaskState};
use crate::types::{AppError, Result, Turn, TurnPart};

use super::{INFORMATION_COLLECTOR, PipelineAgent, UNEXPECTED_ERROR_NOTE};

#[derive(Debug, Clone)]
struct SessionIds {
    task_id: String,
    context_id: String,
}

/// Client-side adapter for the remote intake agent.
pub struct RemoteAgent {
    client: A2aClient,
    sessions: RwLock<HashMap<String, SessionIds>>,
}

impl RemoteAgent {
    pub fn new(client: A2aClient) -> Self {
        Self {
            client,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Build the outgoing wire message from the turn's text parts,
    /// attaching stored task/context ids when the conversation already
    /// has a remote task. A turn without text yields nothing.
    fn outgoing_message(&self, conversation_id: &str, turn: &Turn) -> Option<Message> {
        let parts: Vec<Part> = turn.text_parts().map(Part::text).collect();
        if parts.is_empty() {
            return None;
        }

        let stored = self.sessions.read().get(conversation_id).cloned();
        let message = Message::user(parts);
        Some(match stored {
            Some(ids) => message.with_task(Some(ids.task_id), Some(ids.context_id)),
            None => message,
        })
    }

    fn remember_task(&self, conversation_id: &str, task: &Task) {
        self.sessions.write().insert(
            conversation_id.to_string(),
            SessionIds {
                task_id: task.id.clone(),
                context_id: task.context_id.clone(),
            },
        );
    }

    /// Wire parts back into turn parts. Structured data is re-encoded as
    /// serialized JSON text, which is how the form payload reaches the
    /// user.
    fn translate_parts(parts: &[Part]) -> Vec<TurnPart> {
        parts
            .iter()
            .map(|part| match part {
                Part::Text { text } => TurnPart::text(text.clone()),
                Part::Data { data } => TurnPart::text(data.to_string()),
            })
            .collect()
    }

    fn translate_task(&self, conversation_id: &str, task: &Task) -> Vec<Turn> {
        self.remember_task(conversation_id, task);

        let parts: Vec<TurnPart> = if task.status.state == TaskState::InputRequired {
            task.status
                .message
                .as_ref()
                .map(|message| Self::translate_parts(&message.parts))
                .unwrap_or_default()
        } else if !task.artifacts.is_empty() {
            task.artifacts
                .iter()
                .flat_map(|artifact| Self::translate_parts(&artifact.parts))
                .collect()
        } else if let Some(message) = &task.status.message {
            Self::translate_parts(&message.parts)
        } else {
            Vec::new()
        };

        if parts.is_empty() {
            warn!(
                task_id = %task.id,
                state = ?task.status.state,
                "remote task carried no translatable content"
            );
            return Vec::new();
        }

        vec![Turn::agent_parts(INFORMATION_COLLECTOR, parts)]
    }
}

#[async_trait]
impl PipelineAgent for RemoteAgent {
    fn name(&self) -> &str {
        INFORMATION_COLLECTOR
    }

    async fn run(&self, turn: &Turn, context: &ConversationContext) -> Result<Vec<Turn>> {
        let Some(message) = self.outgoing_message(&context.conversation_id, turn) else {
            debug!(
                conversation_id = %context.conversation_id,
                "turn has no text parts, nothing to forward"
            );
            return Ok(Vec::new());
        };

        match self.client.send_message(message).await {
            Ok(SendMessageResult::Task(task)) => {
                Ok(self.translate_task(&context.conversation_id, &task))
            }
            Ok(SendMessageResult::Message(reply)) => {
                let parts = Self::translate_parts(&reply.parts);
                Ok(vec![Turn::agent_parts(INFORMATION_COLLECTOR, parts)])
            }
            Err(AppError::Transport(err)) => {
                error!(
                    error = %err,
                    url = %self.client.base_url(),
                    "transport failure reaching remote agent"
                );
                Ok(vec![Turn::agent(
                    INFORMATION_COLLECTOR,
                    format!(
                        "Failed to connect to the remote agent at {}.",
                        self.client.base_url()
                    ),
                )])
            }
            Err(AppError::Protocol(server_message)) => {
                error!(error = %server_message, "remote agent returned an error");
                Ok(vec![Turn::agent(
                    INFORMATION_COLLECTOR,
                    format!("Error communicating with remote agent: {}", server_message),
                )])
            }
            Err(err) => {
                error!(error = %err, "unexpected failure in remote agent call");
                Ok(vec![Turn::agent(INFORMATION_COLLECTOR, UNEXPECTED_ERROR_NOTE)])
            }
        }
    }
}
