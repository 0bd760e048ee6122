//! Wire types for the task protocol.
//!
//! JSON-RPC 2.0 envelopes around a small task vocabulary: messages made
//! of text/data parts, tasks with a lifecycle status, and artifacts
//! attached to completed tasks. Field names follow the wire convention
//! (`taskId`, `contextId`), task states are kebab-case strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// JSON-RPC protocol version sent in every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes used by the task protocol.
pub mod error_codes {
    /// Request body is not parseable JSON.
    pub const PARSE_ERROR: i64 = -32700;
    /// Envelope is structurally invalid (wrong version, missing fields).
    pub const INVALID_REQUEST: i64 = -32600;
    /// Unknown method name.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Params do not match the method's expected shape.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Server-side failure while handling the request.
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Referenced task id is unknown.
    pub const TASK_NOT_FOUND: i64 = -32001;
    /// The method exists but this server does not support it.
    pub const UNSUPPORTED_OPERATION: i64 = -32004;
}

// ============= JSON-RPC Envelope =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Value::String(Uuid::new_v4().simple().to_string()),
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(
            error_codes::PARSE_ERROR,
            format!("Invalid JSON payload: {}", detail),
        )
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self::new(
            error_codes::INVALID_REQUEST,
            format!("Request payload validation error: {}", detail),
        )
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(
            error_codes::INVALID_PARAMS,
            format!("Invalid parameters: {}", detail),
        )
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::new(
            error_codes::INTERNAL_ERROR,
            format!("Internal error: {}", detail),
        )
    }

    pub fn task_not_found() -> Self {
        Self::new(error_codes::TASK_NOT_FOUND, "Task not found")
    }

    pub fn unsupported_operation() -> Self {
        Self::new(
            error_codes::UNSUPPORTED_OPERATION,
            "This operation is not supported",
        )
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// ============= Messages and Parts =============

/// Who authored a message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

/// One piece of message content, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: Value },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn data(data: Value) -> Self {
        Part::Data { data }
    }

    /// The text content, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::Data { .. } => None,
        }
    }
}

fn message_kind() -> String {
    "message".to_string()
}

/// A single message exchanged between client and agent server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: MessageRole,
    pub parts: Vec<Part>,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default = "message_kind")]
    pub kind: String,
}

impl Message {
    /// A user message carrying the given parts.
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: MessageRole::User,
            parts,
            message_id: Uuid::new_v4().simple().to_string(),
            task_id: None,
            context_id: None,
            kind: message_kind(),
        }
    }

    /// Attach task/context ids so the server continues an existing task.
    pub fn with_task(mut self, task_id: Option<String>, context_id: Option<String>) -> Self {
        self.task_id = task_id;
        self.context_id = context_id;
        self
    }

    /// An agent text message scoped to a task.
    pub fn agent_text(text: impl Into<String>, task_id: &str, context_id: &str) -> Self {
        Self::agent_parts(vec![Part::text(text)], task_id, context_id)
    }

    /// An agent message with arbitrary parts scoped to a task.
    pub fn agent_parts(parts: Vec<Part>, task_id: &str, context_id: &str) -> Self {
        Self {
            role: MessageRole::Agent,
            parts,
            message_id: Uuid::new_v4().simple().to_string(),
            task_id: Some(task_id.to_string()),
            context_id: Some(context_id.to_string()),
            kind: message_kind(),
        }
    }

    /// All text part contents joined with newlines.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============= Tasks =============

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Failed,
    Canceled,
}

impl TaskState {
    /// Terminal states end a task; a new task must be created to
    /// continue the conversation. `input-required` is not terminal, the
    /// same task resumes when the user answers.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TaskStatus {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: Some(Utc::now()),
        }
    }

    pub fn with_message(state: TaskState, message: Message) -> Self {
        Self {
            state,
            message: Some(message),
            timestamp: Some(Utc::now()),
        }
    }
}

/// A named output attached to a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub artifact_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub parts: Vec<Part>,
}

impl Artifact {
    pub fn named(name: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            artifact_id: Uuid::new_v4().simple().to_string(),
            name: Some(name.into()),
            parts,
        }
    }
}

fn task_kind() -> String {
    "task".to_string()
}

/// A server-tracked unit of work for one user request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,
    #[serde(default = "task_kind")]
    pub kind: String,
}

impl Task {
    /// Create a freshly submitted task for an inbound message.
    ///
    /// Context id comes from the message when present, otherwise a new
    /// conversation context is opened.
    pub fn submitted(message: &Message) -> Self {
        let context_id = message
            .context_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        Self {
            id: Uuid::new_v4().simple().to_string(),
            context_id,
            status: TaskStatus::new(TaskState::Submitted),
            artifacts: Vec::new(),
            history: vec![message.clone()],
            kind: task_kind(),
        }
    }
}

// ============= Method Params and Results =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSendParams {
    pub message: Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,
}

/// Result of `message/send`: a task, or a bare message for exchanges
/// that never created one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendMessageResult {
    Task(Task),
    Message(Message),
}

// ============= Streaming Events =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub status: TaskStatus,
    /// Last event of the exchange; the stream closes after it.
    #[serde(rename = "final")]
    pub is_final: bool,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    pub task_id: String,
    pub context_id: String,
    pub artifact: Artifact,
    pub kind: String,
}

/// One event on a `message/stream` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    StatusUpdate(TaskStatusUpdateEvent),
    ArtifactUpdate(TaskArtifactUpdateEvent),
    Task(Task),
    Message(Message),
}

impl StreamEvent {
    pub fn status_update(task_id: &str, context_id: &str, status: TaskStatus, is_final: bool) -> Self {
        StreamEvent::StatusUpdate(TaskStatusUpdateEvent {
            task_id: task_id.to_string(),
            context_id: context_id.to_string(),
            status,
            is_final,
            kind: "status-update".to_string(),
        })
    }

    pub fn artifact_update(task_id: &str, context_id: &str, artifact: Artifact) -> Self {
        StreamEvent::ArtifactUpdate(TaskArtifactUpdateEvent {
            task_id: task_id.to_string(),
            context_id: context_id.to_string(),
            artifact,
            kind: "artifact-update".to_string(),
        })
    }

    /// True for the status update that closes a stream.
    pub fn is_final(&self) -> bool {
        matches!(self, StreamEvent::StatusUpdate(event) if event.is_final)
    }
}

// ============= Agent Card =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    pub streaming: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Self-description served at `/.well-known/agent-card.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub capabilities: AgentCapabilities,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    pub skills: Vec<AgentSkill>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_states_use_kebab_case() {
        assert_eq!(
            serde_json::to_value(TaskState::InputRequired).unwrap(),
            json!("input-required")
        );
        assert_eq!(
            serde_json::to_value(TaskState::Working).unwrap(),
            json!("working")
        );
        let state: TaskState = serde_json::from_value(json!("input-required")).unwrap();
        assert_eq!(state, TaskState::InputRequired);
    }

    #[test]
    fn parts_are_kind_tagged() {
        let text = serde_json::to_value(Part::text("hello")).unwrap();
        assert_eq!(text, json!({"kind": "text", "text": "hello"}));

        let data = serde_json::to_value(Part::data(json!({"form_data": {}}))).unwrap();
        assert_eq!(data["kind"], "data");
        assert_eq!(data["data"]["form_data"], json!({}));
    }

    #[test]
    fn message_uses_camel_case_ids() {
        let message = Message::user(vec![Part::text("I want insurance")])
            .with_task(Some("t1".to_string()), Some("c1".to_string()));
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["taskId"], "t1");
        assert_eq!(value["contextId"], "c1");
        assert_eq!(value["role"], "user");
        assert!(value["messageId"].is_string());
    }

    #[test]
    fn message_without_ids_omits_them() {
        let value = serde_json::to_value(Message::user(vec![Part::text("hi")])).unwrap();
        assert!(value.get("taskId").is_none());
        assert!(value.get("contextId").is_none());
    }

    #[test]
    fn joined_text_skips_data_parts() {
        let message = Message::user(vec![
            Part::text("first"),
            Part::data(json!({"x": 1})),
            Part::text("second"),
        ]);
        assert_eq!(message.joined_text(), "first\nsecond");
    }

    #[test]
    fn send_result_distinguishes_task_from_message() {
        let task_value = json!({
            "id": "t1",
            "contextId": "c1",
            "status": {"state": "completed"},
            "kind": "task"
        });
        let result: SendMessageResult = serde_json::from_value(task_value).unwrap();
        assert!(matches!(result, SendMessageResult::Task(_)));

        let message_value = json!({
            "role": "agent",
            "parts": [{"kind": "text", "text": "hello"}],
            "messageId": "m1",
            "kind": "message"
        });
        let result: SendMessageResult = serde_json::from_value(message_value).unwrap();
        assert!(matches!(result, SendMessageResult::Message(_)));
    }

    #[test]
    fn stream_events_round_trip() {
        let status = StreamEvent::status_update(
            "t1",
            "c1",
            TaskStatus::new(TaskState::Working),
            false,
        );
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["kind"], "status-update");
        assert_eq!(value["final"], false);
        assert_eq!(value["taskId"], "t1");

        let parsed: StreamEvent = serde_json::from_value(value).unwrap();
        assert!(matches!(parsed, StreamEvent::StatusUpdate(e) if !e.is_final));

        let artifact = StreamEvent::artifact_update(
            "t1",
            "c1",
            Artifact::named("report", vec![Part::text("summary")]),
        );
        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["kind"], "artifact-update");
        assert!(value["artifact"]["artifactId"].is_string());
    }

    #[test]
    fn unsupported_operation_error_text() {
        let error = JsonRpcError::unsupported_operation();
        assert_eq!(error.code, error_codes::UNSUPPORTED_OPERATION);
        assert_eq!(error.message, "This operation is not supported");
    }

    #[test]
    fn submitted_task_adopts_message_context() {
        let message =
            Message::user(vec![Part::text("hi")]).with_task(None, Some("c9".to_string()));
        let task = Task::submitted(&message);
        assert_eq!(task.context_id, "c9");
        assert_eq!(task.status.state, TaskState::Submitted);
        assert_eq!(task.history.len(), 1);
    }
}
