use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Conversation Types =============

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Agent,
}

/// One piece of a turn: free text or structured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TurnPart {
    Text { text: String },
    Data { data: serde_json::Value },
}

impl TurnPart {
    pub fn text(text: impl Into<String>) -> Self {
        TurnPart::Text { text: text.into() }
    }

    pub fn data(data: serde_json::Value) -> Self {
        TurnPart::Data { data }
    }

    /// The text content, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TurnPart::Text { text } => Some(text.as_str()),
            TurnPart::Data { .. } => None,
        }
    }
}

/// One exchange unit between user and agent system: a role plus an ordered
/// sequence of parts. Immutable once appended to a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<TurnPart>,
    /// Name of the producing agent, for agent turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            parts: vec![TurnPart::text(text)],
            author: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user_parts(parts: Vec<TurnPart>) -> Self {
        Self {
            role: TurnRole::User,
            parts,
            author: None,
            timestamp: Utc::now(),
        }
    }

    pub fn agent(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self::agent_parts(author, vec![TurnPart::text(text)])
    }

    pub fn agent_parts(author: impl Into<String>, parts: Vec<TurnPart>) -> Self {
        Self {
            role: TurnRole::Agent,
            parts,
            author: Some(author.into()),
            timestamp: Utc::now(),
        }
    }

    /// All text parts, in order.
    pub fn text_parts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| p.as_text())
    }

    /// Whether the turn carries at least one text part.
    pub fn has_text(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, TurnPart::Text { .. }))
    }

    /// Text parts joined with newlines. Data parts are skipped.
    pub fn joined_text(&self) -> String {
        self.text_parts().collect::<Vec<_>>().join("\n")
    }
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Schema(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Protocol(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::Transport(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::LLM(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Retrieval(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Config(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<aegis_vector::Error> for AppError {
    fn from(e: aegis_vector::Error) -> Self {
        AppError::Retrieval(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
