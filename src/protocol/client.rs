//! Client side of the task protocol.
//!
//! [`A2aClient`] wraps one shared `reqwest::Client`, so every request to
//! the same agent server reuses its connection pool instead of opening a
//! socket per call.

use std::time::Duration;

use tracing::debug;

use crate::types::{AppError, Result};

use super::types::{
    AgentCard, JsonRpcRequest, JsonRpcResponse, Message, MessageSendParams, SendMessageResult,
};

/// HTTP client for one remote agent server.
#[derive(Debug, Clone)]
pub struct A2aClient {
    http: reqwest::Client,
    base_url: String,
}

impl A2aClient {
    /// Build a client with its own connection pool and request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(http, base_url))
    }

    /// Build a client on top of an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the server's discovery card.
    pub async fn fetch_agent_card(&self) -> Result<AgentCard> {
        let url = format!("{}/.well-known/agent-card.json", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Transport(format!("Agent card request failed: {}", e)))?;

        response
            .json::<AgentCard>()
            .await
            .map_err(|e| AppError::Protocol(format!("Invalid agent card: {}", e)))
    }

    /// Send one message over `message/send` and return the final result.
    ///
    /// Transport failures surface as [`AppError::Transport`]; an error
    /// envelope from the server surfaces as [`AppError::Protocol`]
    /// carrying the server's message.
    pub async fn send_message(&self, message: Message) -> Result<SendMessageResult> {
        let params = serde_json::to_value(MessageSendParams { message })
            .map_err(|e| AppError::Internal(format!("failed to encode message: {}", e)))?;
        let request = JsonRpcRequest::new("message/send", params);

        debug!(url = %self.base_url, "sending message to remote agent");

        let response = self
            .http
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Transport(format!("Message send failed: {}", e)))?;

        let envelope: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| AppError::Protocol(format!("Invalid protocol response: {}", e)))?;

        if let Some(error) = envelope.error {
            return Err(AppError::Protocol(error.message));
        }

        let result = envelope
            .result
            .ok_or_else(|| AppError::Protocol("response has neither result nor error".to_string()))?;
        serde_json::from_value(result)
            .map_err(|e| AppError::Protocol(format!("Unrecognized send result: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let http = reqwest::Client::new();
        let client = A2aClient::with_client(http, "http://localhost:10010/");
        assert_eq!(client.base_url(), "http://localhost:10010");
    }

    #[test]
    fn timeout_client_builds() {
        let client = A2aClient::new("http://localhost:10010", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:10010");
    }
}
