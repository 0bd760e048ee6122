use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};

use super::client::LLMClient;

const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Split a base URL like `http://localhost:11434` into the host URL and
/// port that [`Ollama::new`] expects. Missing pieces fall back to `http`
/// and the default Ollama port.
pub(crate) fn parse_base_url(base_url: &str) -> (String, u16) {
    let (scheme, rest) = match base_url.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", base_url),
    };
    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().unwrap_or(DEFAULT_OLLAMA_PORT)),
        None => (rest, DEFAULT_OLLAMA_PORT),
    };
    (format!("{}://{}", scheme, host), port)
}

/// Chat client backed by a local Ollama server.
pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    /// Connect to the Ollama server at `base_url` using the given model.
    pub fn new(base_url: &str, model: String) -> Result<Self> {
        let (host, port) = parse_base_url(base_url);
        let client = Ollama::new(host, port);
        Ok(Self { client, model })
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt.to_string())]).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let chat_messages: Vec<ChatMessage> = messages
            .iter()
            .map(|(role, content)| match role.as_str() {
                "system" => ChatMessage::system(content.clone()),
                "assistant" => ChatMessage::assistant(content.clone()),
                _ => ChatMessage::user(content.clone()),
            })
            .collect();

        self.chat(chat_messages).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
