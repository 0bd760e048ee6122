//! Test doubles shared across the integration test binaries.
//!
//! A canned LLM client, a deterministic embedding backend, and a helper
//! that materializes an intake questionnaire schema on disk.

use std::io::Write;
use std::sync::Arc;

use aegis::forms::FormRegistry;
use aegis::llm::LLMClient;
use aegis::retrieval::EmbeddingClient;
use aegis::types::{AppError, Result};
use async_trait::async_trait;
use tempfile::NamedTempFile;

/// LLM stand-in that returns one canned reply, or always fails.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
}

impl MockLLMClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
        }
    }

    fn reply(&self) -> Result<String> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.reply()
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.reply()
    }

    async fn generate_with_history(&self, _messages: &[(String, String)]) -> Result<String> {
        self.reply()
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Vector dimension [`StubEmbedder`] produces.
pub const STUB_DIMENSION: usize = 8;

/// Deterministic vector for `text`: a positional byte histogram, so
/// identical texts always embed identically and cosine search against a
/// stored passage's own text ranks that passage first.
pub fn stub_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; STUB_DIMENSION];
    for (position, byte) in text.bytes().enumerate() {
        vector[(byte as usize + position) % STUB_DIMENSION] += 1.0;
    }
    vector
}

/// Embedding backend with no model behind it.
pub struct StubEmbedder;

#[async_trait]
impl EmbeddingClient for StubEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| stub_vector(text)).collect())
    }

    fn dimension(&self) -> usize {
        STUB_DIMENSION
    }
}

/// Write a minimal questionnaire schema to a temp file and point a
/// registry at it. The file handle must outlive the registry.
pub fn intake_registry() -> (NamedTempFile, Arc<FormRegistry>) {
    let mut file = NamedTempFile::new().expect("create schema file");
    write!(
        file,
        r#"{{
  "type": "object",
  "title": "Health Questionnaire",
  "properties": {{
    "age": {{ "type": "integer", "title": "Age" }},
    "smoker": {{ "type": "string", "title": "Do you smoke?", "enum": ["no", "daily"] }}
  }},
  "required": ["age"]
}}"#
    )
    .expect("write schema file");

    let registry = Arc::new(FormRegistry::new(file.path()));
    (file, registry)
}
