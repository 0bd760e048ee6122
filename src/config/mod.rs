//! TOML-based configuration for AEGIS
//!
//! All settings live in one file (`aegis.toml` by default) with environment
//! overrides under the `AEGIS` prefix (`AEGIS__LLM__MODEL=...` overrides
//! `[llm] model`). Every field has a default, so a missing file yields a
//! fully usable local-first configuration.

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure loaded from aegis.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AegisConfig {
    /// Task protocol server (the remote intake agent).
    pub agent_server: AgentServerConfig,
    /// Retrieval tool server (plan search).
    pub retrieval_server: RetrievalServerConfig,
    /// Orchestrator-side settings: where the remote servers live.
    pub orchestrator: OrchestratorConfig,
    /// LLM provider selection.
    pub llm: LlmConfig,
    /// Embedding backend selection.
    pub embeddings: EmbeddingConfig,
    /// Questionnaire schema storage.
    pub forms: FormsConfig,
    /// Document ingestion knobs.
    pub ingest: IngestConfig,
}

// ============= Agent Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentServerConfig {
    #[serde(default = "default_bind_host")]
    pub host: String,

    #[serde(default = "default_agent_port")]
    pub port: u16,
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_agent_port() -> u16 {
    10010
}

impl Default for AgentServerConfig {
    fn default() -> Self {
        Self {
            host: default_bind_host(),
            port: default_agent_port(),
        }
    }
}

// ============= Retrieval Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalServerConfig {
    #[serde(default = "default_bind_host")]
    pub host: String,

    #[serde(default = "default_retrieval_port")]
    pub port: u16,

    /// Snapshot file for the plan vector index.
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

fn default_retrieval_port() -> u16 {
    15001
}

fn default_index_path() -> String {
    "data/plans-index.json".to_string()
}

impl Default for RetrievalServerConfig {
    fn default() -> Self {
        Self {
            host: default_bind_host(),
            port: default_retrieval_port(),
            index_path: default_index_path(),
        }
    }
}

// ============= Orchestrator Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Base URL of the task protocol server the intake adapter talks to.
    #[serde(default = "default_remote_agent_url")]
    pub remote_agent_url: String,

    /// Base URL of the retrieval tool server the policy agent queries.
    #[serde(default = "default_retrieval_url")]
    pub retrieval_url: String,

    /// Outbound request timeout, seconds. Also the only cancellation the
    /// pipeline has; the protocol itself does not support cancel.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How many recent turns each sub-agent sees.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_remote_agent_url() -> String {
    "http://localhost:10010".to_string()
}

fn default_retrieval_url() -> String {
    "http://localhost:15001".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_history_window() -> usize {
    10
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            remote_agent_url: default_remote_agent_url(),
            retrieval_url: default_retrieval_url(),
            request_timeout_secs: default_request_timeout_secs(),
            history_window: default_history_window(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "ollama" or "openai".
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable holding the API key, for providers that need
    /// one. The key itself never appears in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_llm_provider() -> String {
    "ollama".to_string()
}

fn default_llm_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

// ============= Embedding Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend: "ollama" (embeddings API) or "fastembed" (local ONNX,
    /// requires the `local-embeddings` feature).
    #[serde(default = "default_embedding_backend")]
    pub backend: String,

    /// Ollama server URL (ignored by the fastembed backend).
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Dimension of the embedding vectors; must match the model.
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

fn default_embedding_backend() -> String {
    "ollama".to_string()
}

fn default_embedding_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_dimension() -> usize {
    768
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
        }
    }
}

// ============= Forms Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Path to the questionnaire schema JSON. The file is read-only to the
    /// server.
    #[serde(default = "default_schema_path")]
    pub schema_path: String,
}

fn default_schema_path() -> String {
    "data/forms/health_intake.json".to_string()
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            schema_path: default_schema_path(),
        }
    }
}

// ============= Ingestion Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Chunk size in words.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks, in words.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    256
}

fn default_chunk_overlap() -> usize {
    32
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

// ============= Loading =============

impl AegisConfig {
    /// Load configuration from a TOML file layered with `AEGIS__*`
    /// environment overrides. A missing file is not an error; the defaults
    /// apply.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let loaded: AegisConfig = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("AEGIS").separator("__"))
            .build()
            .map_err(|e| AppError::Config(format!("failed to read {}: {}", path.display(), e)))?
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("invalid configuration: {}", e)))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        match self.llm.provider.as_str() {
            "ollama" | "openai" => {}
            other => {
                return Err(AppError::Config(format!(
                    "unknown llm provider '{}' (expected 'ollama' or 'openai')",
                    other
                )));
            }
        }
        match self.embeddings.backend.as_str() {
            "ollama" | "fastembed" => {}
            other => {
                return Err(AppError::Config(format!(
                    "unknown embedding backend '{}' (expected 'ollama' or 'fastembed')",
                    other
                )));
            }
        }
        if self.embeddings.dimension == 0 {
            return Err(AppError::Config(
                "embeddings.dimension must be non-zero".to_string(),
            ));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(AppError::Config(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.orchestrator.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "orchestrator.request_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AegisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent_server.port, 10010);
        assert_eq!(config.retrieval_server.port, 15001);
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.embeddings.dimension, 768);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AegisConfig::load("definitely-not-here.toml").unwrap();
        assert_eq!(config.agent_server.port, 10010);
        assert_eq!(config.orchestrator.remote_agent_url, "http://localhost:10010");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[agent_server]\nport = 9000\n\n[llm]\nmodel = \"mistral\"\n"
        )
        .unwrap();

        let config = AegisConfig::load(file.path()).unwrap();
        assert_eq!(config.agent_server.port, 9000);
        assert_eq!(config.llm.model, "mistral");
        // Untouched sections keep defaults
        assert_eq!(config.retrieval_server.port, 15001);
        assert_eq!(config.embeddings.model, "nomic-embed-text");
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut config = AegisConfig::default();
        config.llm.provider = "palm".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_embedding_backend_rejected() {
        let mut config = AegisConfig::default();
        config.embeddings.backend = "word2vec".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = AegisConfig::default();
        config.ingest.chunk_size = 32;
        config.ingest.chunk_overlap = 32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_dimension_rejected() {
        let mut config = AegisConfig::default();
        config.embeddings.dimension = 0;
        assert!(config.validate().is_err());
    }
}
