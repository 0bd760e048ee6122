use crate::config::LlmConfig;
use crate::types::{AppError, Result};
use async_trait::async_trait;

/// Unified interface for LLM providers.
///
/// Implementations wrap a concrete backend (Ollama, OpenAI) behind the
/// same chat-completion surface, so agents can generate text without
/// caring which provider the deployment runs.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a response from a single user prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a response with a system prompt steering the model.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate a response from a full conversation history.
    ///
    /// Each entry is a `(role, content)` pair where role is one of
    /// `"system"`, `"user"` or `"assistant"`.
    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String>;

    /// The model identifier this client sends requests for.
    fn model_name(&self) -> &str;
}

/// Supported LLM providers with their connection settings.
///
/// Variants can always be constructed and inspected; actually creating a
/// client requires the matching Cargo feature to be enabled in the build.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Local Ollama server.
    Ollama {
        /// Base URL, e.g. `http://localhost:11434`.
        base_url: String,
        /// Model name, e.g. `llama3.2:3b`.
        model: String,
    },
    /// OpenAI API or an OpenAI-compatible endpoint.
    OpenAI {
        /// API key.
        api_key: String,
        /// Custom API base URL, or `None` for the official endpoint.
        api_base: Option<String>,
        /// Model name, e.g. `gpt-4o-mini`.
        model: String,
    },
}

impl Provider {
    /// Build a provider from the `[llm]` configuration section.
    ///
    /// For OpenAI the API key is read from the environment variable named
    /// by `api_key_env`. The stock `base_url` default targets Ollama, so
    /// any other value is forwarded as an OpenAI-compatible API base.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let provider = match cfg.provider.as_str() {
            "ollama" => Provider::Ollama {
                base_url: cfg.base_url.clone(),
                model: cfg.model.clone(),
            },
            "openai" => {
                let api_key = std::env::var(&cfg.api_key_env).map_err(|_| {
                    AppError::Config(format!(
                        "LLM provider 'openai' selected but environment variable '{}' is not set",
                        cfg.api_key_env
                    ))
                })?;
                let api_base = if cfg.base_url == LlmConfig::default().base_url {
                    None
                } else {
                    Some(cfg.base_url.clone())
                };
                Provider::OpenAI {
                    api_key,
                    api_base,
                    model: cfg.model.clone(),
                }
            }
            other => {
                return Err(AppError::Config(format!(
                    "unknown LLM provider '{}' (expected 'ollama' or 'openai')",
                    other
                )));
            }
        };

        if !provider.is_implemented() {
            return Err(AppError::Config(format!(
                "LLM provider '{}' requires the '{}' Cargo feature",
                provider.name(),
                provider.name()
            )));
        }

        Ok(provider)
    }

    /// Create a boxed client for this provider.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::Ollama { base_url, model } => {
                #[cfg(feature = "ollama")]
                {
                    Ok(Box::new(super::ollama::OllamaClient::new(
                        base_url,
                        model.clone(),
                    )?))
                }
                #[cfg(not(feature = "ollama"))]
                {
                    let _ = (base_url, model);
                    Err(AppError::Config(
                        "this build does not include the 'ollama' feature".to_string(),
                    ))
                }
            }
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => {
                #[cfg(feature = "openai")]
                {
                    Ok(Box::new(super::openai::OpenAIClient::new(
                        api_key.clone(),
                        api_base.clone(),
                        model.clone(),
                    )))
                }
                #[cfg(not(feature = "openai"))]
                {
                    let _ = (api_key, api_base, model);
                    Err(AppError::Config(
                        "this build does not include the 'openai' feature".to_string(),
                    ))
                }
            }
        }
    }

    /// Whether the current build can create a client for this provider.
    pub fn is_implemented(&self) -> bool {
        match self {
            Provider::Ollama { .. } => cfg!(feature = "ollama"),
            Provider::OpenAI { .. } => cfg!(feature = "openai"),
        }
    }

    /// Short provider name used in configuration and log output.
    pub fn name(&self) -> &str {
        match self {
            Provider::Ollama { .. } => "ollama",
            Provider::OpenAI { .. } => "openai",
        }
    }

    /// The model this provider is configured for.
    pub fn model(&self) -> &str {
        match self {
            Provider::Ollama { model, .. } => model,
            Provider::OpenAI { model, .. } => model,
        }
    }
}

/// Factory that hands out LLM clients for a configured default provider.
pub struct LLMClientFactory {
    default_provider: Provider,
}

impl LLMClientFactory {
    /// Create a factory with the given default provider.
    pub fn new(default_provider: Provider) -> Self {
        Self { default_provider }
    }

    /// Create a factory from the `[llm]` configuration section.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        Ok(Self::new(Provider::from_config(cfg)?))
    }

    /// Create a client for the default provider.
    pub async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        self.default_provider.create_client().await
    }

    /// Create a client for an explicit provider, ignoring the default.
    pub async fn create_with_provider(&self, provider: &Provider) -> Result<Box<dyn LLMClient>> {
        provider.create_client().await
    }

    /// The provider this factory was configured with.
    pub fn default_provider(&self) -> &Provider {
        &self.default_provider
    }
}
