//! LLM Provider Clients and Abstractions
//!
//! A unified interface over the language-model backends the pipeline's
//! agents call into. Provider-specific code stays behind the [`LLMClient`]
//! trait so agents never know which backend is configured.
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `ollama` - Local Ollama server (default)
//! - `openai` - OpenAI API and compatible endpoints
//!
//! # Example
//!
//! ```ignore
//! use aegis::llm::{LLMClientFactory, Provider};
//!
//! let factory = LLMClientFactory::new(Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2:3b".to_string(),
//! });
//! let client = factory.create_default().await?;
//! let answer = client.generate("Summarize this form").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, LLMClientFactory, Provider};
