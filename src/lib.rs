//! # A.E.G.I.S - Agentic Enrollment Guidance & Intake Server
//!
//! A multi-agent health-insurance intake pipeline built in Rust: a remote
//! intake agent served over a JSON-RPC task protocol, a risk profiler, a
//! plan recommender grounded in an embedded vector index, and an
//! orchestrator that routes each conversation through them in order.
//!
//! ## Overview
//!
//! AEGIS runs as cooperating processes:
//!
//! 1. **Task protocol server** (`aegis-server agent`) - hosts the intake
//!    agent, which collects medical history through a structured form and
//!    summarizes submissions into a report
//! 2. **Retrieval server** (`aegis-server retrieval`) - semantic search
//!    over the insurance plan corpus
//! 3. **Orchestrator** (`aegis-server chat`, or embedded in your own
//!    binary) - walks the conversation through intake, risk profiling and
//!    plan recommendation
//!
//! ## Quick Start (Library Usage)
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! aegis-server = "0.3"
//! ```
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use aegis::agents::Orchestrator;
//! use aegis::config::AegisConfig;
//! use aegis::types::Turn;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = AegisConfig::load("aegis.toml")?;
//!     let orchestrator = Orchestrator::from_config(&cfg).await?;
//!
//!     let replies = orchestrator
//!         .handle_user_turn("demo", Turn::user("I want to apply for health insurance"))
//!         .await?;
//!     for turn in replies {
//!         println!("{}", turn.joined_text());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Serving the intake agent
//!
//! ```rust,ignore
//! use aegis::agents::IntakeAgent;
//! use aegis::config::AegisConfig;
//! use aegis::forms::FormRegistry;
//! use aegis::llm::LLMClientFactory;
//! use aegis::protocol::{self, AgentServerState, intake_agent_card};
//! use std::sync::Arc;
//!
//! let cfg = AegisConfig::load("aegis.toml")?;
//! let llm = LLMClientFactory::from_config(&cfg.llm)?.create_default().await?;
//! let forms = Arc::new(FormRegistry::from_config(&cfg.forms));
//! let state = AgentServerState::new(
//!     Arc::new(IntakeAgent::new(llm, forms)),
//!     intake_agent_card("http://localhost:10010/"),
//! );
//! protocol::server::serve(&cfg.agent_server, state).await?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference and embeddings (default) |
//! | `openai` | OpenAI API support |
//! | `local-embeddings` | fastembed ONNX embeddings (Linux/macOS only) |
//! | `mcp` | Model Context Protocol surface for plan retrieval |
//!
//! ## Modules
//!
//! - [`agents`] - The pipeline agents and the orchestrator routing them
//! - [`protocol`] - Task protocol: JSON-RPC server, client and task store
//! - [`retrieval`] - Plan ingestion, embeddings and semantic search
//! - [`llm`] - LLM client implementations
//! - [`tools`] - Tool definitions and registry
//! - [`memory`] - Conversation state and pipeline stage tracking
//! - [`forms`] - Intake questionnaire schema handling
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// The pipeline agents and the orchestrator that routes between them.
pub mod agents;
/// Command-line interface parsing and commands.
pub mod cli;
/// TOML configuration with environment overrides.
pub mod config;
/// Intake questionnaire schema handling.
pub mod forms;
/// LLM provider clients and abstractions.
pub mod llm;
/// Model Context Protocol (MCP) surface for plan retrieval.
#[cfg(feature = "mcp")]
pub mod mcp;
/// Conversation memory and pipeline stage tracking.
pub mod memory;
/// Task protocol server, client and task store.
pub mod protocol;
/// Plan retrieval: chunking, embeddings, vector store and HTTP server.
pub mod retrieval;
/// Built-in tools (form handling, plan retrieval).
pub mod tools;
/// Core types (turns, errors).
pub mod types;

// Re-export commonly used types
pub use agents::{
    IntakeAgent, Orchestrator, PipelineAgent, PolicyAgent, RemoteAgent, RiskAgent,
};
pub use config::AegisConfig;
pub use llm::{LLMClient, LLMClientFactory, Provider};
pub use memory::{ConversationContext, ConversationStore, PipelineStage};
pub use protocol::{A2aClient, AgentServerState, TaskStore};
pub use tools::{Tool, ToolRegistry};
pub use types::{AppError, Result, Turn};
