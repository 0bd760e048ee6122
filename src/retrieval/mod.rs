//! Insurance Plan Retrieval Service
//!
//! A small semantic-search service over the insurance plan corpus. Plan
//! documents are chunked, embedded and stored in an [`aegis_vector`]
//! index; the policy agent queries the service over HTTP to ground its
//! recommendations in actual plan text.
//!
//! # Module Structure
//!
//! - [`chunker`](crate::retrieval::chunker) - Word-window text chunking
//! - [`embeddings`](crate::retrieval::embeddings) - Embedding backends (Ollama, fastembed)
//! - [`store`](crate::retrieval::store) - Persistent plan vector store
//! - [`ingest`](crate::retrieval::ingest) - Plan document ingestion
//! - [`server`](crate::retrieval::server) - HTTP search endpoint
//!
//! # Pipeline
//!
//! 1. **Ingestion** - `.md`/`.txt` plan documents are chunked and embedded
//! 2. **Storage** - Vectors persisted to a JSON snapshot on disk
//! 3. **Search** - `POST /search` embeds the query and returns the top
//!    [`PLAN_RESULT_COUNT`] passages

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod server;
pub mod store;

pub use chunker::TextChunker;
pub use embeddings::EmbeddingClient;
pub use store::PlanStore;

/// Number of plan passages returned per search.
///
/// Fixed rather than client-controlled: the policy agent always works
/// from the same amount of context, which keeps recommendations stable
/// across runs.
pub const PLAN_RESULT_COUNT: usize = 2;

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text description of the coverage being looked for.
    pub query: String,
}

/// One plan passage matched by a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanHit {
    /// Chunk identifier, `<document-stem>-<chunk index>`.
    pub id: String,
    /// The plan passage text.
    pub text: String,
    /// Similarity score, higher is better.
    pub score: f32,
    /// Source information for the passage.
    #[serde(default)]
    pub metadata: Value,
}

/// Body of a successful `POST /search` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching passages, best first, at most [`PLAN_RESULT_COUNT`].
    pub results: Vec<PlanHit>,
}
