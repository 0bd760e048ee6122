//! Embedding backends for plan retrieval.
//!
//! Two backends are supported: the Ollama embeddings API (default) and
//! fastembed for fully local ONNX inference behind the
//! `local-embeddings` feature.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::types::{AppError, Result};

/// Turns text into dense vectors for similarity search.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a batch of texts, one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimension of the vectors this client produces.
    fn dimension(&self) -> usize;
}

// Implemented on the trait object rather than as a supertrait so that
// `Result<Arc<dyn EmbeddingClient>>` is unwrappable without requiring
// `Debug` of every implementor.
impl std::fmt::Debug for dyn EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("dimension", &self.dimension())
            .finish_non_exhaustive()
    }
}

/// Create the embedding backend named in the `[embeddings]` section.
pub fn create_embedder(cfg: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingClient>> {
    match cfg.backend.as_str() {
        #[cfg(feature = "ollama")]
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(
            &cfg.base_url,
            cfg.model.clone(),
            cfg.dimension,
        ))),
        #[cfg(feature = "local-embeddings")]
        "fastembed" => Ok(Arc::new(FastembedEmbedder::new()?)),
        other => Err(AppError::Config(format!(
            "embedding backend '{}' is unknown or not compiled into this build",
            other
        ))),
    }
}

#[cfg(feature = "ollama")]
pub use self::ollama::OllamaEmbedder;

#[cfg(feature = "ollama")]
mod ollama {
    use ollama_rs::Ollama;
    use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

    use super::*;
    use crate::llm::ollama::parse_base_url;

    /// Embeddings via the Ollama `/api/embed` endpoint.
    pub struct OllamaEmbedder {
        client: Ollama,
        model: String,
        dimension: usize,
    }

    impl OllamaEmbedder {
        pub fn new(base_url: &str, model: String, dimension: usize) -> Self {
            let (host, port) = parse_base_url(base_url);
            Self {
                client: Ollama::new(host, port),
                model,
                dimension,
            }
        }
    }

    #[async_trait]
    impl EmbeddingClient for OllamaEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let request = GenerateEmbeddingsRequest::new(
                self.model.clone(),
                EmbeddingsInput::Multiple(texts.to_vec()),
            );

            let response = self
                .client
                .generate_embeddings(request)
                .await
                .map_err(|e| AppError::Retrieval(format!("Ollama embeddings error: {}", e)))?;

            Ok(response.embeddings)
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }
}

#[cfg(feature = "local-embeddings")]
pub use self::local::FastembedEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;

    use super::*;

    /// Local ONNX embeddings via fastembed (bge-small-en-v1.5, 384 dims).
    pub struct FastembedEmbedder {
        model: Arc<Mutex<TextEmbedding>>,
    }

    impl FastembedEmbedder {
        pub fn new() -> Result<Self> {
            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
            )
            .map_err(|e| AppError::Retrieval(format!("failed to load embedding model: {}", e)))?;

            Ok(Self {
                model: Arc::new(Mutex::new(model)),
            })
        }
    }

    #[async_trait]
    impl EmbeddingClient for FastembedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let model = Arc::clone(&self.model);
            let texts = texts.to_vec();

            // fastembed inference is CPU-bound and takes &mut self.
            tokio::task::spawn_blocking(move || {
                model
                    .lock()
                    .embed(texts, None)
                    .map_err(|e| AppError::Retrieval(format!("fastembed error: {}", e)))
            })
            .await
            .map_err(|e| AppError::Internal(format!("embedding task panicked: {}", e)))?
        }

        fn dimension(&self) -> usize {
            384
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_is_rejected() {
        let cfg = EmbeddingConfig {
            backend: "word2vec".to_string(),
            ..EmbeddingConfig::default()
        };
        let err = create_embedder(&cfg).unwrap_err();
        assert!(err.to_string().contains("word2vec"));
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn ollama_backend_reports_configured_dimension() {
        let cfg = EmbeddingConfig::default();
        let embedder = create_embedder(&cfg).unwrap();
        assert_eq!(embedder.dimension(), 768);
    }
}
