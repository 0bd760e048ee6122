//! Persistent vector store for insurance plan passages.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aegis_vector::VectorIndex;
use serde_json::{Value, json};

use crate::types::{AppError, Result};

use super::PlanHit;

/// Plan passages indexed by embedding, snapshotted to disk as JSON.
#[derive(Debug)]
pub struct PlanStore {
    index: Arc<VectorIndex>,
    path: PathBuf,
}

impl PlanStore {
    /// Create an empty store that will persist to `path`.
    pub fn new(dimension: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index: Arc::new(VectorIndex::new(dimension)),
            path: path.into(),
        }
    }

    /// Open the snapshot at `path`, or start empty if none exists yet.
    pub async fn load_or_create(dimension: usize, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::new(dimension, path));
        }

        let snapshot_path = path.clone();
        let index = tokio::task::spawn_blocking(move || VectorIndex::load(&snapshot_path))
            .await
            .map_err(|e| AppError::Internal(format!("index load task panicked: {}", e)))??;

        if index.dimension() != dimension {
            return Err(AppError::Retrieval(format!(
                "plan index at '{}' has dimension {} but the configured embedding dimension is {}",
                path.display(),
                index.dimension(),
                dimension
            )));
        }

        Ok(Self {
            index: Arc::new(index),
            path,
        })
    }

    /// Add one plan passage.
    pub fn insert(&self, id: impl Into<String>, vector: Vec<f32>, text: &str, source: &str) -> Result<()> {
        let payload = json!({
            "text": text,
            "metadata": { "source": source },
        });
        self.index.insert(id, vector, payload)?;
        Ok(())
    }

    /// Find the `k` passages closest to `query`, best first.
    pub fn search_plans(&self, query: &[f32], k: usize) -> Result<Vec<PlanHit>> {
        let hits = self.index.search(query, k)?;

        Ok(hits
            .into_iter()
            .map(|hit| {
                let text = hit.payload["text"].as_str().unwrap_or_default().to_string();
                let metadata = match hit.payload.get("metadata") {
                    Some(m) => m.clone(),
                    None => Value::Null,
                };
                PlanHit {
                    id: hit.id,
                    text,
                    score: hit.score,
                    metadata,
                }
            })
            .collect())
    }

    /// Write the current index to its snapshot path.
    pub async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Retrieval(format!(
                        "failed to create index directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let index = Arc::clone(&self.index);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || index.save(&path))
            .await
            .map_err(|e| AppError::Internal(format!("index save task panicked: {}", e)))??;

        Ok(())
    }

    /// Number of stored passages.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store holds no passages.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Snapshot location on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
