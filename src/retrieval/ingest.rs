//! Plan document ingestion.
//!
//! Walks a directory of `.md`/`.txt` plan documents, chunks and embeds
//! each one, and persists the resulting index snapshot.

use std::path::Path;

use tracing::info;

use crate::types::{AppError, Result};

use super::chunker::TextChunker;
use super::embeddings::EmbeddingClient;
use super::store::PlanStore;

/// Summary of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents read.
    pub files: usize,
    /// Chunks embedded and stored.
    pub chunks: usize,
}

/// Ingest every plan document under `dir` into `store`.
///
/// Only `.md` and `.txt` files are considered. Chunk ids are
/// `<file-stem>-<chunk index>`, so re-ingesting a document overwrites
/// its previous chunks instead of duplicating them. The snapshot is
/// persisted once at the end of the run.
pub async fn ingest_directory(
    dir: &Path,
    chunker: &TextChunker,
    embedder: &dyn EmbeddingClient,
    store: &PlanStore,
) -> Result<IngestReport> {
    if !dir.is_dir() {
        return Err(AppError::Retrieval(format!(
            "plans directory '{}' does not exist",
            dir.display()
        )));
    }

    let mut documents = Vec::new();

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AppError::Retrieval(format!("failed to read '{}': {}", dir.display(), e)))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::Retrieval(format!("failed to read '{}': {}", dir.display(), e)))?
    {
        let path = entry.path();
        let is_plan_doc = path.is_file()
            && matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("md") | Some("txt")
            );
        if !is_plan_doc {
            continue;
        }

        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            AppError::Retrieval(format!("failed to read '{}': {}", path.display(), e))
        })?;

        let chunks = chunker.chunk(&text);
        if chunks.is_empty() {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("plan")
            .to_string();
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("plan")
            .to_string();

        documents.push((stem, file_name, chunks));
    }

    // One embedding call per document, all in flight together.
    let embedded = futures::future::try_join_all(
        documents.iter().map(|(_, _, chunks)| embedder.embed(chunks)),
    )
    .await?;

    let mut report = IngestReport { files: 0, chunks: 0 };
    for ((stem, file_name, chunks), embeddings) in documents.iter().zip(embedded) {
        if embeddings.len() != chunks.len() {
            return Err(AppError::Retrieval(format!(
                "embedding backend returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        for (i, (chunk, vector)) in chunks.iter().zip(embeddings).enumerate() {
            store.insert(format!("{}-{}", stem, i), vector, chunk, file_name)?;
        }

        info!(file = %file_name, chunks = chunks.len(), "ingested plan document");
        report.files += 1;
        report.chunks += chunks.len();
    }

    store.persist().await?;
    info!(
        files = report.files,
        chunks = report.chunks,
        index = %store.path().display(),
        "plan ingestion complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingClient for StubEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let sum: u32 = t.bytes().map(u32::from).sum();
                    vec![(sum % 97) as f32, t.len() as f32, 1.0]
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    #[tokio::test]
    async fn ingests_plan_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bronze.md"),
            "Bronze plan covers preventive visits and generic prescriptions.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("gold.txt"),
            "Gold plan covers specialists, chronic condition management and dental.",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.py"), "print('ignored')").unwrap();

        let index_path = dir.path().join("index/plans-index.json");
        let store = PlanStore::new(3, &index_path);
        let chunker = TextChunker::new(64, 8);

        let report = ingest_directory(dir.path(), &chunker, &StubEmbedder, &store)
            .await
            .unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.chunks, 2);
        assert_eq!(store.len(), 2);
        assert!(index_path.exists());
    }

    #[tokio::test]
    async fn missing_directory_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(3, dir.path().join("plans-index.json"));
        let chunker = TextChunker::new(64, 8);

        let err = ingest_directory(&dir.path().join("nope"), &chunker, &StubEmbedder, &store)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
