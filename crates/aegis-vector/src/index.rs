//! The vector index itself: insertion, exact search, persistence.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

/// A stored vector together with its document payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Caller-assigned identifier, unique within the index.
    pub id: String,
    /// The embedding. Length always equals the index dimension.
    pub vector: Vec<f32>,
    /// Arbitrary JSON payload carried alongside the vector (document text,
    /// source metadata). Returned verbatim on search hits.
    pub payload: serde_json::Value,
}

/// A scored search hit, ordered best-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier of the matching record.
    pub id: String,
    /// Similarity score; higher is more similar.
    pub score: f32,
    /// Payload of the matching record.
    pub payload: serde_json::Value,
}

/// On-disk snapshot shape. Kept separate from the live index so the file
/// format stays stable if the in-memory layout changes.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    dimension: usize,
    metric: DistanceMetric,
    records: Vec<Record>,
}

/// Exact nearest-neighbor index over dense vectors.
///
/// All methods take `&self`; the index locks internally. Writes hold the
/// lock only for the map mutation, searches clone nothing and score under
/// a read lock.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    metric: DistanceMetric,
    records: RwLock<HashMap<String, Record>>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimension, using
    /// cosine similarity.
    pub fn new(dimension: usize) -> Self {
        Self::with_metric(dimension, DistanceMetric::Cosine)
    }

    /// Create an empty index with an explicit distance metric.
    pub fn with_metric(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            dimension,
            metric,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Dimension this index was created with.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Distance metric in use.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Insert or replace a record.
    ///
    /// Fails if the vector's dimension does not match the index, or if it
    /// contains non-finite values (NaN would poison score ordering).
    pub fn insert(
        &self,
        id: impl Into<String>,
        vector: Vec<f32>,
        payload: serde_json::Value,
    ) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidVector(
                "vector contains NaN or infinite components".to_string(),
            ));
        }

        let id = id.into();
        let record = Record {
            id: id.clone(),
            vector,
            payload,
        };
        self.records.write().insert(id, record);
        Ok(())
    }

    /// Fetch a record by id.
    pub fn get(&self, id: &str) -> Option<Record> {
        self.records.read().get(id).cloned()
    }

    /// Remove a record by id, returning it.
    pub fn remove(&self, id: &str) -> Result<Record> {
        self.records
            .write()
            .remove(id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    /// Exact k-nearest search: scores every record, returns the best `k`
    /// hits ordered by descending score (ties broken by id so results are
    /// deterministic). Returns fewer than `k` hits when the index is
    /// smaller than `k`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let records = self.records.read();
        let mut hits: Vec<SearchHit> = records
            .values()
            .map(|record| SearchHit {
                id: record.id.clone(),
                score: self.metric.similarity(query, &record.vector),
                payload: record.payload.clone(),
            })
            .collect();
        drop(records);

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Write a JSON snapshot of the index to `path`.
    ///
    /// The snapshot is written to a sibling temp file and renamed into
    /// place, so a crash mid-save never truncates an existing snapshot.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let snapshot = {
            let records = self.records.read();
            Snapshot {
                dimension: self.dimension,
                metric: self.metric,
                records: records.values().cloned().collect(),
            }
        };

        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| Error::Persistence(e.to_string()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), records = snapshot.records.len(), "index snapshot saved");
        Ok(())
    }

    /// Load an index from a JSON snapshot written by [`VectorIndex::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|e| Error::Persistence(e.to_string()))?;

        let records: HashMap<String, Record> = snapshot
            .records
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        tracing::debug!(path = %path.display(), records = records.len(), "index snapshot loaded");

        Ok(Self {
            dimension: snapshot.dimension,
            metric: snapshot.metric,
            records: RwLock::new(records),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_index() -> VectorIndex {
        let index = VectorIndex::new(3);
        index
            .insert("a", vec![1.0, 0.0, 0.0], json!({"text": "alpha"}))
            .unwrap();
        index
            .insert("b", vec![0.0, 1.0, 0.0], json!({"text": "beta"}))
            .unwrap();
        index
            .insert("c", vec![0.7, 0.7, 0.0], json!({"text": "gamma"}))
            .unwrap();
        index
    }

    #[test]
    fn insert_and_len() {
        let index = sample_index();
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
    }

    #[test]
    fn insert_rejects_wrong_dimension() {
        let index = VectorIndex::new(3);
        let err = index.insert("x", vec![1.0, 2.0], json!({})).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn insert_rejects_nan() {
        let index = VectorIndex::new(2);
        let err = index.insert("x", vec![f32::NAN, 0.0], json!({})).unwrap_err();
        assert!(matches!(err, Error::InvalidVector(_)));
    }

    #[test]
    fn search_orders_by_similarity() {
        let index = sample_index();
        let hits = index.search(&[1.0, 0.1, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
        assert!(hits[0].score >= hits[1].score);
        assert_eq!(hits[0].payload["text"], "alpha");
    }

    #[test]
    fn search_caps_at_index_size() {
        let index = sample_index();
        let hits = index.search(&[1.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn search_k_zero_is_empty() {
        let index = sample_index();
        assert!(index.search(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn search_rejects_wrong_dimension() {
        let index = sample_index();
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn insert_replaces_existing_id() {
        let index = sample_index();
        index
            .insert("a", vec![0.0, 0.0, 1.0], json!({"text": "replaced"}))
            .unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("a").unwrap().payload["text"], "replaced");
    }

    #[test]
    fn remove_missing_errors() {
        let index = sample_index();
        assert!(index.remove("zzz").is_err());
        assert!(index.remove("a").is_ok());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = sample_index();
        index.save(&path).unwrap();

        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.metric(), DistanceMetric::Cosine);
        assert_eq!(loaded.len(), 3);

        let hits = loaded.search(&[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].id, "b");
    }

    #[test]
    fn load_rejects_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, b"not json at all").unwrap();
        assert!(matches!(
            VectorIndex::load(&path),
            Err(Error::Persistence(_))
        ));
    }
}
