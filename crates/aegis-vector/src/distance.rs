//! Distance metrics for vector similarity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance metric for vector similarity calculations.
///
/// - **Cosine**: angle between vectors, ignoring magnitude. Best for text
///   embeddings, which most embedding APIs return unnormalized.
/// - **DotProduct**: alignment including magnitude. Best when vectors are
///   already normalized.
/// - **Euclidean**: straight-line distance. Best when magnitude carries
///   meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity. Range [-1, 1], 1 means identical direction.
    #[default]
    Cosine,
    /// Dot product (inner product). Unbounded, higher is more similar.
    DotProduct,
    /// Euclidean (L2) distance, transformed to a similarity in (0, 1].
    Euclidean,
}

impl DistanceMetric {
    /// Compute the similarity score between two vectors.
    ///
    /// Returns a score where **higher is more similar** for all metrics;
    /// Euclidean distance is transformed to `1 / (1 + dist)` so the same
    /// ordering convention holds across metrics.
    ///
    /// Callers are expected to have validated dimensions; mismatched
    /// lengths are a logic error and only checked in debug builds.
    #[inline]
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::DotProduct => dot_product(a, b),
            DistanceMetric::Euclidean => {
                let dist = euclidean_distance(a, b);
                1.0 / (1.0 + dist)
            }
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::DotProduct => write!(f, "dotproduct"),
            DistanceMetric::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "dot" | "dotproduct" | "dot_product" => Ok(DistanceMetric::DotProduct),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            other => Err(format!("unknown distance metric: {other}")),
        }
    }
}

#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[inline]
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
