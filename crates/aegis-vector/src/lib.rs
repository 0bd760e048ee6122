//! # aegis-vector
//!
//! A small embedded vector index with exact nearest-neighbor search, built
//! for corpora that fit comfortably in memory (plan documents, knowledge
//! snippets, FAQ entries).
//!
//! ## Features
//!
//! - **Pure Rust**: no native dependencies, compiles anywhere Rust does
//! - **Exact search**: brute-force scoring over all records, deterministic
//!   ordering
//! - **Thread-safe**: interior locking, shared references are enough
//! - **Persistence**: JSON snapshots with atomic replace-on-save
//! - **Multiple distance metrics**: cosine, dot product, Euclidean (L2)
//!
//! ## Quick Start
//!
//! ```rust
//! use aegis_vector::{DistanceMetric, VectorIndex};
//! use serde_json::json;
//!
//! fn main() -> Result<(), aegis_vector::Error> {
//!     // Create an index for 4-dimensional vectors
//!     let index = VectorIndex::with_metric(4, DistanceMetric::Cosine);
//!
//!     index.insert("doc1", vec![0.1, 0.9, 0.0, 0.2], json!({"title": "first"}))?;
//!     index.insert("doc2", vec![0.8, 0.1, 0.1, 0.0], json!({"title": "second"}))?;
//!
//!     // Search for the 1 closest record
//!     let hits = index.search(&[0.1, 0.8, 0.0, 0.1], 1)?;
//!     assert_eq!(hits[0].id, "doc1");
//!     Ok(())
//! }
//! ```
//!
//! Approximate indexing (HNSW and friends) is deliberately out of scope:
//! an exact scan over a few thousand records is faster than building and
//! maintaining graph structures, and it never returns a wrong neighbor.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod index;

// Re-exports for convenience
pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use index::{Record, SearchHit, VectorIndex};
