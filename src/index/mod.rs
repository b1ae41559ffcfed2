//! Vector index abstraction.
//!
//! An index is built once from transcript segments and is immutable
//! afterwards; retrieval is the only operation it supports.

mod flat;

pub use flat::{FlatIndex, FlatIndexBuilder};

use crate::chunking::Segment;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A retrieved segment with its similarity to the query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub segment: Segment,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// Builds an index over transcript segments.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    /// Build an index. Any embedding failure aborts the whole build.
    async fn build(&self, segments: Vec<Segment>) -> Result<Arc<dyn VectorIndex>>;
}

/// A built, read-only similarity index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top `k` segments for `query`, most similar first, ties in segment order.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>>;

    /// Number of indexed segments.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
