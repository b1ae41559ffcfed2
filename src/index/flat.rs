//! Brute-force in-memory index.
//!
//! Scores every segment against the query embedding. Transcripts produce at
//! most a few hundred segments, so a linear scan is enough.

use super::{cosine_similarity, IndexBuilder, SearchResult, VectorIndex};
use crate::chunking::Segment;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Builds [`FlatIndex`]es using an embedder.
pub struct FlatIndexBuilder {
    embedder: Arc<dyn Embedder>,
}

impl FlatIndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl IndexBuilder for FlatIndexBuilder {
    #[instrument(skip(self, segments), fields(count = segments.len()))]
    async fn build(&self, segments: Vec<Segment>) -> Result<Arc<dyn VectorIndex>> {
        let texts: Vec<String> = segments.iter().map(|s| s.content.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| RagError::IndexBuildFailed(e.to_string()))?;

        if embeddings.len() != segments.len() {
            return Err(RagError::IndexBuildFailed(format!(
                "Expected {} embeddings, got {}",
                segments.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<(Segment, Vec<f32>)> = segments.into_iter().zip(embeddings).collect();
        info!("Vector index built ({} segments)", entries.len());

        Ok(Arc::new(FlatIndex {
            entries,
            embedder: self.embedder.clone(),
        }))
    }
}

/// Immutable list of embedded segments.
pub struct FlatIndex {
    entries: Vec<(Segment, Vec<f32>)>,
    embedder: Arc<dyn Embedder>,
}

impl FlatIndex {
    /// Rank entries against an already-embedded query.
    pub fn search_embedding(&self, query_embedding: &[f32], k: usize) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|(segment, embedding)| SearchResult {
                segment: segment.clone(),
                score: cosine_similarity(query_embedding, embedding),
            })
            .collect();

        // `sort_by` is stable and entries are in segment order, so equal
        // scores keep that order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);
        results
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = self.search_embedding(&query_embedding, k);
        debug!("Retrieved {} of {} segments", results.len(), self.entries.len());
        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds text as keyword counts so similarity is predictable.
    struct KeywordEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl KeywordEmbedder {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0), fail: false }
        }

        fn failing() -> Self {
            Self { calls: AtomicUsize::new(0), fail: true }
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RagError::Embedding("quota exceeded".into()));
            }
            Ok(["rust", "python", "video"]
                .iter()
                .map(|kw| text.matches(kw).count() as f32)
                .collect())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> Option<usize> {
            Some(3)
        }
    }

    fn segment(order: usize, content: &str) -> Segment {
        Segment {
            order,
            start: order * 100,
            end: order * 100 + content.len(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_retrieve_ranks_by_similarity() {
        let builder = FlatIndexBuilder::new(Arc::new(KeywordEmbedder::new()));
        let index = builder
            .build(vec![
                segment(0, "python python"),
                segment(1, "rust rust rust"),
                segment(2, "video about rust and python"),
            ])
            .await
            .unwrap();

        assert_eq!(index.len(), 3);
        let results = index.retrieve("rust", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].segment.order, 1);
        assert_eq!(results[1].segment.order, 2);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_ties_keep_segment_order() {
        let builder = FlatIndexBuilder::new(Arc::new(KeywordEmbedder::new()));
        let index = builder
            .build(vec![
                segment(0, "rust"),
                segment(1, "python"),
                segment(2, "rust"),
                segment(3, "rust"),
            ])
            .await
            .unwrap();

        let results = index.retrieve("rust", 3).await.unwrap();
        let orders: Vec<usize> = results.iter().map(|r| r.segment.order).collect();
        assert_eq!(orders, vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_index_skips_embedding() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let builder = FlatIndexBuilder::new(embedder.clone());
        let index = builder.build(Vec::new()).await.unwrap();

        assert!(index.is_empty());
        let results = index.retrieve("anything", 4).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_build() {
        let builder = FlatIndexBuilder::new(Arc::new(KeywordEmbedder::failing()));
        let result = builder.build(vec![segment(0, "rust")]).await;
        assert!(matches!(result, Err(RagError::IndexBuildFailed(_))));
    }
}
