//! Context retrieval for RAG answers.

use super::ContextChunk;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use tracing::{debug, instrument};

/// Default number of segments retrieved per query.
pub const DEFAULT_TOP_K: usize = 4;

/// Retrieves the most relevant segments of an index for a query.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    max_chunks: usize,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            max_chunks: DEFAULT_TOP_K,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Retrieve context for a query, most relevant first.
    ///
    /// An empty index yields an empty context rather than an error.
    #[instrument(skip(self, index), fields(segments = index.len()))]
    pub async fn build(&self, index: &dyn VectorIndex, query: &str) -> Result<Vec<ContextChunk>> {
        let results = index
            .retrieve(query, self.max_chunks)
            .await
            .map_err(|e| match e {
                RagError::Embedding(detail) => RagError::GenerationFailed(detail),
                other => other,
            })?;

        debug!("Retrieved {} context chunks", results.len());
        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Join context chunks into one block, separated by blank lines.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
