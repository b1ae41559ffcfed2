//! Retrieval and answer generation.

pub mod context;
mod response;

pub use context::{format_context_for_prompt, ContextBuilder};
pub use response::AnswerGenerator;

use crate::index::SearchResult;

/// A retrieved transcript segment handed to the answer generator.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextChunk {
    /// Position of the segment in the transcript.
    pub order: usize,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            order: result.segment.order,
            content: result.segment.content,
            score: result.score,
        }
    }
}
