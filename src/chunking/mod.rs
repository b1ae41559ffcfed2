//! Transcript chunking into overlapping retrieval segments.

mod splitter;

pub use splitter::TextSplitter;

/// A contiguous piece of a transcript used as a retrieval unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position of this segment in the transcript.
    pub order: usize,
    /// Byte offset where the segment starts in the transcript.
    pub start: usize,
    /// Byte offset one past the segment's last byte.
    pub end: usize,
    /// Text content (exactly `transcript[start..end]`).
    pub content: String,
}

impl Segment {
    /// Length of the segment in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Rebuild the original text from an ordered, overlapping segment sequence.
///
/// Each segment contributes the part not repeated by its successor.
pub fn reassemble(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let own_end = segments
            .get(i + 1)
            .map(|next| next.start - segment.start)
            .unwrap_or(segment.content.len());
        out.push_str(&segment.content[..own_end]);
    }
    out
}
