//! Character-window splitter with natural breakpoints.
//!
//! Fills each segment up to `chunk_size` characters, cutting at the last
//! paragraph break, sentence end or whitespace inside the window before
//! falling back to a hard cut. The next segment starts `chunk_overlap`
//! characters before the cut, nudged forward to a word start.

use super::Segment;
use crate::config::ChunkingSettings;
use crate::error::{RagError, Result};
use regex::Regex;
use tracing::debug;

/// Splits text into overlapping, size-bounded segments.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    sentence_end: Regex,
}

impl TextSplitter {
    /// Create a splitter. `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        let sentence_end = Regex::new(r"[.!?]+\s+")
            .map_err(|e| RagError::Config(format!("Invalid sentence pattern: {}", e)))?;

        Ok(Self {
            chunk_size,
            chunk_overlap,
            sentence_end,
        })
    }

    /// Create a splitter from settings.
    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into ordered segments covering the whole input.
    pub fn split(&self, text: &str) -> Vec<Segment> {
        let len = text.len();
        let mut segments = Vec::new();
        let mut start = 0;

        while start < len {
            let hard_end = advance(text, start, self.chunk_size);
            let end = if hard_end >= len {
                len
            } else {
                // A cut must leave more than `chunk_overlap` characters behind,
                // otherwise the next segment would not move forward.
                let min_end = advance(text, start, self.chunk_overlap + 1);
                self.find_break(text, start, min_end, hard_end)
                    .unwrap_or(hard_end)
            };

            segments.push(Segment {
                order: segments.len(),
                start,
                end,
                content: text[start..end].to_string(),
            });

            if end >= len {
                break;
            }
            start = self.next_start(text, end);
        }

        debug!(
            "Split {} bytes into {} segments (size {}, overlap {})",
            len,
            segments.len(),
            self.chunk_size,
            self.chunk_overlap
        );
        segments
    }

    /// Best cut position in `[min_end, hard_end]`: paragraph, sentence, then word.
    fn find_break(&self, text: &str, start: usize, min_end: usize, hard_end: usize) -> Option<usize> {
        let window = &text[start..hard_end];

        let paragraph = window.rfind("\n\n").map(|pos| start + pos + 2);
        if let Some(end) = paragraph.filter(|&end| end >= min_end) {
            return Some(end);
        }

        let sentence = self
            .sentence_end
            .find_iter(window)
            .last()
            .map(|m| start + m.end());
        if let Some(end) = sentence.filter(|&end| end >= min_end) {
            return Some(end);
        }

        if text[hard_end..].starts_with(char::is_whitespace) {
            return Some(hard_end);
        }

        window
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(pos, c)| start + pos + c.len_utf8())
            .filter(|&end| end >= min_end)
    }

    /// Start of the segment following a cut at `end`.
    fn next_start(&self, text: &str, end: usize) -> usize {
        let candidate = back(text, end, self.chunk_overlap);
        if candidate == end || at_word_start(text, candidate) {
            return candidate;
        }

        let overlap = &text[candidate..end];
        match overlap.find(char::is_whitespace) {
            Some(ws) => {
                let after_ws = &overlap[ws..];
                let skipped = after_ws
                    .find(|c: char| !c.is_whitespace())
                    .unwrap_or(after_ws.len());
                candidate + ws + skipped
            }
            None => candidate,
        }
    }
}

/// Byte offset `n` characters after `from`, clamped to the end of `text`.
fn advance(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Byte offset `n` characters before `to`, clamped to 0.
fn back(text: &str, to: usize, n: usize) -> usize {
    if n == 0 {
        return to;
    }
    text[..to]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn at_word_start(text: &str, pos: usize) -> bool {
    pos == 0 || text[..pos].ends_with(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::reassemble;

    fn assert_invariants(splitter: &TextSplitter, text: &str, segments: &[Segment]) {
        assert_eq!(reassemble(segments), text);
        assert_eq!(segments.first().map(|s| s.start), Some(0));
        assert_eq!(segments.last().map(|s| s.end), Some(text.len()));

        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.order, i);
            assert_eq!(segment.content, &text[segment.start..segment.end]);
            assert!(segment.char_len() <= splitter.chunk_size());
        }

        for pair in segments.windows(2) {
            assert!(pair[1].start > pair[0].start, "no progress");
            assert!(pair[1].start <= pair[0].end, "gap between segments");
            let overlap = text[pair[1].start..pair[0].end].chars().count();
            assert!(overlap <= splitter.chunk_overlap());
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(100, 150).is_err());
        assert!(TextSplitter::new(100, 99).is_ok());
    }

    #[test]
    fn test_empty_input_yields_no_segments() {
        let splitter = TextSplitter::new(1000, 200).unwrap();
        assert!(splitter.split("").is_empty());
    }

    #[test]
    fn test_short_input_is_one_segment() {
        let splitter = TextSplitter::new(1000, 200).unwrap();
        let segments = splitter.split("just a short line");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].content, "just a short line");
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let splitter = TextSplitter::new(50, 10).unwrap();
        let text = "First paragraph here.\n\nSecond paragraph is longer than the rest of it all.";
        let segments = splitter.split(text);

        assert_eq!(segments[0].content, "First paragraph here.\n\n");
        assert_invariants(&splitter, text, &segments);
    }

    #[test]
    fn test_prefers_sentence_break_over_word() {
        let splitter = TextSplitter::new(30, 5).unwrap();
        let text = "One two three. Four five six seven eight nine ten eleven";
        let segments = splitter.split(text);

        assert_eq!(segments[0].content, "One two three. ");
        assert_invariants(&splitter, text, &segments);
    }

    #[test]
    fn test_falls_back_to_word_break() {
        let splitter = TextSplitter::new(20, 4).unwrap();
        let text = "alpha beta gamma delta epsilon zeta";
        let segments = splitter.split(text);

        assert_eq!(segments[0].content, "alpha beta gamma ");
        assert!(segments.iter().all(|s| !s.content.starts_with(' ')));
        assert_invariants(&splitter, text, &segments);
    }

    #[test]
    fn test_hard_cut_without_breakpoints() {
        let splitter = TextSplitter::new(10, 3).unwrap();
        let text = "x".repeat(25);
        let segments = splitter.split(&text);

        let bounds: Vec<(usize, usize)> = segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(0, 10), (7, 17), (14, 24), (21, 25)]);
        assert_invariants(&splitter, &text, &segments);
    }

    #[test]
    fn test_overlap_carries_context() {
        let splitter = TextSplitter::new(40, 15).unwrap();
        let text = "the quick brown fox jumps over the lazy dog and then runs far away into the woods";
        let segments = splitter.split(text);

        assert!(segments.len() > 1);
        assert!(segments.windows(2).any(|pair| pair[1].start < pair[0].end));
        assert_invariants(&splitter, text, &segments);
    }

    #[test]
    fn test_multibyte_text() {
        let splitter = TextSplitter::new(12, 4).unwrap();
        let text = "héllo wörld ça va très bien, merci beaucoup à tous les amis ✨✨✨✨✨✨✨✨✨✨✨✨✨✨";
        let segments = splitter.split(text);
        assert_invariants(&splitter, text, &segments);
    }

    #[test]
    fn test_long_transcript_with_default_settings() {
        let splitter = TextSplitter::from_settings(&ChunkingSettings::default()).unwrap();
        let sentence = "So today we are going to talk about how rust handles ownership. ";
        let text = sentence.repeat(80);
        let segments = splitter.split(&text);

        assert!(segments.len() > 4);
        assert!(segments[..segments.len() - 1]
            .iter()
            .all(|s| s.content.ends_with(". ")));
        assert_invariants(&splitter, &text, &segments);
    }
}
