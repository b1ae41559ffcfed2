//! Transcript acquisition.
//!
//! A [`TranscriptProvider`] returns timed caption fragments for a video; the
//! [`TranscriptAcquirer`] flattens them into the single text blob the rest of
//! the pipeline works on.

mod youtube;

pub use youtube::{extract_video_id, YoutubeTranscriptProvider};

use crate::error::{RagError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// One timed piece of caption text.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptFragment {
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl TranscriptFragment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Source of timed transcript fragments.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch the fragments for a video, in timed order.
    ///
    /// Fails with `TranscriptsDisabled`, `NoTranscriptFound`,
    /// `VideoUnavailable` or `AcquisitionFailed`.
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptFragment>>;
}

/// Fetches a transcript and flattens it to plain text.
#[derive(Clone)]
pub struct TranscriptAcquirer {
    provider: Arc<dyn TranscriptProvider>,
}

impl TranscriptAcquirer {
    pub fn new(provider: Arc<dyn TranscriptProvider>) -> Self {
        Self { provider }
    }

    /// Fetch and flatten the transcript for `video_id`.
    ///
    /// A single provider failure is returned as-is; nothing is retried.
    #[instrument(skip(self))]
    pub async fn acquire(&self, video_id: &str) -> Result<String> {
        let fragments = self.provider.fetch(video_id).await?;
        let fragment_count = fragments.len();

        let transcript = join_fragments(&fragments);
        if transcript.is_empty() {
            return Err(RagError::EmptyTranscript);
        }

        info!(
            "Transcript fetched ({} fragments, {} chars)",
            fragment_count,
            transcript.chars().count()
        );
        Ok(transcript)
    }
}

/// Join trimmed fragment texts with single spaces, skipping blank fragments.
///
/// Text inside a fragment is kept as-is, including line breaks.
pub fn join_fragments(fragments: &[TranscriptFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedProvider {
        result: Mutex<Option<Result<Vec<TranscriptFragment>>>>,
    }

    impl FixedProvider {
        fn new(result: Result<Vec<TranscriptFragment>>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
            })
        }
    }

    #[async_trait]
    impl TranscriptProvider for FixedProvider {
        async fn fetch(&self, _video_id: &str) -> Result<Vec<TranscriptFragment>> {
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(RagError::AcquisitionFailed("called twice".into())))
        }
    }

    #[test]
    fn test_join_fragments() {
        let fragments = vec![
            TranscriptFragment::new(" hello  there\n", 0.0, 1.5),
            TranscriptFragment::new("  ", 1.5, 0.5),
            TranscriptFragment::new("general\nkenobi", 2.0, 2.0),
            TranscriptFragment::new("end of part one.\n\nPart two", 4.0, 2.0),
        ];
        assert_eq!(
            join_fragments(&fragments),
            "hello  there general\nkenobi end of part one.\n\nPart two"
        );
    }

    #[tokio::test]
    async fn test_acquire_concatenates_in_order() {
        let provider = FixedProvider::new(Ok(vec![
            TranscriptFragment::new("first", 0.0, 1.0),
            TranscriptFragment::new("second", 1.0, 1.0),
            TranscriptFragment::new("third", 2.0, 1.0),
        ]));
        let acquirer = TranscriptAcquirer::new(provider);

        let transcript = acquirer.acquire("abc").await.unwrap();
        assert_eq!(transcript, "first second third");
    }

    #[tokio::test]
    async fn test_acquire_empty_is_error() {
        let provider = FixedProvider::new(Ok(vec![TranscriptFragment::new(" ", 0.0, 1.0)]));
        let acquirer = TranscriptAcquirer::new(provider);

        let err = acquirer.acquire("abc").await.unwrap_err();
        assert!(matches!(err, RagError::EmptyTranscript));
    }

    #[tokio::test]
    async fn test_acquire_passes_provider_error_through() {
        let provider = FixedProvider::new(Err(RagError::TranscriptsDisabled));
        let acquirer = TranscriptAcquirer::new(provider);

        let err = acquirer.acquire("abc").await.unwrap_err();
        assert!(matches!(err, RagError::TranscriptsDisabled));
    }
}
