//! Error types for ytrag.

use thiserror::Error;

/// Library-level error type for ytrag operations.
///
/// The `Display` text of each variant is what the caller sees after the
/// `Error: ` prefix, so the wording is part of the output contract.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Transcripts are disabled for this video.")]
    TranscriptsDisabled,

    #[error("No transcript found for this video.")]
    NoTranscriptFound,

    #[error("The video is unavailable.")]
    VideoUnavailable,

    #[error("Unexpected error fetching transcript: {0}")]
    AcquisitionFailed(String),

    #[error("No transcript available to process.")]
    EmptyTranscript,

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store was not created, {0}")]
    IndexBuildFailed(String),

    #[error("Failed to get response from RAG chain, {0}")]
    GenerationFailed(String),

    #[error("Failed to store cache entry: {0}")]
    CacheStoreFailed(String),

    #[error("Invalid invocation: {0}")]
    InvalidInvocation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Coarse classification of a [`RagError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The transcript provider could not supply a transcript.
    ProviderUnavailable,
    EmptyTranscript,
    /// An embedding call failed before a pipeline stage could classify it.
    Embedding,
    IndexBuildFailed,
    GenerationFailed,
    /// Recoverable: the pipeline keeps going with the uncached result.
    CacheStoreFailed,
    InvalidInvocation,
    Config,
    Io,
}

impl RagError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::TranscriptsDisabled
            | RagError::NoTranscriptFound
            | RagError::VideoUnavailable
            | RagError::AcquisitionFailed(_) => ErrorKind::ProviderUnavailable,
            RagError::EmptyTranscript => ErrorKind::EmptyTranscript,
            RagError::Embedding(_) => ErrorKind::Embedding,
            RagError::IndexBuildFailed(_) => ErrorKind::IndexBuildFailed,
            RagError::GenerationFailed(_) => ErrorKind::GenerationFailed,
            RagError::CacheStoreFailed(_) => ErrorKind::CacheStoreFailed,
            RagError::InvalidInvocation(_) => ErrorKind::InvalidInvocation,
            RagError::Config(_) | RagError::TomlParse(_) => ErrorKind::Config,
            RagError::Io(_) | RagError::Json(_) => ErrorKind::Io,
        }
    }

    /// Whether the pipeline may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::CacheStoreFailed
    }

    /// Render the error as the caller-facing output string.
    pub fn to_output(&self) -> String {
        format!("Error: {}", self)
    }
}

/// Result type alias for ytrag operations.
pub type Result<T> = std::result::Result<T, RagError>;
