//! Configuration module for ytrag.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, INSUFFICIENT_CONTEXT_ANSWER};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, PromptSettings, ProviderSettings,
    RagSettings, ServerSettings, Settings, TranscriptSettings,
};
