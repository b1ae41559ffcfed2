//! ytrag - Question answering over YouTube transcripts
//!
//! Answers a natural-language question about a video using only that video's
//! transcript as context (retrieval-augmented generation).
//!
//! # Overview
//!
//! For a query and a video ID, ytrag:
//! - Fetches the transcript and joins it into one text
//! - Splits it into overlapping segments
//! - Embeds the segments into a similarity index
//! - Retrieves the segments closest to the query
//! - Asks a language model to answer from those segments only
//!
//! Transcripts and indexes are cached in memory, so repeated questions about
//! the same video skip straight to retrieval.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Transcript acquisition (YouTube captions)
//! - `chunking` - Character-window text splitting
//! - `embedding` - Embedding generation
//! - `index` - Similarity index over segments
//! - `llm` - Language model completion
//! - `rag` - Context retrieval and answer generation
//! - `cache` - Process-lifetime video cache
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use ytrag::config::Settings;
//! use ytrag::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let answer = orchestrator.answer("What is this video about?", "dQw4w9WgXcQ").await;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod transcript;

pub use error::{RagError, Result};
