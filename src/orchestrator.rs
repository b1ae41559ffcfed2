//! Pipeline orchestrator for ytrag.
//!
//! Answers one query for one video: reuse the cached transcript and index
//! when present, otherwise fetch, split, embed and cache them first.

use crate::cache::{CacheEntry, ClearOutcome, EvictOutcome, MemoryVideoCache, VideoCache};
use crate::chunking::TextSplitter;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{RagError, Result};
use crate::index::{FlatIndexBuilder, IndexBuilder};
use crate::llm::{LanguageModel, OpenAICompletionModel};
use crate::rag::{AnswerGenerator, ContextBuilder, ContextChunk};
use crate::transcript::{TranscriptAcquirer, TranscriptProvider, YoutubeTranscriptProvider};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Where the transcript and index for an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// Served from the video cache.
    Cache,
    /// Freshly ingested for this query.
    Ingested,
}

/// Answer together with the context it was generated from.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    pub context: Vec<ContextChunk>,
    pub source: AnswerSource,
}

/// Which cache entries to clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearTarget {
    All,
    Video(String),
}

/// The main orchestrator for the ytrag pipeline.
pub struct Orchestrator {
    acquirer: TranscriptAcquirer,
    splitter: TextSplitter,
    index_builder: Arc<dyn IndexBuilder>,
    cache: Arc<dyn VideoCache>,
    retriever: ContextBuilder,
    generator: AnswerGenerator,
}

impl Orchestrator {
    /// Create an orchestrator with the default providers and an empty cache.
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_cache(settings, Arc::new(MemoryVideoCache::new()))
    }

    /// Create an orchestrator with the default providers and the given cache.
    pub fn with_cache(settings: &Settings, cache: Arc<dyn VideoCache>) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let provider: Arc<dyn TranscriptProvider> = Arc::new(YoutubeTranscriptProvider::new(
            &settings.provider,
            &settings.transcript,
        )?);
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::new(&settings.provider, &settings.embedding)?);
        let llm: Arc<dyn LanguageModel> =
            Arc::new(OpenAICompletionModel::new(&settings.provider, &settings.rag)?);

        info!(
            "Using embedding model {} and LLM {}",
            settings.embedding.model, settings.rag.model
        );

        Self::with_components(
            settings,
            prompts,
            provider,
            Arc::new(FlatIndexBuilder::new(embedder)),
            llm,
            cache,
        )
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        provider: Arc<dyn TranscriptProvider>,
        index_builder: Arc<dyn IndexBuilder>,
        llm: Arc<dyn LanguageModel>,
        cache: Arc<dyn VideoCache>,
    ) -> Result<Self> {
        Ok(Self {
            acquirer: TranscriptAcquirer::new(provider),
            splitter: TextSplitter::from_settings(&settings.chunking)?,
            index_builder,
            cache,
            retriever: ContextBuilder::new().with_max_chunks(settings.rag.top_k),
            generator: AnswerGenerator::new(llm).with_prompts(prompts),
        })
    }

    /// Get a reference to the video cache.
    pub fn cache(&self) -> Arc<dyn VideoCache> {
        self.cache.clone()
    }

    /// Answer a query, rendering any failure as an `Error: ...` string.
    pub async fn answer(&self, query: &str, video_id: &str) -> String {
        match self.ask(query, video_id).await {
            Ok(answer) => answer.answer,
            Err(e) => {
                error!("Query for {} failed: {}", video_id, e);
                e.to_output()
            }
        }
    }

    /// Answer a query about a video.
    #[instrument(skip(self, query), fields(video_id = %video_id))]
    pub async fn ask(&self, query: &str, video_id: &str) -> Result<RagAnswer> {
        let (entry, source) = self.prepare(video_id).await?;

        let context = self.retriever.build(entry.index.as_ref(), query).await?;
        let answer = self.generator.generate(&context, query).await?;

        Ok(RagAnswer {
            answer,
            context,
            source,
        })
    }

    /// Return the cached entry for a video, ingesting it on a miss.
    pub async fn prepare(&self, video_id: &str) -> Result<(CacheEntry, AnswerSource)> {
        if let Some(entry) = self.cache.get(video_id) {
            info!(
                "Using transcript and index from memory cache ({} segments)",
                entry.segment_count()
            );
            return Ok((entry, AnswerSource::Cache));
        }

        info!("Processing new video ID: {}. Caching results in memory.", video_id);
        let entry = self.ingest(video_id).await?;
        Ok((entry, AnswerSource::Ingested))
    }

    /// Fetch, split, index and cache a video.
    ///
    /// Nothing is cached unless every step succeeds. A failed cache write is
    /// logged and the fresh entry is still returned.
    #[instrument(skip(self))]
    pub async fn ingest(&self, video_id: &str) -> Result<CacheEntry> {
        let transcript = self.acquirer.acquire(video_id).await?;

        let segments = self.splitter.split(&transcript);
        if segments.is_empty() {
            return Err(RagError::EmptyTranscript);
        }
        info!("Text split successfully into {} chunks", segments.len());

        let index = self.index_builder.build(segments).await?;
        let entry = CacheEntry::new(transcript, index);

        if let Err(e) = self.cache.put(video_id, entry.clone()) {
            warn!("Failed to save video data to in-memory cache: {}", e);
        }

        Ok(entry)
    }

    /// Clear one or all cache entries and describe the outcome.
    pub fn clear_cache(&self, target: &ClearTarget) -> String {
        match target {
            ClearTarget::All => match self.cache.evict_all() {
                ClearOutcome::Cleared { .. } => "All cache cleared.".to_string(),
            },
            ClearTarget::Video(video_id) => match self.cache.evict(video_id) {
                EvictOutcome::Evicted => format!("Cache cleared for video ID: {}.", video_id),
                EvictOutcome::NotFound => format!("No cache found for video ID: {}.", video_id),
            },
        }
    }
}
