//! Process-lifetime cache of prepared videos.
//!
//! Maps a video identifier to its transcript and built index so a video is
//! fetched, split and embedded at most once per process. Entries live until
//! they are evicted or the process exits; there is no TTL and no size bound.

use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Prepared state for one video.
#[derive(Clone)]
pub struct CacheEntry {
    pub transcript: Arc<str>,
    pub index: Arc<dyn VectorIndex>,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(transcript: impl Into<Arc<str>>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            transcript: transcript.into(),
            index,
            cached_at: Utc::now(),
        }
    }

    /// Number of indexed segments.
    pub fn segment_count(&self) -> usize {
        self.index.len()
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("transcript_chars", &self.transcript.chars().count())
            .field("segments", &self.segment_count())
            .field("cached_at", &self.cached_at)
            .finish()
    }
}

/// Result of evicting a single video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictOutcome {
    Evicted,
    NotFound,
}

/// Result of clearing the whole cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared { removed: usize },
}

/// Store of prepared videos keyed by the caller's video identifier.
pub trait VideoCache: Send + Sync {
    /// Look up an entry. A miss is not an error.
    fn get(&self, video_id: &str) -> Option<CacheEntry>;

    /// Store an entry, replacing any existing one for `video_id`.
    fn put(&self, video_id: &str, entry: CacheEntry) -> Result<()>;

    /// Remove one entry.
    fn evict(&self, video_id: &str) -> EvictOutcome;

    /// Remove every entry.
    fn evict_all(&self) -> ClearOutcome;

    /// Number of cached videos.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached video identifiers, sorted.
    fn ids(&self) -> Vec<String>;
}

/// In-memory [`VideoCache`].
pub struct MemoryVideoCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryVideoCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVideoCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoCache for MemoryVideoCache {
    fn get(&self, video_id: &str) -> Option<CacheEntry> {
        match self.entries.read() {
            Ok(entries) => {
                let entry = entries.get(video_id).cloned();
                if entry.is_some() {
                    debug!("Cache hit for {}", video_id);
                }
                entry
            }
            Err(e) => {
                warn!("Cache lock poisoned, treating {} as a miss: {}", video_id, e);
                None
            }
        }
    }

    fn put(&self, video_id: &str, entry: CacheEntry) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| RagError::CacheStoreFailed(e.to_string()))?;
        entries.insert(video_id.to_string(), entry);
        info!("Saved data in cache for video: {}", video_id);
        Ok(())
    }

    fn evict(&self, video_id: &str) -> EvictOutcome {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            // Eviction only removes data, so recover the map from a poisoned lock.
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.remove(video_id) {
            Some(_) => {
                info!("Cache cleared for {}", video_id);
                EvictOutcome::Evicted
            }
            None => {
                info!("No cache found for video ID: {} in in-memory cache", video_id);
                EvictOutcome::NotFound
            }
        }
    }

    fn evict_all(&self) -> ClearOutcome {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        let removed = entries.len();
        entries.clear();
        info!("All cache cleared ({} entries)", removed);
        ClearOutcome::Cleared { removed }
    }

    fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = match self.entries.read() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        ids.sort();
        ids
    }
}
