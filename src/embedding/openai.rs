//! OpenAI-compatible embeddings implementation.

use super::Embedder;
use crate::config::{EmbeddingSettings, ProviderSettings};
use crate::error::{RagError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
    batch_size: usize,
    max_concurrent: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder from settings.
    pub fn new(provider: &ProviderSettings, settings: &EmbeddingSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(provider)?,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size.max(1),
            max_concurrent: settings.max_concurrent.max(1),
        })
    }

    async fn embed_chunk(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();

        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.model).input(EmbeddingInput::StringArray(input));
        if let Some(dimensions) = self.dimensions {
            args.dimensions(dimensions);
        }
        let request = args
            .build()
            .map_err(|e| RagError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| RagError::Embedding(format!("Embedding API error: {}", e)))?;

        // Sort by index to ensure correct order
        let mut data = response.data;
        data.sort_by_key(|e| e.index);

        if data.len() != expected {
            return Err(RagError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }

        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let requests: Vec<_> = texts
            .chunks(self.batch_size)
            .map(|chunk| self.embed_chunk(chunk.to_vec()))
            .collect();

        // `buffered` keeps batch order while allowing requests in flight.
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(requests)
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        let all_embeddings: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions.map(|d| d as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_embedder_creation() {
        let provider = ProviderSettings::default();
        let embedder = OpenAIEmbedder::new(&provider, &EmbeddingSettings::default()).unwrap();
        assert_eq!(embedder.dimensions(), None);

        let settings = EmbeddingSettings {
            model: "text-embedding-3-large".to_string(),
            dimensions: Some(3072),
            batch_size: 0,
            max_concurrent: 0,
        };
        let embedder = OpenAIEmbedder::new(&provider, &settings).unwrap();
        assert_eq!(embedder.dimensions(), Some(3072));
        assert_eq!(embedder.batch_size, 1);
        assert_eq!(embedder.max_concurrent, 1);
    }

    /// Serve `/v1/embeddings`, answering each input `tN` with `[N]` in
    /// reverse index order, and count the requests.
    async fn spawn_embeddings_stub() -> (String, Arc<AtomicUsize>) {
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        let app = Router::new().route(
            "/v1/embeddings",
            post(move |Json(body): Json<Value>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let mut data: Vec<Value> = body["input"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .enumerate()
                        .map(|(i, text)| {
                            let n: f32 = text.as_str().unwrap()[1..].parse().unwrap();
                            json!({ "object": "embedding", "index": i, "embedding": [n] })
                        })
                        .collect();
                    data.reverse();
                    Json(json!({
                        "object": "list",
                        "model": "stub",
                        "data": data,
                        "usage": { "prompt_tokens": 0, "total_tokens": 0 }
                    }))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        (format!("http://{}/v1", addr), requests)
    }

    #[tokio::test]
    async fn test_embed_batch_keeps_order_across_batches() {
        let (api_base, requests) = spawn_embeddings_stub().await;
        let provider = ProviderSettings {
            api_base,
            ..ProviderSettings::default()
        };
        let settings = EmbeddingSettings {
            batch_size: 2,
            max_concurrent: 2,
            ..EmbeddingSettings::default()
        };
        let embedder = OpenAIEmbedder::new(&provider, &settings).unwrap();

        let texts: Vec<String> = (0..5).map(|i| format!("t{}", i)).collect();
        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(
            embeddings,
            vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0], vec![4.0]]
        );
        assert_eq!(requests.load(Ordering::SeqCst), 3);
        assert_eq!(embedder.embed("t7").await.unwrap(), vec![7.0]);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let provider = ProviderSettings::default();
        let embedder = OpenAIEmbedder::new(&provider, &EmbeddingSettings::default()).unwrap();
        let out = embedder.embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
    }
}
