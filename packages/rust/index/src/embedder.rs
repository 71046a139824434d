//! OpenAI-compatible embedding client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sitechat_shared::{EngineConfig, Result, SiteChatError};

use crate::Embedder;

/// Known dimensionality for the default embedding models.
fn model_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// Embedding engine backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Build an embedder from the engine configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SiteChatError::Indexing(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
            dimensions: model_dimensions(&config.embedding_model),
        })
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(self.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| SiteChatError::Indexing(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(SiteChatError::Indexing(format!(
                "embedding endpoint returned {status}: {text}"
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| SiteChatError::Indexing(format!("invalid embedding response: {e}")))?;

        if parsed.data.len() != inputs.len() {
            return Err(SiteChatError::Indexing(format!(
                "embedding endpoint returned {} vectors for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }

        // The API documents results in request order, keyed by index.
        parsed.data.sort_by_key(|d| d.index);
        debug!(count = parsed.data.len(), model = %self.model, "embedded batch");

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let mut vectors = self.request(&input).await?;
        vectors
            .pop()
            .ok_or_else(|| SiteChatError::Indexing("empty embedding result".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_config(api_base: String) -> EngineConfig {
        EngineConfig {
            api_base,
            api_key: "test-key".into(),
            embedding_model: "text-embedding-3-small".into(),
            chat_model: "gpt-4o-mini".into(),
            temperature: 0.0,
            request_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn embeds_a_batch_in_request_order() {
        let server = MockServer::start().await;
        // Respond out of order; the client must sort by index.
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&engine_config(format!("{}/v1", server.uri()))).unwrap();
        let vectors = embedder
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn non_2xx_is_an_indexing_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&engine_config(format!("{}/v1", server.uri()))).unwrap();
        let err = embedder.embed("text").await.unwrap_err();
        assert!(matches!(err, SiteChatError::Indexing(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn vector_count_mismatch_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [1.0]}]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&engine_config(format!("{}/v1", server.uri()))).unwrap();
        let err = embedder
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, SiteChatError::Indexing(_)));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        // No server at all — an empty batch must short-circuit.
        let embedder = OpenAiEmbedder::new(&engine_config("http://127.0.0.1:1/v1".into())).unwrap();
        let vectors = embedder.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
