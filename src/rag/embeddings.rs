//! Embedding provider client.
//!
//! [`EmbeddingClient`] is the seam between the ingestion/retrieval
//! pipeline and the external embedding model, so tests can substitute a
//! deterministic provider. [`OpenAiEmbedder`] talks to any
//! OpenAI-compatible `/embeddings` endpoint and retries transient
//! failures (rate limits, 5xx, transport errors) with exponential
//! backoff. Embeddings are never cached; every call is a fresh request.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Default embedding model identifier.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Dimensionality of the default embedding model.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Turns text into a fixed-length vector via an external model.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a single text. Fails with [`AppError::Provider`] when the
    /// upstream call errors or times out.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Fixed dimensionality of vectors produced by this client.
    fn dimensions(&self) -> usize;

    /// Model identifier sent to the provider.
    fn model_name(&self) -> &str;
}

/// Embedding client for OpenAI-compatible HTTP APIs.
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl OpenAiEmbedder {
    /// Create a client against `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        })
    }

    /// Maximum number of retries after the initial attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base delay for exponential backoff (doubles per retry).
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    async fn request_once(&self, text: &str) -> std::result::Result<Vec<f32>, RetryableError> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| RetryableError {
                // Timeouts and connection resets are worth retrying.
                retryable: true,
                error: AppError::Provider(format!("Embedding request failed: {}", e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetryableError {
                retryable: status.as_u16() == 429 || status.is_server_error(),
                error: AppError::Provider(format!(
                    "Embedding provider returned {}: {}",
                    status, body
                )),
            });
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| RetryableError {
            retryable: false,
            error: AppError::Provider(format!("Malformed embedding response: {}", e)),
        })?;

        let embedding = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RetryableError {
                retryable: false,
                error: AppError::Provider("Embedding response contained no data".into()),
            })?;

        if embedding.len() != self.dimensions {
            return Err(RetryableError {
                retryable: false,
                error: AppError::Provider(format!(
                    "Expected {}-dimensional embedding, got {}",
                    self.dimensions,
                    embedding.len()
                )),
            });
        }

        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut attempt = 0;
        loop {
            match self.request_once(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(failed) if failed.retryable && attempt < self.max_retries => {
                    let delay = self.retry_base_delay * 2u32.saturating_pow(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %failed.error,
                        "Embedding call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failed) => return Err(failed.error),
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

struct RetryableError {
    retryable: bool,
    error: AppError,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(server: &MockServer, dimensions: usize) -> OpenAiEmbedder {
        OpenAiEmbedder::new("test-key", server.uri(), "test-model", dimensions)
            .unwrap()
            .with_retry_base_delay(Duration::from_millis(1))
    }

    fn embedding_body(vector: &[f32]) -> serde_json::Value {
        json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": vector }],
            "model": "test-model",
            "usage": { "prompt_tokens": 4, "total_tokens": 4 }
        })
    }

    #[tokio::test]
    async fn embed_parses_provider_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(json!({ "model": "test-model" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[0.1, 0.2, 0.3])))
            .mount(&server)
            .await;

        let embedding = embedder(&server, 3).embed("hello world").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[1.0, 0.0])))
            .mount(&server)
            .await;

        let embedding = embedder(&server, 2).embed("flaky").await.unwrap();
        assert_eq!(embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn embed_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exhausted"))
            .expect(3)
            .mount(&server)
            .await;

        let result = embedder(&server, 2).with_max_retries(2).embed("quota").await;
        assert!(matches!(result, Err(AppError::Provider(_))));
    }

    #[tokio::test]
    async fn embed_fails_fast_on_auth_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let result = embedder(&server, 2).embed("unauthorized").await;
        assert!(matches!(result, Err(AppError::Provider(_))));
    }

    #[tokio::test]
    async fn embed_rejects_unexpected_dimensionality() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[0.5, 0.5])))
            .mount(&server)
            .await;

        let result = embedder(&server, 4).embed("wrong dims").await;
        assert!(matches!(result, Err(AppError::Provider(_))));
    }
}
