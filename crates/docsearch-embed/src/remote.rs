//! HTTP client for OpenAI-compatible embedding endpoints.

use async_trait::async_trait;
use docsearch_core::{EmbedError, Embedder, Error, ModelConfig};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Embedder that talks to an OpenAI-compatible `/embeddings` endpoint.
///
/// The provider is untrusted: responses are re-validated against the
/// configured model dimension, and out-of-order `data` entries are sorted
/// back into request order before being returned. Transient failures
/// (connect errors, timeouts, 429, 5xx) are retried with exponential
/// backoff up to `max_retries` attempts; everything else fails the batch
/// immediately.
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: ModelConfig,
    max_retries: usize,
}

impl RemoteEmbedder {
    /// Build a client for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: ModelConfig,
        timeout: Duration,
        max_retries: usize,
    ) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Config("missing embedding API key".to_string()));
        }
        if model.dimension == 0 {
            return Err(Error::Config(
                "embedding dimension must be positive".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build embedding HTTP client: {e}")))?;
        let endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            max_retries,
        })
    }

    /// Resolved request URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call_provider(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut attempt = 0usize;
        loop {
            match self.try_once(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(err) if err.is_transient() && attempt + 1 < self.max_retries => {
                    attempt += 1;
                    let delay = retry_backoff(attempt);
                    warn!(
                        "embedding request failed ({err}), retry {attempt}/{} in {delay:?}",
                        self.max_retries - 1
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_once(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let request = EmbeddingRequest {
            model: &self.model.model_name,
            input: texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(classify_status(status, &body));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            EmbedError::ProviderBadResponse(format!("invalid embedding payload: {e}"))
        })?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(EmbedError::ProviderBadResponse(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        for vector in &vectors {
            if vector.len() != self.model.dimension {
                return Err(EmbedError::ProviderBadResponse(format!(
                    "provider returned dimension {} for model {} (expected {})",
                    vector.len(),
                    self.model.model_name,
                    self.model.dimension
                )));
            }
        }

        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn model_name(&self) -> &str {
        &self.model.model_name
    }

    fn dimension(&self) -> usize {
        self.model.dimension
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.call_provider(texts).await
    }
}

fn classify_transport(err: reqwest::Error) -> EmbedError {
    if err.is_decode() {
        EmbedError::ProviderBadResponse(err.to_string())
    } else {
        EmbedError::ProviderUnavailable(err.to_string())
    }
}

fn classify_status(status: StatusCode, body: &str) -> EmbedError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        EmbedError::ProviderRateLimited(format!("provider returned 429: {body}"))
    } else if status.is_server_error() {
        EmbedError::ProviderUnavailable(format!("provider returned {status}: {body}"))
    } else {
        EmbedError::ProviderBadResponse(format!("provider returned {status}: {body}"))
    }
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}
