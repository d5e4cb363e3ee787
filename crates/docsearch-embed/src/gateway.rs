//! Batching and validation front for any [`Embedder`].

use docsearch_core::{EmbedError, Embedder};
use std::sync::Arc;
use tracing::debug;

/// Gateway that all embedding traffic flows through.
///
/// Splits large inputs into provider-sized batches and re-checks every
/// response against the embedder's declared dimension, so downstream code
/// can assume well-formed vectors. A failure in any sub-batch fails the
/// whole call; partial results are never returned.
pub struct EmbeddingGateway {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl EmbeddingGateway {
    /// Wrap `embedder`, sending at most `batch_size` texts per provider call.
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Embedding dimension of the underlying model.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Model name of the underlying embedder.
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Maximum texts sent per provider call.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed a list of texts, preserving order.
    ///
    /// An empty input returns an empty list without contacting the provider.
    /// Any text that is blank after trimming fails the whole call with
    /// [`EmbedError::EmptyText`] before anything is sent.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|text| text.trim().is_empty()) {
            return Err(EmbedError::EmptyText);
        }

        let expected = self.embedder.dimension();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            let embedded = self.embedder.embed_batch(&refs).await?;
            validate_batch(&embedded, batch.len(), expected)?;
            debug!("embedded batch of {}", embedded.len());
            vectors.extend(embedded);
        }

        Ok(vectors)
    }

    /// Embed a single query text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::EmptyText);
        }

        let embedded = self.embedder.embed_batch(&[text]).await?;
        validate_batch(&embedded, 1, self.embedder.dimension())?;
        embedded.into_iter().next().ok_or_else(|| {
            EmbedError::ProviderBadResponse("provider returned no embedding".to_string())
        })
    }
}

fn validate_batch(
    vectors: &[Vec<f32>],
    expected_count: usize,
    expected_dimension: usize,
) -> Result<(), EmbedError> {
    if vectors.len() != expected_count {
        return Err(EmbedError::ProviderBadResponse(format!(
            "expected {} embeddings, got {}",
            expected_count,
            vectors.len()
        )));
    }
    for vector in vectors {
        if vector.len() != expected_dimension {
            return Err(EmbedError::ProviderBadResponse(format!(
                "expected dimension {}, got {}",
                expected_dimension,
                vector.len()
            )));
        }
    }
    Ok(())
}
