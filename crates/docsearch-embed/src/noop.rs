//! No-op embedder for testing without a provider.
//!
//! This module provides a [`NoopEmbedder`] that returns zero-vectors for all
//! embeddings. It's useful for:
//! - Testing without network access
//! - Development builds against an empty index
//! - Stubbing embeddings in unit tests

use async_trait::async_trait;
use docsearch_core::{EmbedError, Embedder};

/// No-op embedder that returns zero-vectors.
///
/// Always succeeds and never contacts anything, making it useful for
/// exercising the pipeline without an API key.
///
/// # Example
///
/// ```rust
/// use docsearch_embed::NoopEmbedder;
/// use docsearch_core::Embedder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let embedder = NoopEmbedder::new();
/// let vectors = embedder.embed_batch(&["Hello", "World"]).await?;
///
/// assert_eq!(vectors.len(), 2);
/// assert_eq!(vectors[0].len(), 1536);
/// assert!(vectors[0].iter().all(|&v| v == 0.0));
/// # Ok(())
/// # }
/// ```
pub struct NoopEmbedder {
    dimension: usize,
}

impl NoopEmbedder {
    /// Create a no-op embedder with the default dimension (1536).
    #[must_use]
    pub fn new() -> Self {
        Self { dimension: 1536 }
    }

    /// Create a no-op embedder with a custom dimension.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for NoopEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for NoopEmbedder {
    fn model_name(&self) -> &str {
        "noop"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimension]).collect())
    }
}
