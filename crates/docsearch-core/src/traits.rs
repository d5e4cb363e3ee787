//! Core traits for docsearch components.
//!
//! This module defines the trait seams between the pipeline and its two
//! external collaborators:
//!
//! - [`Embedder`]: the remote embedding provider
//! - [`ChunkCatalog`]: the durable vector-id to chunk mapping
//!
//! Both are consumed as `Arc<dyn ...>` handles by the coordinators, so
//! implementations can be swapped without changing the rest of the system.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{CatalogError, EmbedError};
use crate::types::{ChunkRecord, VectorId};

// ============================================================================
// Embedding
// ============================================================================

/// Trait for generating embeddings through an external provider.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts.
    ///
    /// Returns exactly one vector per input, in input order, each of length
    /// [`dimension`](Embedder::dimension). Fails the whole batch on any
    /// provider error; partial results are never returned.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

// ============================================================================
// Chunk Catalog
// ============================================================================

/// Trait for the durable mapping from vector ids to their owning chunks.
#[async_trait]
pub trait ChunkCatalog: Send + Sync {
    /// Store a batch of chunk rows transactionally: all rows commit or none
    /// do. A `vector_id` already present in the catalog fails the whole
    /// batch with [`CatalogError::DuplicateVectorId`].
    async fn put_batch(&self, rows: &[ChunkRecord]) -> Result<(), CatalogError>;

    /// Look up chunks by vector id. Ids with no row are simply absent from
    /// the result, not an error.
    async fn get_by_vector_ids(
        &self,
        ids: &[VectorId],
    ) -> Result<HashMap<VectorId, ChunkRecord>, CatalogError>;

    /// All chunks of one document, ordered by `sequence_index`.
    async fn list_by_document(&self, document_id: Uuid) -> Result<Vec<ChunkRecord>, CatalogError>;

    /// The largest committed vector id, if any. Drives startup
    /// reconciliation against the index.
    async fn max_vector_id(&self) -> Result<Option<VectorId>, CatalogError>;

    /// Total number of chunk rows.
    async fn count(&self) -> Result<u64, CatalogError>;
}
