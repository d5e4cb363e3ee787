//! Core types for docsearch.
//!
//! This module contains the shared data structures used across the pipeline:
//!
//! ## Chunks
//! - [`ChunkRecord`]: A chunk of document text tied to a vector index entry
//! - [`ChunkConfig`]: Configuration for the text splitter
//!
//! ## Embeddings
//! - [`ModelConfig`]: Embedding model identity and dimension
//!
//! ## Search
//! - [`SearchHit`]: A matching chunk with its distance to the query
//!
//! ## Ingestion
//! - [`IngestReport`]: Outcome of ingesting one document

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of a vector within the index, and the join key to the catalog.
///
/// Assigned 0-based and strictly increasing by the index; never reused once
/// a catalog row has committed against it.
pub type VectorId = u64;

// ============================================================================
// Chunks
// ============================================================================

/// A contiguous slice of a document's extracted text, the unit of embedding
/// and retrieval.
///
/// One row exists in the chunk catalog for every vector the index holds; the
/// pipeline's consistency machinery exists to keep that correspondence true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Stable catalog key
    pub chunk_id: Uuid,
    /// Position of this chunk's vector in the index
    pub vector_id: VectorId,
    /// Document the chunk was cut from
    pub document_id: Uuid,
    /// Owner, denormalized from the document for fast filtering
    pub user_id: Uuid,
    /// The chunk text
    pub content: String,
    /// 0-based order within the document
    pub sequence_index: u32,
}

/// Configuration for the text splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

// ============================================================================
// Embeddings
// ============================================================================

/// Embedding model identity.
///
/// Fixed for the lifetime of one index; vectors from different models or
/// dimensions must never share an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider-side model identifier
    pub model_name: String,
    /// Output vector length
    pub dimension: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// A search result: one chunk with its distance to the query vector.
///
/// `distance` is Euclidean, so smaller is closer; results are ordered by
/// ascending distance with ties broken by ascending `vector_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matching chunk
    pub chunk: ChunkRecord,
    /// Euclidean distance between the query and the chunk vector
    pub distance: f32,
}

// ============================================================================
// Ingestion
// ============================================================================

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Document the report is for
    pub document_id: Uuid,
    /// Number of chunks embedded and indexed
    pub chunks_indexed: usize,
}
