//! Error types for docsearch.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for docsearch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Embedding provider call failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Vector index operation failed
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Chunk catalog operation failed
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Ingestion of one document aborted; the document text itself is
    /// untouched and the caller may retry without re-uploading
    #[error("ingestion failed for document {document_id}: {source}")]
    Ingestion {
        document_id: Uuid,
        #[source]
        source: Box<Error>,
    },

    /// Query text was empty after trimming
    #[error("query text is empty")]
    EmptyQuery,

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a component failure as an ingestion failure for one document.
    pub fn ingestion(document_id: Uuid, source: impl Into<Error>) -> Self {
        Error::Ingestion {
            document_id,
            source: Box::new(source.into()),
        }
    }
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Embedding gateway errors.
///
/// Provider failures are classified so coordinators can decide retry vs.
/// abort without parsing messages.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("embedding provider rate limited: {0}")]
    ProviderRateLimited(String),

    #[error("embedding provider returned bad response: {0}")]
    ProviderBadResponse(String),

    #[error("cannot embed empty text")]
    EmptyText,
}

impl EmbedError {
    /// True for failures that may succeed on a retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EmbedError::ProviderUnavailable(_) | EmbedError::ProviderRateLimited(_)
        )
    }
}

/// Vector index errors.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index corrupted: {0}")]
    Corrupted(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Chunk catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("duplicate vector id: {0}")]
    DuplicateVectorId(u64),

    #[error("vector id {0} exceeds the storable range")]
    VectorIdOverflow(u64),

    #[error("catalog storage error: {0}")]
    Storage(String),
}

/// Result type alias for docsearch operations.
pub type Result<T> = std::result::Result<T, Error>;
