//! Chunk catalog layer for docsearch, backed by SQLite.
//!
//! This crate provides the metadata side of the store, implementing the
//! [`ChunkCatalog`](docsearch_core::ChunkCatalog) trait. The vector index
//! answers "which vector ids are close"; this catalog answers "what text and
//! ownership belongs to those ids".
//!
//! # Features
//!
//! - **Transactional writes**: a batch of chunk rows commits atomically
//! - **Vector-id uniqueness**: the same index slot can never describe two chunks
//! - **Document listing**: chunks of one document in sequence order
//! - **In-memory variant**: [`MemoryCatalog`] for tests and development
//!
//! # Example
//!
//! ```rust,ignore
//! use docsearch_catalog::SqliteCatalog;
//! use docsearch_core::ChunkCatalog;
//!
//! let catalog = SqliteCatalog::open("path/to/catalog.db")?;
//! catalog.put_batch(&rows).await?;
//! let found = catalog.get_by_vector_ids(&[0, 1, 2]).await?;
//! ```

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;
