//! # docsearch-core
//!
//! Core types and traits for the docsearch ingestion-and-retrieval pipeline.
//!
//! This crate provides the foundational abstractions shared by the rest of
//! the workspace:
//!
//! - **Embedding Generation**: [`Embedder`] trait for the external provider
//! - **Chunk Catalog**: [`ChunkCatalog`] trait for the durable vector-id to
//!   chunk mapping
//! - **Typed Records**: [`ChunkRecord`], [`SearchHit`], [`IngestReport`]
//! - **Consistency**: [`CatalogWatermark`], the high-water mark that bounds
//!   what search may serve after a partial-failure crash
//!
//! ## Architecture
//!
//! The workspace is organized around a pipeline:
//!
//! ```text
//! Document text → Chunker → Embedder → Vector Index
//!                                          ↓
//!                                    Chunk Catalog → SearchHit
//! ```
//!
//! Ingestion appends vectors to the index and commits matching catalog rows
//! as one logical unit per document; retrieval embeds the query, searches
//! the index, joins catalog rows and filters by the requesting user.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChunkRecord`] | A chunk of document text tied to a vector index entry |
//! | [`ChunkConfig`] | Text splitter window size and overlap |
//! | [`ModelConfig`] | Embedding model identity and dimension |
//! | [`SearchHit`] | A matching chunk with its distance to the query |
//! | [`IngestReport`] | Outcome of ingesting one document |
//!
//! ## Related Crates
//!
//! - `docsearch-chunker`: sliding-window text splitting
//! - `docsearch-embed`: embedding provider client and gateway
//! - `docsearch-index`: flat exact-search vector index with snapshots
//! - `docsearch-catalog`: catalog implementations (sqlite, memory)
//! - `docsearch-ingest`: ingestion coordination and crash recovery
//! - `docsearch-query`: retrieval coordination

pub mod error;
pub mod traits;
pub mod types;
pub mod watermark;

pub use error::{CatalogError, ChunkError, EmbedError, Error, IndexError, Result};
pub use traits::*;
pub use types::*;
pub use watermark::CatalogWatermark;
