//! # docsearch-embed
//!
//! Embedding gateway for docsearch: turns chunk texts into fixed-dimension
//! vectors through a remote OpenAI-compatible provider.
//!
//! All embedding traffic flows through an [`EmbeddingGateway`], which owns
//! batching and dimension enforcement. The gateway wraps any
//! [`Embedder`](docsearch_core::Embedder), so the provider client can be
//! swapped for a stub in tests.
//!
//! ## Failure model
//!
//! Provider failures are classified, never partially accepted:
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Connect error, timeout, 5xx | `ProviderUnavailable` (retried with backoff) |
//! | HTTP 429 | `ProviderRateLimited` (retried with backoff) |
//! | Malformed payload, wrong count or dimension | `ProviderBadResponse` |
//! | Blank input text | `EmptyText` (rejected before sending) |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docsearch_embed::{EmbeddingGateway, RemoteEmbedder};
//! use docsearch_core::ModelConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let embedder = RemoteEmbedder::new(
//!     api_key,
//!     "https://api.openai.com/v1",
//!     ModelConfig::default(),
//!     Duration::from_secs(30),
//!     3,
//! )?;
//! let gateway = EmbeddingGateway::new(Arc::new(embedder), 64);
//!
//! let vectors = gateway.embed_texts(&chunk_texts).await?;
//! let query_vector = gateway.embed_one("what is a flat index?").await?;
//! ```

pub mod gateway;
pub mod noop;
pub mod remote;

pub use gateway::EmbeddingGateway;
pub use noop::NoopEmbedder;
pub use remote::RemoteEmbedder;
