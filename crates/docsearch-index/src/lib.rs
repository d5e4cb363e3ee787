//! # docsearch-index
//!
//! Flat exact-search vector index for the docsearch pipeline.
//!
//! Two layers:
//!
//! - [`FlatIndex`]: the in-memory structure. Append-only, monotonic 0-based
//!   ids, exact Euclidean k-NN, bincode snapshot codec.
//! - [`DurableIndex`]: the shared handle coordinators use. Read/write lock
//!   for single-writer appends and concurrent searches, plus
//!   snapshot-before-acknowledge persistence to a configured path.

pub mod durable;
pub mod flat;

pub use durable::DurableIndex;
pub use flat::FlatIndex;
