//! # docsearch-ingest
//!
//! The write path of the pipeline: chunk a document, embed the chunks,
//! append the vectors to the durable index, and commit the chunk rows to
//! the catalog, as one logically atomic unit per document.
//!
//! The one invariant this crate exists to protect: a vector id is either
//! backed by a committed catalog row and visible to search, or it is above
//! the watermark and invisible. No interleaving of failures can surface a
//! vector without its chunk.
//!
//! ## Crash recovery
//!
//! The index is made durable before the catalog commits, so a crash in
//! between leaves an orphaned index tail. [`recovery::reconcile`] detects
//! the gap at startup and [`recovery::repair`] truncates it; the
//! coordinator also re-runs the truncation before every append so orphans
//! never accumulate.

pub mod coordinator;
pub mod recovery;

pub use coordinator::IngestionCoordinator;
pub use recovery::{reconcile, repair, ReconcileReport};
