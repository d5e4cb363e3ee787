//! # docsearch-query
//!
//! The read path of the pipeline: embed a free-text query, scan the vector
//! index, join hits against the chunk catalog, and return the requesting
//! user's nearest chunks.
//!
//! Two filters run between the index and the caller:
//!
//! - the catalog watermark drops vector ids that were appended but never
//!   committed (crash leftovers), and
//! - the ownership filter drops chunks belonging to other users, with
//!   over-fetch widening so one user's results are not starved by another
//!   user's nearby vectors.

pub mod executor;

pub use executor::SearchExecutor;
