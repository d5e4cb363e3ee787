//! Document chunking for docsearch.

pub mod sliding;

pub use sliding::split_text;
