//! Catalog high-water mark.
//!
//! The watermark is the count of vector ids known to have committed catalog
//! rows. Ingestion advances it after each catalog commit; retrieval refuses
//! to serve any vector id at or beyond it. Index entries past the watermark
//! are orphans from a partial-failure crash and stay invisible until a
//! repair pass truncates them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared high-water mark handle, cheap to clone behind an `Arc`.
#[derive(Debug)]
pub struct CatalogWatermark {
    committed: AtomicU64,
}

impl CatalogWatermark {
    /// Create a watermark at the given committed count.
    #[must_use]
    pub fn new(committed: u64) -> Self {
        Self {
            committed: AtomicU64::new(committed),
        }
    }

    /// Number of vector ids with committed catalog rows. Search may only
    /// serve ids strictly below this bound.
    #[must_use]
    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::SeqCst)
    }

    /// Raise the committed count. The watermark never moves backwards, so
    /// racing ingestions always leave the larger bound in place.
    pub fn advance_to(&self, committed: u64) {
        self.committed.fetch_max(committed, Ordering::SeqCst);
    }
}

impl Default for CatalogWatermark {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_watermark_starts_at_given_count() {
        let watermark = CatalogWatermark::new(12);
        assert_eq!(watermark.committed(), 12);
    }

    #[test]
    fn test_watermark_default_is_zero() {
        let watermark = CatalogWatermark::default();
        assert_eq!(watermark.committed(), 0);
    }

    #[test]
    fn test_watermark_advances() {
        let watermark = CatalogWatermark::new(0);
        watermark.advance_to(5);
        assert_eq!(watermark.committed(), 5);
    }

    #[test]
    fn test_watermark_never_moves_backwards() {
        let watermark = CatalogWatermark::new(10);
        watermark.advance_to(4);
        assert_eq!(watermark.committed(), 10);
    }

    #[test]
    fn test_watermark_concurrent_advances_keep_max() {
        let watermark = Arc::new(CatalogWatermark::new(0));
        let handles: Vec<_> = (1..=8u64)
            .map(|n| {
                let watermark = Arc::clone(&watermark);
                std::thread::spawn(move || watermark.advance_to(n * 10))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(watermark.committed(), 80);
    }
}
