//! Startup reconciliation between the vector index and the chunk catalog.
//!
//! A crash between an index append and the matching catalog commit leaves
//! the index longer than the catalog. [`reconcile`] measures that gap and
//! yields the committed watermark search must respect; [`repair`] truncates
//! the orphaned tail so the two stores agree again.

use docsearch_core::{ChunkCatalog, IndexError, Result};
use docsearch_index::DurableIndex;
use tracing::{info, warn};

/// Outcome of comparing the index against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Vectors currently in the index.
    pub index_len: u64,
    /// Watermark: ids strictly below this are backed by catalog rows.
    pub committed: u64,
    /// Index entries above the watermark (crash leftovers).
    pub orphaned: u64,
}

/// Compare the index against the catalog without modifying either.
///
/// Fails with [`IndexError::Corrupted`] if the catalog references ids the
/// index does not hold; that cannot result from any crash ordering this
/// pipeline produces and means the snapshot file was damaged or replaced.
pub async fn reconcile(
    index: &DurableIndex,
    catalog: &dyn ChunkCatalog,
) -> Result<ReconcileReport> {
    let committed = match catalog.max_vector_id().await? {
        Some(max) => max + 1,
        None => 0,
    };
    let index_len = index.len().await as u64;

    if index_len < committed {
        return Err(IndexError::Corrupted(format!(
            "catalog records {committed} vectors but the index holds {index_len}"
        ))
        .into());
    }

    let orphaned = index_len - committed;
    if orphaned > 0 {
        warn!(
            "index holds {orphaned} vectors with no catalog rows (watermark {committed}); \
             they will be excluded from search until repaired"
        );
    }

    Ok(ReconcileReport {
        index_len,
        committed,
        orphaned,
    })
}

/// Truncate orphaned index entries down to the committed watermark.
///
/// Returns how many entries were removed. Safe because orphaned ids were
/// never acknowledged to any caller.
pub async fn repair(index: &DurableIndex, catalog: &dyn ChunkCatalog) -> Result<u64> {
    let report = reconcile(index, catalog).await?;
    if report.orphaned == 0 {
        return Ok(0);
    }

    index.truncate(report.committed as usize).await?;
    info!(
        "repaired index: removed {} orphaned vectors, {} remain",
        report.orphaned, report.committed
    );
    Ok(report.orphaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsearch_catalog::MemoryCatalog;
    use docsearch_core::{ChunkRecord, Error, VectorId};
    use tempfile::tempdir;
    use uuid::Uuid;

    const TEST_DIM: usize = 4;

    fn make_row(vector_id: VectorId) -> ChunkRecord {
        ChunkRecord {
            chunk_id: Uuid::new_v4(),
            vector_id,
            document_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: format!("chunk {vector_id}"),
            sequence_index: vector_id as u32,
        }
    }

    async fn open_index(dir: &tempfile::TempDir) -> DurableIndex {
        DurableIndex::open(dir.path().join("index.bin"), TEST_DIM)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reconcile_empty_stores() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir).await;
        let catalog = MemoryCatalog::new();

        let report = reconcile(&index, &catalog).await.unwrap();
        assert_eq!(
            report,
            ReconcileReport {
                index_len: 0,
                committed: 0,
                orphaned: 0
            }
        );
    }

    #[tokio::test]
    async fn test_reconcile_in_sync() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir).await;
        let catalog = MemoryCatalog::new();

        index
            .append(&[vec![0.1; TEST_DIM], vec![0.2; TEST_DIM]])
            .await
            .unwrap();
        catalog.put_batch(&[make_row(0), make_row(1)]).await.unwrap();

        let report = reconcile(&index, &catalog).await.unwrap();
        assert_eq!(report.committed, 2);
        assert_eq!(report.orphaned, 0);
    }

    #[tokio::test]
    async fn test_reconcile_detects_orphans() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir).await;
        let catalog = MemoryCatalog::new();

        // Crash simulation: three vectors appended, one row committed.
        index
            .append(&[vec![0.1; TEST_DIM], vec![0.2; TEST_DIM], vec![0.3; TEST_DIM]])
            .await
            .unwrap();
        catalog.put_batch(&[make_row(0)]).await.unwrap();

        let report = reconcile(&index, &catalog).await.unwrap();
        assert_eq!(report.index_len, 3);
        assert_eq!(report.committed, 1);
        assert_eq!(report.orphaned, 2);
    }

    #[tokio::test]
    async fn test_reconcile_rejects_short_index() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir).await;
        let catalog = MemoryCatalog::new();

        // Catalog claims id 5 exists, but the index is empty.
        catalog.put_batch(&[make_row(5)]).await.unwrap();

        let err = reconcile(&index, &catalog).await.unwrap_err();
        assert!(matches!(err, Error::Index(IndexError::Corrupted(_))));
    }

    #[tokio::test]
    async fn test_repair_truncates_to_watermark() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir).await;
        let catalog = MemoryCatalog::new();

        index
            .append(&[vec![0.1; TEST_DIM], vec![0.2; TEST_DIM], vec![0.3; TEST_DIM]])
            .await
            .unwrap();
        catalog.put_batch(&[make_row(0)]).await.unwrap();

        let removed = repair(&index, &catalog).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(index.len().await, 1);

        let report = reconcile(&index, &catalog).await.unwrap();
        assert_eq!(report.orphaned, 0);
    }

    #[tokio::test]
    async fn test_repair_is_a_no_op_when_in_sync() {
        let dir = tempdir().unwrap();
        let index = open_index(&dir).await;
        let catalog = MemoryCatalog::new();

        index.append(&[vec![0.1; TEST_DIM]]).await.unwrap();
        catalog.put_batch(&[make_row(0)]).await.unwrap();

        let removed = repair(&index, &catalog).await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn test_repair_survives_restart() {
        let dir = tempdir().unwrap();
        let catalog = MemoryCatalog::new();

        {
            let index = open_index(&dir).await;
            index
                .append(&[vec![0.1; TEST_DIM], vec![0.2; TEST_DIM]])
                .await
                .unwrap();
            catalog.put_batch(&[make_row(0)]).await.unwrap();
            repair(&index, &catalog).await.unwrap();
        }

        // The truncation was persisted, not just in memory.
        let reopened = open_index(&dir).await;
        assert_eq!(reopened.len().await, 1);
        let report = reconcile(&reopened, &catalog).await.unwrap();
        assert_eq!(report.orphaned, 0);
    }
}
