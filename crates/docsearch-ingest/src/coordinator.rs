//! Ingestion coordinator: the write path of the pipeline.
//!
//! One [`ingest`](IngestionCoordinator::ingest) call runs chunk → embed →
//! index append → catalog commit for a single document. The index append is
//! durable before the catalog commit, so a failure between the two leaves
//! index entries with no catalog rows. Those entries stay invisible to
//! search (the watermark only advances after the catalog commit) and are
//! truncated away before the next append.

use docsearch_chunker::split_text;
use docsearch_core::{
    CatalogWatermark, ChunkCatalog, ChunkConfig, ChunkRecord, Error, IndexError, IngestReport,
    Result,
};
use docsearch_embed::EmbeddingGateway;
use docsearch_index::DurableIndex;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Coordinates document ingestion against the shared index and catalog.
pub struct IngestionCoordinator {
    /// Embedding gateway
    gateway: Arc<EmbeddingGateway>,
    /// Durable vector index
    index: Arc<DurableIndex>,
    /// Chunk catalog
    catalog: Arc<dyn ChunkCatalog>,
    /// Catalog high-water mark, shared with search
    watermark: Arc<CatalogWatermark>,
    /// Chunking parameters
    chunking: ChunkConfig,
    /// Serializes append-and-commit across concurrent ingests
    write_lock: Mutex<()>,
}

impl IngestionCoordinator {
    /// Create a coordinator over shared pipeline components.
    ///
    /// The watermark must reflect the catalog the index was reconciled
    /// against at startup (see [`reconcile`](crate::recovery::reconcile)).
    pub fn new(
        gateway: Arc<EmbeddingGateway>,
        index: Arc<DurableIndex>,
        catalog: Arc<dyn ChunkCatalog>,
        watermark: Arc<CatalogWatermark>,
        chunking: ChunkConfig,
    ) -> Self {
        Self {
            gateway,
            index,
            catalog,
            watermark,
            chunking,
            write_lock: Mutex::new(()),
        }
    }

    /// Ingest one document's extracted text.
    ///
    /// Returns how many chunks were indexed; zero for empty text. On any
    /// failure the document ends up with no indexed chunks and no search
    /// result can ever surface a partially ingested state.
    pub async fn ingest(&self, document_id: Uuid, user_id: Uuid, text: &str) -> Result<IngestReport> {
        let chunks = split_text(text, &self.chunking)
            .map_err(|e| Error::ingestion(document_id, e))?;

        if chunks.is_empty() {
            info!("document {document_id} produced no chunks");
            return Ok(IngestReport {
                document_id,
                chunks_indexed: 0,
            });
        }

        // The expensive provider call happens outside the write lock so
        // concurrent ingests overlap on embedding.
        let vectors = self
            .gateway
            .embed_texts(&chunks)
            .await
            .map_err(|e| Error::ingestion(document_id, e))?;

        let _guard = self.write_lock.lock().await;

        self.repair_pending_tail()
            .await
            .map_err(|e| Error::ingestion(document_id, e))?;

        let before = self.index.len().await;
        let vector_ids = self
            .index
            .append(&vectors)
            .await
            .map_err(|e| Error::ingestion(document_id, e))?;
        debug!(
            "appended {} vectors for document {document_id}",
            vector_ids.len()
        );

        let rows: Vec<ChunkRecord> = vector_ids
            .iter()
            .zip(chunks.into_iter())
            .enumerate()
            .map(|(idx, (&vector_id, content))| ChunkRecord {
                chunk_id: Uuid::new_v4(),
                vector_id,
                document_id,
                user_id,
                content,
                sequence_index: idx as u32,
            })
            .collect();

        if let Err(catalog_err) = self.catalog.put_batch(&rows).await {
            // The appended tail has no catalog rows. Take it back out so
            // the snapshot on disk matches the catalog again; if even that
            // fails, the watermark keeps the tail invisible and the next
            // ingest will retry the truncation.
            warn!("catalog commit failed for document {document_id}: {catalog_err}");
            if let Err(truncate_err) = self.index.truncate(before).await {
                warn!("could not roll back index tail: {truncate_err}");
            }
            return Err(Error::ingestion(document_id, catalog_err));
        }

        if let Some(last) = rows.last() {
            self.watermark.advance_to(last.vector_id + 1);
        }

        info!("indexed document {document_id}: {} chunks", rows.len());
        Ok(IngestReport {
            document_id,
            chunks_indexed: rows.len(),
        })
    }

    /// Truncate index entries above the committed watermark.
    ///
    /// Runs under the write lock. Entries above the watermark were never
    /// acknowledged to any caller, so dropping and reassigning their ids
    /// is safe.
    async fn repair_pending_tail(&self) -> std::result::Result<(), IndexError> {
        let committed = self.watermark.committed();
        let len = self.index.len().await as u64;
        if len > committed {
            warn!(
                "truncating {} unreconciled index entries before append",
                len - committed
            );
            self.index.truncate(committed as usize).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docsearch_catalog::MemoryCatalog;
    use docsearch_core::{EmbedError, Embedder};
    use tempfile::tempdir;

    const TEST_DIM: usize = 8;

    // ==================== Mock Embedders ====================

    /// Deterministic embedder: vector depends only on text content.
    struct MockEmbedder;

    #[async_trait]
    impl Embedder for MockEmbedder {
        fn model_name(&self) -> &str {
            "mock-embedder"
        }

        fn dimension(&self) -> usize {
            TEST_DIM
        }

        async fn embed_batch(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts
                .iter()
                .map(|text| {
                    (0..TEST_DIM)
                        .map(|i| ((i + text.len()) as f32 * 0.001).sin())
                        .collect()
                })
                .collect())
        }
    }

    /// Embedder that always fails with a transient provider error.
    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing-embedder"
        }

        fn dimension(&self) -> usize {
            TEST_DIM
        }

        async fn embed_batch(&self, _texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, EmbedError> {
            Err(EmbedError::ProviderUnavailable("connection refused".into()))
        }
    }

    // ==================== Fixture ====================

    struct Fixture {
        coordinator: IngestionCoordinator,
        index: Arc<DurableIndex>,
        catalog: Arc<MemoryCatalog>,
        watermark: Arc<CatalogWatermark>,
        _dir: tempfile::TempDir,
    }

    async fn fixture_with(embedder: Arc<dyn Embedder>) -> Fixture {
        let dir = tempdir().unwrap();
        let index = Arc::new(
            DurableIndex::open(dir.path().join("index.bin"), TEST_DIM)
                .await
                .unwrap(),
        );
        let catalog = Arc::new(MemoryCatalog::new());
        let watermark = Arc::new(CatalogWatermark::new(0));
        let gateway = Arc::new(EmbeddingGateway::new(embedder, 16));

        let coordinator = IngestionCoordinator::new(
            gateway,
            Arc::clone(&index),
            catalog.clone() as Arc<dyn ChunkCatalog>,
            Arc::clone(&watermark),
            ChunkConfig {
                chunk_size: 500,
                overlap: 50,
            },
        );

        Fixture {
            coordinator,
            index,
            catalog,
            watermark,
            _dir: dir,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(Arc::new(MockEmbedder)).await
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_ingest_indexes_all_chunks() {
        let f = fixture().await;
        let document_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let text = "x".repeat(1200);

        let report = f.coordinator.ingest(document_id, user_id, &text).await.unwrap();

        // 1200 chars at size 500 / overlap 50 step in 450s: 3 chunks
        assert_eq!(report.chunks_indexed, 3);
        assert_eq!(report.document_id, document_id);
        assert_eq!(f.index.len().await, 3);
        assert_eq!(f.catalog.count().await.unwrap(), 3);
        assert_eq!(f.watermark.committed(), 3);
    }

    #[tokio::test]
    async fn test_ingest_rows_carry_order_and_ownership() {
        let f = fixture().await;
        let document_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(30);

        f.coordinator.ingest(document_id, user_id, &text).await.unwrap();

        let rows = f.catalog.list_by_document(document_id).await.unwrap();
        assert!(!rows.is_empty());
        for (idx, row) in rows.iter().enumerate() {
            assert_eq!(row.sequence_index as usize, idx);
            assert_eq!(row.vector_id, idx as u64);
            assert_eq!(row.user_id, user_id);
            assert_eq!(row.document_id, document_id);
        }

        // Chunk contents match what the chunker produces for this text.
        let expected = split_text(
            &text,
            &ChunkConfig {
                chunk_size: 500,
                overlap: 50,
            },
        )
        .unwrap();
        let contents: Vec<&str> = rows.iter().map(|r| r.content.as_str()).collect();
        let expected_refs: Vec<&str> = expected.iter().map(String::as_str).collect();
        assert_eq!(contents, expected_refs);
    }

    #[tokio::test]
    async fn test_empty_document_touches_nothing() {
        let f = fixture().await;

        let report = f
            .coordinator
            .ingest(Uuid::new_v4(), Uuid::new_v4(), "")
            .await
            .unwrap();

        assert_eq!(report.chunks_indexed, 0);
        assert_eq!(f.index.len().await, 0);
        assert_eq!(f.catalog.count().await.unwrap(), 0);
        assert_eq!(f.watermark.committed(), 0);
    }

    #[tokio::test]
    async fn test_embed_failure_aborts_without_partial_state() {
        let f = fixture_with(Arc::new(FailingEmbedder)).await;
        let document_id = Uuid::new_v4();

        let err = f
            .coordinator
            .ingest(document_id, Uuid::new_v4(), "some document text")
            .await
            .unwrap_err();

        match err {
            Error::Ingestion {
                document_id: failed, ..
            } => assert_eq!(failed, document_id),
            other => panic!("expected ingestion error, got {other}"),
        }
        assert_eq!(f.index.len().await, 0);
        assert_eq!(f.catalog.count().await.unwrap(), 0);
        assert_eq!(f.watermark.committed(), 0);
    }

    #[tokio::test]
    async fn test_catalog_failure_rolls_back_the_index() {
        let f = fixture().await;
        let document_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        // Occupy vector id 0 directly so the coordinator's batch collides.
        f.catalog
            .put_batch(&[ChunkRecord {
                chunk_id: Uuid::new_v4(),
                vector_id: 0,
                document_id: Uuid::new_v4(),
                user_id,
                content: "squatter".to_string(),
                sequence_index: 0,
            }])
            .await
            .unwrap();

        let err = f
            .coordinator
            .ingest(document_id, user_id, "short text")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Ingestion { .. }));

        // The appended tail was rolled back; nothing of the document remains.
        assert_eq!(f.index.len().await, 0);
        assert!(f
            .catalog
            .list_by_document(document_id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(f.watermark.committed(), 0);
    }

    #[tokio::test]
    async fn test_sequential_documents_get_contiguous_ids() {
        let f = fixture().await;
        let user_id = Uuid::new_v4();
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();

        let report_a = f
            .coordinator
            .ingest(doc_a, user_id, &"a".repeat(1200))
            .await
            .unwrap();
        let report_b = f
            .coordinator
            .ingest(doc_b, user_id, &"b".repeat(600))
            .await
            .unwrap();

        assert_eq!(report_a.chunks_indexed, 3);
        assert_eq!(report_b.chunks_indexed, 2);

        let rows_b = f.catalog.list_by_document(doc_b).await.unwrap();
        let ids_b: Vec<u64> = rows_b.iter().map(|r| r.vector_id).collect();
        assert_eq!(ids_b, vec![3, 4]);
        assert_eq!(f.watermark.committed(), 5);
    }

    #[tokio::test]
    async fn test_ingest_repairs_a_stale_tail_first() {
        let f = fixture().await;
        let user_id = Uuid::new_v4();

        // Simulate a crash after append but before catalog commit: the
        // index holds two vectors the catalog knows nothing about.
        f.index
            .append(&[vec![0.5; TEST_DIM], vec![0.6; TEST_DIM]])
            .await
            .unwrap();
        assert_eq!(f.index.len().await, 2);
        assert_eq!(f.watermark.committed(), 0);

        let document_id = Uuid::new_v4();
        let report = f
            .coordinator
            .ingest(document_id, user_id, "replacement document")
            .await
            .unwrap();

        // The stale tail was truncated, so the new document reuses id 0.
        assert_eq!(report.chunks_indexed, 1);
        assert_eq!(f.index.len().await, 1);
        let rows = f.catalog.list_by_document(document_id).await.unwrap();
        assert_eq!(rows[0].vector_id, 0);
        assert_eq!(f.watermark.committed(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_ingests_preserve_the_core_invariant() {
        let f = fixture().await;
        let f = Arc::new(f);
        let user_id = Uuid::new_v4();

        let mut handles = Vec::new();
        for i in 0..4 {
            let fx = Arc::clone(&f);
            handles.push(tokio::spawn(async move {
                fx.coordinator
                    .ingest(Uuid::new_v4(), user_id, &format!("document {i} ").repeat(40))
                    .await
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().unwrap().chunks_indexed;
        }

        assert_eq!(f.index.len().await, total);
        assert_eq!(f.catalog.count().await.unwrap(), total as u64);
        assert_eq!(f.watermark.committed(), total as u64);
    }
}
