//! Query execution.
//!
//! A search embeds the query text, scans the index for nearest vectors,
//! joins the hits against the chunk catalog, and keeps only chunks owned
//! by the requesting user. Because the raw index has no per-user
//! partitioning, the executor over-fetches: it asks the index for
//! `k * fan_out` candidates and doubles that window until either `k` owned
//! hits are found or the whole index has been fetched.

use docsearch_core::{
    CatalogWatermark, ChunkCatalog, Error, Result, SearchHit, VectorId,
};
use docsearch_embed::EmbeddingGateway;
use docsearch_index::DurableIndex;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Search executor over the shared index and catalog.
pub struct SearchExecutor {
    /// Embedding gateway
    gateway: Arc<EmbeddingGateway>,
    /// Durable vector index
    index: Arc<DurableIndex>,
    /// Chunk catalog
    catalog: Arc<dyn ChunkCatalog>,
    /// Catalog high-water mark, shared with ingestion
    watermark: Arc<CatalogWatermark>,
    /// Over-fetch multiplier compensating for ownership filtering
    fan_out: usize,
}

impl SearchExecutor {
    /// Create an executor over shared pipeline components.
    pub fn new(
        gateway: Arc<EmbeddingGateway>,
        index: Arc<DurableIndex>,
        catalog: Arc<dyn ChunkCatalog>,
        watermark: Arc<CatalogWatermark>,
        fan_out: usize,
    ) -> Self {
        Self {
            gateway,
            index,
            catalog,
            watermark,
            fan_out: fan_out.max(1),
        }
    }

    /// Return up to `k` of the caller's chunks nearest to `query_text`,
    /// ordered by ascending distance (ties by ascending vector id).
    ///
    /// Only chunks owned by `user_id` are ever returned. An empty index
    /// yields an empty result; blank query text is an error.
    pub async fn search(&self, query_text: &str, user_id: Uuid, k: usize) -> Result<Vec<SearchHit>> {
        let trimmed = query_text.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyQuery);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embed_query(trimmed).await?;

        // Ids at or above the watermark have no committed catalog rows yet
        // and must not surface. Both bounds are snapshotted once so one
        // query sees one consistent view.
        let committed = self.watermark.committed();
        let index_len = self.index.len().await;
        if committed == 0 {
            debug!("no committed vectors, returning empty result");
            return Ok(Vec::new());
        }

        let mut k_fetch = k.saturating_mul(self.fan_out);
        loop {
            let raw_hits = self.index.search(&query_vector, k_fetch).await?;
            let exhausted = k_fetch >= index_len;

            let visible: Vec<(VectorId, f32)> = raw_hits
                .into_iter()
                .filter(|(id, _)| *id < committed)
                .collect();
            let ids: Vec<VectorId> = visible.iter().map(|(id, _)| *id).collect();
            let rows = self.catalog.get_by_vector_ids(&ids).await?;

            // Hits arrive from the index ordered by (distance, vector id)
            // and filtering preserves that order.
            let mut hits: Vec<SearchHit> = visible
                .iter()
                .filter_map(|(id, distance)| {
                    rows.get(id)
                        .filter(|row| row.user_id == user_id)
                        .map(|row| SearchHit {
                            chunk: row.clone(),
                            distance: *distance,
                        })
                })
                .collect();

            if hits.len() >= k || exhausted {
                hits.truncate(k);
                debug!(
                    "query returned {} of {k} requested hits (fetched {k_fetch})",
                    hits.len()
                );
                return Ok(hits);
            }

            k_fetch = k_fetch.saturating_mul(2);
            debug!("only {} owned hits so far, widening fetch to {k_fetch}", hits.len());
        }
    }

    /// Embed the query, retrying once on a transient provider failure.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        match self.gateway.embed_one(text).await {
            Ok(vector) => Ok(vector),
            Err(err) if err.is_transient() => {
                warn!("query embedding failed ({err}), retrying once");
                Ok(self.gateway.embed_one(text).await?)
            }
            Err(err) => Err(err.into()),
        }
    }
}
