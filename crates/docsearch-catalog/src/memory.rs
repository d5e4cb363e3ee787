//! In-memory catalog for testing without SQLite.
//!
//! This module provides a [`MemoryCatalog`] that keeps chunk rows in a
//! `HashMap`. It's useful for:
//! - Testing without touching the filesystem
//! - Development builds with faster compilation
//! - Unit tests in crates that depend on [`ChunkCatalog`]

use async_trait::async_trait;
use docsearch_core::{CatalogError, ChunkCatalog, ChunkRecord, VectorId};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// In-memory chunk catalog.
///
/// Enforces the same vector-id uniqueness as the SQLite catalog, but loses
/// everything on drop. Not suitable for production use.
///
/// # Example
///
/// ```rust
/// use docsearch_catalog::MemoryCatalog;
/// use docsearch_core::ChunkCatalog;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = MemoryCatalog::new();
/// assert_eq!(catalog.count().await?, 0);
/// # Ok(())
/// # }
/// ```
pub struct MemoryCatalog {
    rows: RwLock<HashMap<VectorId, ChunkRecord>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkCatalog for MemoryCatalog {
    async fn put_batch(&self, rows: &[ChunkRecord]) -> Result<(), CatalogError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut store = self.rows.write().await;

        // Validate the whole batch before inserting anything.
        let mut seen = HashSet::new();
        for row in rows {
            if store.contains_key(&row.vector_id) || !seen.insert(row.vector_id) {
                return Err(CatalogError::DuplicateVectorId(row.vector_id));
            }
        }

        for row in rows {
            store.insert(row.vector_id, row.clone());
        }

        debug!("committed {} chunk rows", rows.len());
        Ok(())
    }

    async fn get_by_vector_ids(
        &self,
        ids: &[VectorId],
    ) -> Result<HashMap<VectorId, ChunkRecord>, CatalogError> {
        let store = self.rows.read().await;
        let found = ids
            .iter()
            .filter_map(|id| store.get(id).map(|row| (*id, row.clone())))
            .collect();

        Ok(found)
    }

    async fn list_by_document(&self, document_id: Uuid) -> Result<Vec<ChunkRecord>, CatalogError> {
        let store = self.rows.read().await;
        let mut rows: Vec<ChunkRecord> = store
            .values()
            .filter(|row| row.document_id == document_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.sequence_index);

        Ok(rows)
    }

    async fn max_vector_id(&self) -> Result<Option<VectorId>, CatalogError> {
        let store = self.rows.read().await;
        Ok(store.keys().max().copied())
    }

    async fn count(&self) -> Result<u64, CatalogError> {
        let store = self.rows.read().await;
        Ok(store.len() as u64)
    }
}
